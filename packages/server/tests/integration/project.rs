use serde_json::json;

use crate::common::{TestApp, routes};

mod projects {
    use super::*;

    #[tokio::test]
    async fn create_with_members() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let (dev, _) = app.create_user(&admin, "Zoe Dev", "DEVELOPER").await;
        let (tester, _) = app.create_user(&admin, "Ana Tester", "TESTER").await;

        let res = app
            .post_with_token(
                routes::PROJECTS,
                &json!({
                    "name": "  Checkout  ",
                    "description": "   ",
                    "member_ids": [dev, tester, dev],
                }),
                &admin,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["name"], "Checkout");
        assert!(res.body["description"].is_null());
        let members: Vec<&str> = res.body["members"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["name"].as_str().unwrap())
            .collect();
        assert_eq!(members, vec!["Ana Tester", "Zoe Dev"]);
    }

    #[tokio::test]
    async fn unknown_member_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::PROJECTS,
                &json!({
                    "name": "Checkout",
                    "member_ids": ["00000000-0000-4000-8000-000000000000"],
                }),
                &admin,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let list = app.get_with_token(routes::PROJECTS, &admin).await;
        assert_eq!(list.body.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn only_admins_create_projects() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let (_, tester) = app.create_user(&admin, "Ana Tester", "TESTER").await;

        let res = app
            .post_with_token(routes::PROJECTS, &json!({ "name": "Mine" }), &tester)
            .await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn members_only_see_their_projects() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let (ana, ana_token) = app.create_user(&admin, "Ana Tester", "TESTER").await;
        let mine = app.create_project(&admin, "Mine", &[&ana]).await;
        let other = app.create_project(&admin, "Other", &[]).await;

        let list = app.get_with_token(routes::PROJECTS, &ana_token).await;
        assert_eq!(list.status, 200);
        let ids: Vec<&str> = list
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec![mine.as_str()]);

        let hidden = app.get_with_token(&routes::project(&other), &ana_token).await;
        assert_eq!(hidden.status, 404);
        assert_eq!(hidden.body["message"], "Project not found");

        let all = app.get_with_token(routes::PROJECTS, &admin).await;
        assert_eq!(all.body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn malformed_id_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app.get_with_token(&routes::project("not-a-uuid"), &admin).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn detail_orders_sprints_and_non_conformities_newest_first() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let (dev, _) = app.create_user(&admin, "Zoe Dev", "DEVELOPER").await;
        let category = app.create_category(&admin, "UI").await;
        let project = app.create_project(&admin, "Checkout", &[&dev]).await;
        let first = app
            .create_sprint(&admin, &project, "Sprint 1", "2026-01-05T00:00:00Z")
            .await;
        let second = app
            .create_sprint(&admin, &project, "Sprint 2", "2026-01-19T00:00:00Z")
            .await;
        let older = app
            .create_non_conformity(&admin, &first, &category, &dev, "Older")
            .await;
        let newer = app
            .create_non_conformity(&admin, &first, &category, &dev, "Newer")
            .await;

        let res = app.get_with_token(&routes::project(&project), &admin).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let sprints = res.body["sprints"].as_array().unwrap();
        assert_eq!(sprints[0]["id"], second.as_str());
        assert_eq!(sprints[1]["id"], first.as_str());
        assert_eq!(sprints[0]["non_conformities"].as_array().unwrap().len(), 0);

        let ncs = sprints[1]["non_conformities"].as_array().unwrap();
        assert_eq!(ncs[0]["id"], newer.as_str());
        assert_eq!(ncs[1]["id"], older.as_str());
        assert_eq!(res.body["members"][0]["name"], "Zoe Dev");
    }

    #[tokio::test]
    async fn update_replaces_membership() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let (ana, ana_token) = app.create_user(&admin, "Ana Tester", "TESTER").await;
        let (zoe, _) = app.create_user(&admin, "Zoe Dev", "DEVELOPER").await;
        let project = app.create_project(&admin, "Checkout", &[&ana]).await;

        let res = app
            .patch_with_token(
                &routes::project(&project),
                &json!({ "member_ids": [zoe], "description": null }),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["members"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["members"][0]["id"], zoe.as_str());
        assert!(res.body["description"].is_null());

        let hidden = app.get_with_token(&routes::project(&project), &ana_token).await;
        assert_eq!(hidden.status, 404);
    }

    #[tokio::test]
    async fn delete_project_with_sprints_is_conflict() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let project = app.create_project(&admin, "Checkout", &[]).await;
        app.create_sprint(&admin, &project, "Sprint 1", "2026-01-05T00:00:00Z")
            .await;

        let res = app.delete_with_token(&routes::project(&project), &admin).await;
        assert_eq!(res.status, 409);

        let empty = app.create_project(&admin, "Empty", &[]).await;
        let res = app.delete_with_token(&routes::project(&empty), &admin).await;
        assert_eq!(res.status, 204);
    }
}

mod sprints {
    use super::*;

    #[tokio::test]
    async fn end_before_start_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let project = app.create_project(&admin, "Checkout", &[]).await;

        let res = app
            .post_with_token(
                &routes::project_sprints(&project),
                &json!({
                    "name": "Backwards",
                    "start_at": "2026-02-01T00:00:00Z",
                    "end_at": "2026-01-01T00:00:00Z",
                }),
                &admin,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn update_checks_the_merged_window() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let project = app.create_project(&admin, "Checkout", &[]).await;
        let sprint = app
            .create_sprint(&admin, &project, "Sprint 1", "2026-01-05T00:00:00Z")
            .await;

        let bad = app
            .patch_with_token(
                &routes::sprint(&sprint),
                &json!({ "end_at": "2026-01-01T00:00:00Z" }),
                &admin,
            )
            .await;
        assert_eq!(bad.status, 400);

        let ok = app
            .patch_with_token(
                &routes::sprint(&sprint),
                &json!({ "name": "Sprint 1b", "end_at": "2026-01-19T00:00:00Z" }),
                &admin,
            )
            .await;
        assert_eq!(ok.status, 200, "{}", ok.text);
        assert_eq!(ok.body["name"], "Sprint 1b");
    }

    #[tokio::test]
    async fn members_manage_sprints_non_members_do_not_see_them() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let (ana, ana_token) = app.create_user(&admin, "Ana Tester", "TESTER").await;
        let (_, bob_token) = app.create_user(&admin, "Bob Outsider", "TESTER").await;
        let project = app.create_project(&admin, "Checkout", &[&ana]).await;

        let sprint = app
            .create_sprint(&ana_token, &project, "Sprint 1", "2026-01-05T00:00:00Z")
            .await;

        let res = app
            .patch_with_token(&routes::sprint(&sprint), &json!({ "name": "x" }), &bob_token)
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "Sprint not found");
    }

    #[tokio::test]
    async fn delete_with_non_conformities_is_conflict() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let (dev, _) = app.create_user(&admin, "Zoe Dev", "DEVELOPER").await;
        let category = app.create_category(&admin, "UI").await;
        let project = app.create_project(&admin, "Checkout", &[]).await;
        let sprint = app
            .create_sprint(&admin, &project, "Sprint 1", "2026-01-05T00:00:00Z")
            .await;
        let nc = app
            .create_non_conformity(&admin, &sprint, &category, &dev, "Broken")
            .await;

        let res = app.delete_with_token(&routes::sprint(&sprint), &admin).await;
        assert_eq!(res.status, 409);

        app.delete_with_token(&routes::non_conformity(&nc), &admin)
            .await;
        let res = app.delete_with_token(&routes::sprint(&sprint), &admin).await;
        assert_eq!(res.status, 204);
    }
}

mod categories {
    use super::*;

    #[tokio::test]
    async fn list_includes_usage_counts() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let (dev, dev_token) = app.create_user(&admin, "Zoe Dev", "DEVELOPER").await;
        let ui = app.create_category(&admin, "UI").await;
        app.create_category(&admin, "Backend").await;
        let project = app.create_project(&admin, "Checkout", &[]).await;
        let sprint = app
            .create_sprint(&admin, &project, "Sprint 1", "2026-01-05T00:00:00Z")
            .await;
        app.create_non_conformity(&admin, &sprint, &ui, &dev, "One").await;
        app.create_non_conformity(&admin, &sprint, &ui, &dev, "Two").await;

        let res = app.get_with_token(routes::CATEGORIES, &dev_token).await;
        assert_eq!(res.status, 200);
        let list = res.body.as_array().unwrap();
        assert_eq!(list[0]["name"], "Backend");
        assert_eq!(list[0]["non_conformity_count"], 0);
        assert_eq!(list[1]["name"], "UI");
        assert_eq!(list[1]["non_conformity_count"], 2);
    }

    #[tokio::test]
    async fn duplicate_name_is_conflict() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        app.create_category(&admin, "UI").await;

        let res = app
            .post_with_token(routes::CATEGORIES, &json!({ "name": "UI" }), &admin)
            .await;
        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn rename_and_delete() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let id = app.create_category(&admin, "UI").await;

        let res = app
            .patch_with_token(&routes::category(&id), &json!({ "name": "Interface" }), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "Interface");

        let res = app.delete_with_token(&routes::category(&id), &admin).await;
        assert_eq!(res.status, 204);
    }

    #[tokio::test]
    async fn category_in_use_cannot_be_deleted() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let (dev, _) = app.create_user(&admin, "Zoe Dev", "DEVELOPER").await;
        let ui = app.create_category(&admin, "UI").await;
        let project = app.create_project(&admin, "Checkout", &[]).await;
        let sprint = app
            .create_sprint(&admin, &project, "Sprint 1", "2026-01-05T00:00:00Z")
            .await;
        app.create_non_conformity(&admin, &sprint, &ui, &dev, "One").await;

        let res = app.delete_with_token(&routes::category(&ui), &admin).await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }
}
