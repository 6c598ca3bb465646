use serde_json::json;

use crate::common::{TestApp, routes};

/// A project with one member developer, a sprint and a category.
struct Fixture {
    admin: String,
    dev_id: String,
    dev_token: String,
    sprint: String,
    category: String,
}

impl Fixture {
    async fn new(app: &TestApp) -> Self {
        let admin = app.admin_token().await;
        let (dev_id, dev_token) = app.create_user(&admin, "Zoe Dev", "DEVELOPER").await;
        let category = app.create_category(&admin, "UI").await;
        let project = app.create_project(&admin, "Checkout", &[&dev_id]).await;
        let sprint = app
            .create_sprint(&admin, &project, "Sprint 1", "2026-01-05T00:00:00Z")
            .await;
        Self {
            admin,
            dev_id,
            dev_token,
            sprint,
            category,
        }
    }

    async fn non_conformity(&self, app: &TestApp, title: &str) -> String {
        app.create_non_conformity(&self.dev_token, &self.sprint, &self.category, &self.dev_id, title)
            .await
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn create_starts_as_new_with_caller_as_creator() {
        let app = TestApp::spawn().await;
        let fx = Fixture::new(&app).await;

        let res = app
            .post_with_token(
                &routes::sprint_non_conformities(&fx.sprint),
                &json!({
                    "title": "Save button does nothing",
                    "description": "Clicking Save has no effect",
                    "expected": "The form is saved",
                    "category_id": fx.category,
                    "assigned_to_id": fx.dev_id,
                }),
                &fx.dev_token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["status"], "NEW");
        assert_eq!(res.body["priority"], "MEDIUM");
        assert_eq!(res.body["created_by"]["id"], fx.dev_id.as_str());
        assert_eq!(res.body["assigned_to"]["name"], "Zoe Dev");
        assert_eq!(res.body["category"]["name"], "UI");
        assert_eq!(res.body["media_ids"], json!([]));
    }

    #[tokio::test]
    async fn unknown_category_or_assignee_is_rejected() {
        let app = TestApp::spawn().await;
        let fx = Fixture::new(&app).await;
        let ghost = "00000000-0000-4000-8000-000000000000";

        for (category, assignee) in [(ghost, fx.dev_id.as_str()), (fx.category.as_str(), ghost)] {
            let res = app
                .post_with_token(
                    &routes::sprint_non_conformities(&fx.sprint),
                    &json!({
                        "title": "Broken",
                        "description": "d",
                        "expected": "e",
                        "category_id": category,
                        "assigned_to_id": assignee,
                    }),
                    &fx.admin,
                )
                .await;
            assert_eq!(res.status, 400, "{}", res.text);
        }
    }

    #[tokio::test]
    async fn update_changes_status_and_priority() {
        let app = TestApp::spawn().await;
        let fx = Fixture::new(&app).await;
        let nc = fx.non_conformity(&app, "Broken").await;

        let res = app
            .patch_with_token(
                &routes::non_conformity(&nc),
                &json!({ "status": "IN_PROGRESS", "priority": "LOW" }),
                &fx.dev_token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "IN_PROGRESS");
        assert_eq!(res.body["priority"], "LOW");
        assert_eq!(res.body["title"], "Broken");
    }

    #[tokio::test]
    async fn non_members_get_not_found() {
        let app = TestApp::spawn().await;
        let fx = Fixture::new(&app).await;
        let (_, outsider) = app.create_user(&fx.admin, "Bob Outsider", "TESTER").await;
        let nc = fx.non_conformity(&app, "Broken").await;

        let res = app.get_with_token(&routes::non_conformity(&nc), &outsider).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "Non-conformity not found");

        let res = app
            .post_with_token(
                &routes::sprint_non_conformities(&fx.sprint),
                &json!({
                    "title": "Sneaky",
                    "description": "d",
                    "expected": "e",
                    "category_id": fx.category,
                    "assigned_to_id": fx.dev_id,
                }),
                &outsider,
            )
            .await;
        assert_eq!(res.status, 404);
    }
}

mod media_links {
    use super::*;

    #[tokio::test]
    async fn attach_is_idempotent_and_listed() {
        let app = TestApp::spawn().await;
        let fx = Fixture::new(&app).await;
        let nc = fx.non_conformity(&app, "Broken").await;
        let first = app.upload_media("a.png", b"a".to_vec(), &fx.dev_token).await.id();
        let second = app.upload_media("b.png", b"b".to_vec(), &fx.dev_token).await.id();

        for media in [&first, &second, &first] {
            let res = app
                .put_with_token(&routes::non_conformity_media(&nc, media), &fx.dev_token)
                .await;
            assert_eq!(res.status, 204, "{}", res.text);
        }

        let res = app.get_with_token(&routes::non_conformity(&nc), &fx.dev_token).await;
        assert_eq!(res.body["media_ids"], json!([first, second]));
    }

    #[tokio::test]
    async fn concurrent_attaches_to_the_same_owner_all_succeed() {
        let app = TestApp::spawn().await;
        let fx = Fixture::new(&app).await;
        let nc = fx.non_conformity(&app, "Broken").await;
        let media = app.upload_media("a.png", b"a".to_vec(), &fx.dev_token).await.id();
        let path = routes::non_conformity_media(&nc, &media);

        let (a, b, c, d) = tokio::join!(
            app.put_with_token(&path, &fx.dev_token),
            app.put_with_token(&path, &fx.dev_token),
            app.put_with_token(&path, &fx.admin),
            app.put_with_token(&path, &fx.admin),
        );
        for res in [a, b, c, d] {
            assert_eq!(res.status, 204, "{}", res.text);
        }

        let res = app.get_with_token(&routes::non_conformity(&nc), &fx.dev_token).await;
        assert_eq!(res.body["media_ids"], json!([media]));
    }

    #[tokio::test]
    async fn media_has_a_single_owner() {
        let app = TestApp::spawn().await;
        let fx = Fixture::new(&app).await;
        let one = fx.non_conformity(&app, "One").await;
        let two = fx.non_conformity(&app, "Two").await;
        let media = app.upload_media("a.png", b"a".to_vec(), &fx.dev_token).await.id();

        let res = app
            .put_with_token(&routes::non_conformity_media(&one, &media), &fx.dev_token)
            .await;
        assert_eq!(res.status, 204);

        let res = app
            .put_with_token(&routes::non_conformity_media(&two, &media), &fx.dev_token)
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn attach_unknown_media_is_not_found() {
        let app = TestApp::spawn().await;
        let fx = Fixture::new(&app).await;
        let nc = fx.non_conformity(&app, "Broken").await;

        let res = app
            .put_with_token(
                &routes::non_conformity_media(&nc, "00000000-0000-4000-8000-000000000000"),
                &fx.dev_token,
            )
            .await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "Media not found");
    }

    #[tokio::test]
    async fn detach_keeps_media_and_reports_missing_links() {
        let app = TestApp::spawn().await;
        let fx = Fixture::new(&app).await;
        let nc = fx.non_conformity(&app, "Broken").await;
        let media = app.upload_media("a.png", b"a".to_vec(), &fx.dev_token).await.id();
        app.put_with_token(&routes::non_conformity_media(&nc, &media), &fx.dev_token)
            .await;

        let res = app
            .delete_with_token(&routes::non_conformity_media(&nc, &media), &fx.dev_token)
            .await;
        assert_eq!(res.status, 204);

        let again = app
            .delete_with_token(&routes::non_conformity_media(&nc, &media), &fx.dev_token)
            .await;
        assert_eq!(again.status, 404);

        let body = app.get_bytes_with_token(&routes::media(&media), &fx.dev_token).await;
        assert_eq!(body.status, 200);
        assert_eq!(body.bytes, b"a");
    }

    #[tokio::test]
    async fn deleting_the_non_conformity_keeps_its_media() {
        let app = TestApp::spawn().await;
        let fx = Fixture::new(&app).await;
        let nc = fx.non_conformity(&app, "Broken").await;
        let media = app.upload_media("a.png", b"a".to_vec(), &fx.dev_token).await.id();
        app.put_with_token(&routes::non_conformity_media(&nc, &media), &fx.dev_token)
            .await;

        let res = app.delete_with_token(&routes::non_conformity(&nc), &fx.dev_token).await;
        assert_eq!(res.status, 204);
        assert_eq!(app.media_count().await, 1);

        let other = fx.non_conformity(&app, "Other").await;
        let res = app
            .put_with_token(&routes::non_conformity_media(&other, &media), &fx.dev_token)
            .await;
        assert_eq!(res.status, 204);
    }

    #[tokio::test]
    async fn deleting_media_removes_the_link() {
        let app = TestApp::spawn().await;
        let fx = Fixture::new(&app).await;
        let nc = fx.non_conformity(&app, "Broken").await;
        let media = app.upload_media("a.png", b"a".to_vec(), &fx.dev_token).await.id();
        app.put_with_token(&routes::non_conformity_media(&nc, &media), &fx.dev_token)
            .await;

        let res = app.delete_with_token(&routes::media(&media), &fx.dev_token).await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(&routes::non_conformity(&nc), &fx.dev_token).await;
        assert_eq!(res.body["media_ids"], json!([]));
        assert_eq!(app.blobs().len(), 0);
    }

    #[tokio::test]
    async fn attached_media_is_hidden_from_non_members() {
        let app = TestApp::spawn().await;
        let fx = Fixture::new(&app).await;
        let (_, outsider) = app.create_user(&fx.admin, "Bob Outsider", "TESTER").await;
        let nc = fx.non_conformity(&app, "Broken").await;
        let media = app.upload_media("a.png", b"a".to_vec(), &fx.dev_token).await.id();

        let before = app.get_bytes_with_token(&routes::media(&media), &outsider).await;
        assert_eq!(before.status, 200);

        app.put_with_token(&routes::non_conformity_media(&nc, &media), &fx.dev_token)
            .await;

        let after = app.get_bytes_with_token(&routes::media(&media), &outsider).await;
        assert_eq!(after.status, 404);
        let delete = app.delete_with_token(&routes::media(&media), &outsider).await;
        assert_eq!(delete.status, 404);
        assert_eq!(app.media_count().await, 1);
    }
}
