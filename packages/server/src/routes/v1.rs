use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/categories", category_routes())
        .nest("/projects", project_routes())
        .nest("/sprints", sprint_routes())
        .nest("/non-conformities", non_conformity_routes())
        .nest("/media", media_routes(config))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/me", get(handlers::auth::me))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::user::list_users).post(handlers::user::create_user),
        )
        .route(
            "/{id}",
            patch(handlers::user::update_user).delete(handlers::user::delete_user),
        )
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::category::list_categories).post(handlers::category::create_category),
        )
        .route(
            "/{id}",
            patch(handlers::category::update_category)
                .delete(handlers::category::delete_category),
        )
}

fn project_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::project::list_projects).post(handlers::project::create_project),
        )
        .route(
            "/{id}",
            get(handlers::project::get_project)
                .patch(handlers::project::update_project)
                .delete(handlers::project::delete_project),
        )
        .route("/{id}/sprints", post(handlers::sprint::create_sprint))
}

fn sprint_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            patch(handlers::sprint::update_sprint).delete(handlers::sprint::delete_sprint),
        )
        .route(
            "/{id}/non-conformities",
            post(handlers::non_conformity::create_non_conformity),
        )
}

fn non_conformity_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(handlers::non_conformity::get_non_conformity)
                .patch(handlers::non_conformity::update_non_conformity)
                .delete(handlers::non_conformity::delete_non_conformity),
        )
        .route(
            "/{id}/media/{media_id}",
            put(handlers::non_conformity::attach_media)
                .delete(handlers::non_conformity::detach_media),
        )
}

fn media_routes(config: &AppConfig) -> Router<AppState> {
    let upload = Router::new()
        .route("/", post(handlers::media::upload_media))
        .layer(handlers::media::media_upload_body_limit(
            config.storage.max_upload_size,
        ));

    let access = Router::new().route(
        "/{id}",
        get(handlers::media::get_media).delete(handlers::media::delete_media),
    );

    upload.merge(access)
}
