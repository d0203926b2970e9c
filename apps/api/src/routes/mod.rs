pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::admin::{auth, handlers as admin, logos};
use crate::browse::handlers as browse;
use crate::state::AppState;
use crate::submissions::handlers as submissions;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Browse API
        .route("/api/v1/titles", get(browse::handle_list_titles))
        .route("/api/v1/titles/:slug", get(browse::handle_get_title))
        .route("/api/v1/companies", get(browse::handle_list_companies))
        .route("/api/v1/companies/:slug", get(browse::handle_get_company))
        .route("/api/v1/locations/:slug", get(browse::handle_get_location))
        .route("/api/v1/industries", get(browse::handle_list_industries))
        .route("/api/v1/search", get(browse::handle_search))
        // Submission wizard
        .route(
            "/api/v1/submissions/steps/:step/validate",
            post(submissions::handle_validate_step),
        )
        .route(
            "/api/v1/submissions/preview",
            post(submissions::handle_preview),
        )
        .route("/api/v1/submissions", post(submissions::handle_submit))
        .route("/api/v1/submissions/mine", get(submissions::handle_list_mine))
        // Identity & access
        .route("/api/v1/users", post(submissions::handle_sync_user))
        .route("/api/v1/access/claim", post(submissions::handle_claim))
        .route(
            "/api/v1/access/status",
            get(submissions::handle_access_status),
        )
        // Admin
        .route("/api/v1/admin/login", post(auth::handle_login))
        .route("/api/v1/admin/logout", post(auth::handle_logout))
        .route("/api/v1/admin/companies", post(admin::handle_create_company))
        .route(
            "/api/v1/admin/companies/:id",
            patch(admin::handle_update_company).delete(admin::handle_delete_company),
        )
        .route(
            "/api/v1/admin/companies/:id/logo",
            post(logos::handle_upload_logo),
        )
        .route(
            "/api/v1/admin/companies/:id/logo/from-url",
            post(logos::handle_logo_from_url),
        )
        .route("/api/v1/admin/job-titles", post(admin::handle_create_title))
        .route(
            "/api/v1/admin/job-titles/:id",
            patch(admin::handle_update_title).delete(admin::handle_delete_title),
        )
        .route(
            "/api/v1/admin/locations",
            post(admin::handle_create_location),
        )
        .route(
            "/api/v1/admin/locations/:id",
            patch(admin::handle_update_location).delete(admin::handle_delete_location),
        )
        .route(
            "/api/v1/admin/industries",
            post(admin::handle_create_industry),
        )
        .route(
            "/api/v1/admin/industries/:id",
            patch(admin::handle_update_industry).delete(admin::handle_delete_industry),
        )
        .route("/api/v1/admin/levels", post(admin::handle_create_level))
        .route(
            "/api/v1/admin/levels/:id",
            patch(admin::handle_update_level).delete(admin::handle_delete_level),
        )
        .route(
            "/api/v1/admin/submissions",
            get(admin::handle_list_submissions),
        )
        .route(
            "/api/v1/admin/submissions/:id",
            patch(admin::handle_update_submission).delete(admin::handle_delete_submission),
        )
        .with_state(state)
}
