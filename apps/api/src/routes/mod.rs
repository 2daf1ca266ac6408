pub mod health;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::editor::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Live document
        .route(
            "/api/v1/resume",
            get(handlers::handle_get_resume).delete(handlers::handle_clear_resume),
        )
        .route("/api/v1/resume/import", post(handlers::handle_import))
        .route("/api/v1/resume/export", get(handlers::handle_export))
        .route("/api/v1/resume/report", get(handlers::handle_report))
        .route(
            "/api/v1/resume/personal-info",
            patch(handlers::handle_update_personal_info),
        )
        .route("/api/v1/resume/template", put(handlers::handle_set_template))
        .route("/api/v1/resume/skills", post(handlers::handle_add_skill))
        .route(
            "/api/v1/resume/skills/:index",
            delete(handlers::handle_remove_skill),
        )
        .route(
            "/api/v1/resume/sections/:section",
            post(handlers::handle_add_item),
        )
        .route(
            "/api/v1/resume/sections/:section/:index",
            patch(handlers::handle_update_item)
                .delete(handlers::handle_remove_item),
        )
        // Undo / redo
        .route("/api/v1/history", get(handlers::handle_get_history))
        .route("/api/v1/history/undo", post(handlers::handle_undo))
        .route("/api/v1/history/redo", post(handlers::handle_redo))
        .route(
            "/api/v1/history/restore/:index",
            post(handlers::handle_restore),
        )
        .route("/api/v1/history/clear", post(handlers::handle_clear_history))
        .route("/api/v1/history/shortcut", post(handlers::handle_shortcut))
        // Saved versions
        .route(
            "/api/v1/versions",
            get(handlers::handle_list_versions).post(handlers::handle_save_version),
        )
        .route(
            "/api/v1/versions/compare",
            get(handlers::handle_compare_versions),
        )
        .route(
            "/api/v1/versions/:id",
            patch(handlers::handle_rename_version)
                .delete(handlers::handle_delete_version),
        )
        .route(
            "/api/v1/versions/:id/load",
            post(handlers::handle_load_version),
        )
        .route(
            "/api/v1/versions/:id/export",
            get(handlers::handle_export_version),
        )
        .route(
            "/api/v1/versions/:id/publish",
            post(handlers::handle_publish_version),
        )
        .with_state(state)
}
