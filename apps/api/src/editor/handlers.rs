use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::editor::completeness::{compute_completeness_report, CompletenessReport};
use crate::editor::export::{export_json, export_text, ExportArtifact};
use crate::editor::history::VersionInfo;
use crate::editor::session::{EditorSession, HistoryCommand, SessionView};
use crate::errors::AppError;
use crate::models::resume::{ItemId, Section};
use crate::models::version::{VersionComparison, VersionSummary};
use crate::persistence::save_resume;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct FieldUpdate {
    pub field: String,
    pub value: Value,
}

#[derive(Deserialize)]
pub struct TemplateRequest {
    pub template: u32,
}

#[derive(Deserialize)]
pub struct SkillRequest {
    pub skill: String,
}

#[derive(Deserialize)]
pub struct ShortcutRequest {
    pub keys: String,
}

#[derive(Deserialize)]
pub struct SaveVersionRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct RenameVersionRequest {
    pub name: String,
}

#[derive(Deserialize, Default, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Text,
}

#[derive(Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
}

#[derive(Deserialize)]
pub struct CompareQuery {
    pub from: Uuid,
    pub to: Uuid,
}

#[derive(Serialize)]
pub struct ItemCreatedResponse {
    pub id: ItemId,
    pub session: SessionView,
}

#[derive(Serialize)]
pub struct PublishResponse {
    pub key: String,
}

fn parse_section(raw: &str) -> Result<Section, AppError> {
    raw.parse::<Section>().map_err(AppError::Validation)
}

/// Writes the live document through and hands back the session view.
async fn persist_view(state: &AppState, session: &EditorSession) -> Result<SessionView, AppError> {
    save_resume(state.store.as_ref(), session.document()).await?;
    Ok(session.view())
}

async fn persist_versions(state: &AppState) -> Result<(), AppError> {
    let versions = state.versions.lock().await;
    versions.persist(state.store.as_ref()).await?;
    Ok(())
}

fn attachment(artifact: ExportArtifact) -> Response {
    (
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact.file_name),
            ),
        ],
        artifact.body,
    )
        .into_response()
}

/// GET /api/v1/resume
pub async fn handle_get_resume(State(state): State<AppState>) -> Json<SessionView> {
    Json(state.session.lock().await.view())
}

/// DELETE /api/v1/resume
pub async fn handle_clear_resume(
    State(state): State<AppState>,
) -> Result<Json<SessionView>, AppError> {
    let mut session = state.session.lock().await;
    session.edit(|doc| doc.clear());
    info!("Resume cleared");
    Ok(Json(persist_view(&state, &session).await?))
}

/// POST /api/v1/resume/import
pub async fn handle_import(
    State(state): State<AppState>,
    Json(raw): Json<Value>,
) -> Result<Json<SessionView>, AppError> {
    let mut session = state.session.lock().await;
    session.import(raw)?;
    info!("Resume imported");
    Ok(Json(persist_view(&state, &session).await?))
}

/// GET /api/v1/resume/export?format=json|text
pub async fn handle_export(
    State(state): State<AppState>,
    Query(params): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let session = state.session.lock().await;
    let artifact = match params.format {
        ExportFormat::Json => export_json(session.document())?,
        ExportFormat::Text => export_text(session.document()),
    };
    Ok(attachment(artifact))
}

/// GET /api/v1/resume/report
pub async fn handle_report(State(state): State<AppState>) -> Json<CompletenessReport> {
    let session = state.session.lock().await;
    Json(compute_completeness_report(session.document()))
}

/// PATCH /api/v1/resume/personal-info
pub async fn handle_update_personal_info(
    State(state): State<AppState>,
    Json(req): Json<FieldUpdate>,
) -> Result<Json<SessionView>, AppError> {
    let mut session = state.session.lock().await;
    session.edit(|doc| doc.update_personal_info(&req.field, req.value));
    Ok(Json(persist_view(&state, &session).await?))
}

/// PUT /api/v1/resume/template
pub async fn handle_set_template(
    State(state): State<AppState>,
    Json(req): Json<TemplateRequest>,
) -> Result<Json<SessionView>, AppError> {
    let mut session = state.session.lock().await;
    if !session.edit(|doc| doc.set_template(req.template)) {
        return Err(AppError::Validation(format!(
            "Unknown template {}",
            req.template
        )));
    }
    Ok(Json(persist_view(&state, &session).await?))
}

/// POST /api/v1/resume/skills
///
/// Blank and duplicate skills are ignored; the unchanged view comes back.
pub async fn handle_add_skill(
    State(state): State<AppState>,
    Json(req): Json<SkillRequest>,
) -> Result<Json<SessionView>, AppError> {
    let mut session = state.session.lock().await;
    session.edit(|doc| doc.add_skill(&req.skill));
    Ok(Json(persist_view(&state, &session).await?))
}

/// DELETE /api/v1/resume/skills/:index
pub async fn handle_remove_skill(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<SessionView>, AppError> {
    let mut session = state.session.lock().await;
    if !session.edit(|doc| doc.remove_skill(index)) {
        return Err(AppError::NotFound(format!("Skill {index} not found")));
    }
    Ok(Json(persist_view(&state, &session).await?))
}

/// POST /api/v1/resume/sections/:section
pub async fn handle_add_item(
    State(state): State<AppState>,
    Path(section): Path<String>,
) -> Result<(StatusCode, Json<ItemCreatedResponse>), AppError> {
    let section = parse_section(&section)?;
    let mut session = state.session.lock().await;
    let id = session.edit(|doc| doc.add_item(section));
    let view = persist_view(&state, &session).await?;
    Ok((
        StatusCode::CREATED,
        Json(ItemCreatedResponse { id, session: view }),
    ))
}

/// PATCH /api/v1/resume/sections/:section/:index
pub async fn handle_update_item(
    State(state): State<AppState>,
    Path((section, index)): Path<(String, usize)>,
    Json(req): Json<FieldUpdate>,
) -> Result<Json<SessionView>, AppError> {
    let section = parse_section(&section)?;
    let mut session = state.session.lock().await;
    if !session.edit(|doc| doc.update_item(section, index, &req.field, req.value)) {
        return Err(AppError::NotFound(format!("{section} item {index} not found")));
    }
    Ok(Json(persist_view(&state, &session).await?))
}

/// DELETE /api/v1/resume/sections/:section/:index
pub async fn handle_remove_item(
    State(state): State<AppState>,
    Path((section, index)): Path<(String, usize)>,
) -> Result<Json<SessionView>, AppError> {
    let section = parse_section(&section)?;
    let mut session = state.session.lock().await;
    if !session.edit(|doc| doc.remove_item(section, index)) {
        return Err(AppError::NotFound(format!("{section} item {index} not found")));
    }
    Ok(Json(persist_view(&state, &session).await?))
}

/// GET /api/v1/history
pub async fn handle_get_history(State(state): State<AppState>) -> Json<VersionInfo> {
    Json(state.session.lock().await.version_info())
}

/// POST /api/v1/history/undo
///
/// At the start of history this is a no-op; `canUndo` in the view says so.
pub async fn handle_undo(State(state): State<AppState>) -> Result<Json<SessionView>, AppError> {
    let mut session = state.session.lock().await;
    session.undo();
    Ok(Json(persist_view(&state, &session).await?))
}

/// POST /api/v1/history/redo
pub async fn handle_redo(State(state): State<AppState>) -> Result<Json<SessionView>, AppError> {
    let mut session = state.session.lock().await;
    session.redo();
    Ok(Json(persist_view(&state, &session).await?))
}

/// POST /api/v1/history/restore/:index
pub async fn handle_restore(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<SessionView>, AppError> {
    let mut session = state.session.lock().await;
    if index >= session.history().len() {
        return Err(AppError::NotFound(format!("History entry {index} not found")));
    }
    session.restore(index);
    Ok(Json(persist_view(&state, &session).await?))
}

/// POST /api/v1/history/clear
pub async fn handle_clear_history(State(state): State<AppState>) -> Json<SessionView> {
    let mut session = state.session.lock().await;
    session.clear_history();
    Json(session.view())
}

/// POST /api/v1/history/shortcut
pub async fn handle_shortcut(
    State(state): State<AppState>,
    Json(req): Json<ShortcutRequest>,
) -> Result<Json<SessionView>, AppError> {
    let command = HistoryCommand::from_shortcut(&req.keys)
        .ok_or_else(|| AppError::Validation(format!("Unrecognised shortcut '{}'", req.keys)))?;
    let mut session = state.session.lock().await;
    session.apply(command);
    Ok(Json(persist_view(&state, &session).await?))
}

/// GET /api/v1/versions
pub async fn handle_list_versions(State(state): State<AppState>) -> Json<Vec<VersionSummary>> {
    Json(state.versions.lock().await.list())
}

/// POST /api/v1/versions
///
/// Body `{}` or `{"name": ...}`; a blank name falls back to "Version N".
pub async fn handle_save_version(
    State(state): State<AppState>,
    Json(req): Json<SaveVersionRequest>,
) -> Result<(StatusCode, Json<VersionSummary>), AppError> {
    let document = state.session.lock().await.document().clone();

    let mut versions = state.versions.lock().await;
    let id = versions.save_version(&document, req.name.as_deref());
    versions.persist(state.store.as_ref()).await?;

    let summary = versions
        .get(id)
        .map(VersionSummary::from)
        .ok_or_else(|| anyhow::anyhow!("Saved version {id} vanished"))?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// GET /api/v1/versions/compare?from=&to=
pub async fn handle_compare_versions(
    State(state): State<AppState>,
    Query(params): Query<CompareQuery>,
) -> Result<Json<VersionComparison>, AppError> {
    let versions = state.versions.lock().await;
    versions
        .compare_versions(params.from, params.to)
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Versions {} and {} not both found",
                params.from, params.to
            ))
        })
}

/// POST /api/v1/versions/:id/load
///
/// Loading is an ordinary edit, so it can be undone.
pub async fn handle_load_version(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let document = state
        .versions
        .lock()
        .await
        .load_version(id)
        .ok_or_else(|| AppError::NotFound(format!("Version {id} not found")))?;

    let mut session = state.session.lock().await;
    session.load(document);
    info!("Loaded version {id}");
    Ok(Json(persist_view(&state, &session).await?))
}

/// PATCH /api/v1/versions/:id
pub async fn handle_rename_version(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RenameVersionRequest>,
) -> Result<StatusCode, AppError> {
    let renamed = state.versions.lock().await.rename_version(id, &req.name);
    if !renamed {
        return Err(AppError::NotFound(format!("Version {id} not found")));
    }
    persist_versions(&state).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/versions/:id
pub async fn handle_delete_version(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state.versions.lock().await.delete_version(id);
    if !deleted {
        return Err(AppError::NotFound(format!("Version {id} not found")));
    }
    persist_versions(&state).await?;
    info!("Deleted version {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/versions/:id/export
pub async fn handle_export_version(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let artifact = state
        .versions
        .lock()
        .await
        .export_version(id)
        .ok_or_else(|| AppError::NotFound(format!("Version {id} not found")))??;
    Ok(attachment(artifact))
}

/// POST /api/v1/versions/:id/publish
pub async fn handle_publish_version(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublishResponse>, AppError> {
    let sink = state
        .exporter
        .clone()
        .ok_or_else(|| AppError::Validation("Export publishing is not configured".to_string()))?;

    let artifact = state
        .versions
        .lock()
        .await
        .export_version(id)
        .ok_or_else(|| AppError::NotFound(format!("Version {id} not found")))??;

    let key = sink.publish(&artifact).await?;
    Ok(Json(PublishResponse { key }))
}
