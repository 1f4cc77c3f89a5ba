use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::clock::Clock;
use super::domain::{AnswerSet, IntakeForm, Question, RecordId};
use super::engine;
use super::records::{ExportFormat, RecordFilter, RecordStoreError};
use super::service::{SessionId, TriageDesk, TriageDeskError};
use super::storage::KeyValueStore;

/// Router exposing the triage desk: priority preview, intake sessions, records, and exports.
pub fn triage_router<S, C>(desk: Arc<TriageDesk<S, C>>) -> Router
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    Router::new()
        .route("/api/v1/triage/priority", post(priority_handler))
        .route("/api/v1/triage/sessions", post(open_session_handler::<S, C>))
        .route(
            "/api/v1/triage/sessions/:session_id",
            get(session_handler::<S, C>).delete(abandon_handler::<S, C>),
        )
        .route(
            "/api/v1/triage/sessions/:session_id/answers",
            post(answer_handler::<S, C>),
        )
        .route(
            "/api/v1/triage/sessions/:session_id/finalize",
            post(finalize_handler::<S, C>),
        )
        .route(
            "/api/v1/triage/records",
            get(list_handler::<S, C>).delete(clear_handler::<S, C>),
        )
        .route(
            "/api/v1/triage/records/:record_id",
            get(record_handler::<S, C>).delete(delete_handler::<S, C>),
        )
        .route(
            "/api/v1/triage/exports/:format",
            get(export_handler::<S, C>),
        )
        .with_state(desk)
}

/// Partial questionnaire; omitted or null answers are treated as unanswered.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PriorityRequest {
    #[serde(default)]
    pub(crate) breathing: Option<bool>,
    #[serde(default)]
    pub(crate) conscious: Option<bool>,
    #[serde(default)]
    pub(crate) walking: Option<bool>,
    #[serde(default)]
    pub(crate) bleeding: Option<bool>,
}

impl From<PriorityRequest> for AnswerSet {
    fn from(request: PriorityRequest) -> Self {
        Self {
            breathing: request.breathing.into(),
            conscious: request.conscious.into(),
            walking: request.walking.into(),
            bleeding: request.bleeding.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerRequest {
    pub(crate) question: Question,
    pub(crate) value: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ClearParams {
    #[serde(default)]
    pub(crate) confirm: bool,
}

pub(crate) async fn priority_handler(Json(request): Json<PriorityRequest>) -> Response {
    let answers = AnswerSet::from(request);
    let payload = match answers.complete() {
        Some(complete) => {
            let matched = engine::explain(&complete);
            json!({
                "complete": true,
                "priority": matched.priority,
                "label": matched.priority.label(),
                "description": matched.priority.description(),
                "rule": matched.rule,
                "rationale": matched.rationale,
            })
        }
        None => json!({
            "complete": false,
            "missing": answers.unanswered(),
        }),
    };
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn open_session_handler<S, C>(
    State(desk): State<Arc<TriageDesk<S, C>>>,
    Json(form): Json<IntakeForm>,
) -> Response
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    match desk.open_session(&form) {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn session_handler<S, C>(
    State(desk): State<Arc<TriageDesk<S, C>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    match desk.session(&SessionId(session_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn abandon_handler<S, C>(
    State(desk): State<Arc<TriageDesk<S, C>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    match desk.abandon(&SessionId(session_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn answer_handler<S, C>(
    State(desk): State<Arc<TriageDesk<S, C>>>,
    Path(session_id): Path<String>,
    Json(request): Json<AnswerRequest>,
) -> Response
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    match desk.answer(&SessionId(session_id), request.question, request.value) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn finalize_handler<S, C>(
    State(desk): State<Arc<TriageDesk<S, C>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    match desk.finalize(&SessionId(session_id)) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<S, C>(
    State(desk): State<Arc<TriageDesk<S, C>>>,
    Query(filter): Query<RecordFilter>,
) -> Response
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    (StatusCode::OK, Json(desk.records(&filter))).into_response()
}

pub(crate) async fn record_handler<S, C>(
    State(desk): State<Arc<TriageDesk<S, C>>>,
    Path(record_id): Path<u64>,
) -> Response
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    match desk.record(RecordId(record_id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<S, C>(
    State(desk): State<Arc<TriageDesk<S, C>>>,
    Path(record_id): Path<u64>,
) -> Response
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    match desk.delete(RecordId(record_id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn clear_handler<S, C>(
    State(desk): State<Arc<TriageDesk<S, C>>>,
    Query(params): Query<ClearParams>,
) -> Response
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    match desk.clear(params.confirm) {
        Ok(removed) => (
            StatusCode::OK,
            Json(json!({ "removed": removed, "durability": desk.durability() })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn export_handler<S, C>(
    State(desk): State<Arc<TriageDesk<S, C>>>,
    Path(format): Path<String>,
) -> Response
where
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    let format = match format.parse::<ExportFormat>() {
        Ok(format) => format,
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
        }
    };

    match desk.export(format) {
        Ok(artifact) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, artifact.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", artifact.filename),
                ),
            ],
            artifact.body,
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: TriageDeskError) -> Response {
    let (status, payload) = match &err {
        TriageDeskError::Intake(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": err.to_string() }),
        ),
        TriageDeskError::Incomplete(incomplete) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": err.to_string(), "missing": incomplete.missing }),
        ),
        TriageDeskError::Session(_) | TriageDeskError::Store(RecordStoreError::DuplicateId(_)) => {
            (StatusCode::CONFLICT, json!({ "error": err.to_string() }))
        }
        TriageDeskError::UnknownSession(_) | TriageDeskError::Store(RecordStoreError::NotFound(_)) => {
            (StatusCode::NOT_FOUND, json!({ "error": err.to_string() }))
        }
        TriageDeskError::ConfirmationRequired => (
            StatusCode::BAD_REQUEST,
            json!({ "error": err.to_string(), "hint": "repeat the request with confirm=true" }),
        ),
        TriageDeskError::Export(_) => {
            warn!(error = %err, "export failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": err.to_string() }),
            )
        }
    };
    (status, Json(payload)).into_response()
}
