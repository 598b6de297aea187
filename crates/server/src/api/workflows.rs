//! Workflow API handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use mediaconv_core::workflow::{
    ConversionOutput, FailureKind, InputSlot, OutputSummary, SelectedFile, Workflow,
    WorkflowError, WorkflowSnapshot,
};
use serde::Serialize;
use tracing::{error, info};

use crate::metrics::record_conversion;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    pub retryable: bool,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            kind: None,
            retryable: false,
        }),
    )
}

fn workflow_error(err: &WorkflowError) -> ApiError {
    let status = match err {
        WorkflowError::Busy => StatusCode::CONFLICT,
        WorkflowError::MissingInput { .. } | WorkflowError::UnsupportedSlot { .. } => {
            StatusCode::BAD_REQUEST
        }
        _ => match err.failure_kind() {
            Some(FailureKind::EngineLoad) => StatusCode::BAD_GATEWAY,
            Some(FailureKind::InvalidInput) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
    };
    (
        status,
        Json(ErrorResponse {
            error: err.user_message(),
            kind: err.failure_kind(),
            retryable: err.is_retryable(),
        }),
    )
}

fn find_workflow(state: &AppState, id: &str) -> Result<Arc<Workflow>, ApiError> {
    state
        .workflow(id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Unknown workflow: {}", id)))
}

/// Metrics label for a conversion outcome.
fn outcome(result: &Result<ConversionOutput, WorkflowError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(WorkflowError::Busy) => "busy",
        Err(WorkflowError::MissingInput { .. }) => "missing_input",
        Err(e) => e.failure_kind().map_or("refused", |k| k.as_str()),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/workflows/{workflow}
pub async fn get_workflow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<WorkflowSnapshot>, ApiError> {
    let workflow = find_workflow(&state, &id)?;
    Ok(Json(workflow.snapshot().await))
}

/// PUT /api/v1/workflows/{workflow}/inputs/{slot}
///
/// Selects the uploaded `file` field for the slot. A form without a file
/// keeps the current selection.
pub async fn select_input(
    State(state): State<Arc<AppState>>,
    Path((id, slot)): Path<(String, String)>,
    mut multipart: Multipart,
) -> Result<Json<WorkflowSnapshot>, ApiError> {
    let workflow = find_workflow(&state, &id)?;
    let slot: InputSlot = slot
        .parse()
        .map_err(|e: String| api_error(StatusCode::BAD_REQUEST, e))?;
    if !workflow.recipe().accepts(slot) {
        return Err(workflow_error(&WorkflowError::UnsupportedSlot { slot }));
    }

    let mut file: Option<SelectedFile> = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(api_error(
                    e.status(),
                    format!("Failed to read upload: {}", e.body_text()),
                ))
            }
        };
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field.bytes().await.map_err(|e| {
            api_error(
                e.status(),
                format!("Failed to read file: {}", e.body_text()),
            )
        })?;

        // An empty picker submits a nameless, empty part
        if !(name.is_empty() && data.is_empty()) {
            file = Some(SelectedFile::new(name, content_type, data.to_vec()));
        }
    }

    workflow
        .select(slot, file)
        .await
        .map_err(|e| workflow_error(&e))?;
    Ok(Json(workflow.snapshot().await))
}

/// POST /api/v1/workflows/{workflow}/convert
///
/// Runs the conversion on its own task so a client going away does not
/// abort it.
pub async fn convert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OutputSummary>, ApiError> {
    let workflow = find_workflow(&state, &id)?;
    let recipe = workflow.recipe();

    let task = tokio::spawn(async move {
        let start = Instant::now();
        let result = workflow.convert().await;
        let label = outcome(&result);
        let elapsed = match &result {
            Err(e) if e.failure_kind().is_none() => None,
            _ => Some(start.elapsed().as_secs_f64()),
        };
        record_conversion(recipe.id, label, elapsed);
        result
    });

    match task.await {
        Ok(Ok(output)) => {
            info!(workflow = recipe.id, output_id = %output.id, "Conversion available");
            Ok(Json(output.summary()))
        }
        Ok(Err(e)) => Err(workflow_error(&e)),
        Err(e) => {
            error!(workflow = recipe.id, "Conversion task failed: {}", e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "The conversion stopped unexpectedly",
            ))
        }
    }
}

/// GET /api/v1/workflows/{workflow}/download
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    serve_result(&state, &id, "attachment").await
}

/// GET /api/v1/workflows/{workflow}/preview
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    serve_result(&state, &id, "inline").await
}

async fn serve_result(state: &AppState, id: &str, disposition: &str) -> Result<Response, ApiError> {
    let workflow = find_workflow(state, id)?;
    let output = workflow
        .download()
        .await
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "No converted file yet"))?;

    Ok((
        [
            (header::CONTENT_TYPE, output.mime.clone()),
            (
                header::CONTENT_DISPOSITION,
                format!("{}; filename=\"{}\"", disposition, output.filename),
            ),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        Body::from(output.data().to_vec()),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaconv_core::engine::EngineError;

    #[test]
    fn test_status_mapping() {
        let status = |e: WorkflowError| workflow_error(&e).0;

        assert_eq!(status(WorkflowError::Busy), StatusCode::CONFLICT);
        assert_eq!(
            status(WorkflowError::MissingInput {
                slot: InputSlot::Video
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(WorkflowError::EngineLoad(EngineError::NotLoaded)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(WorkflowError::NoAudioTrack {
                slot: InputSlot::Video
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(WorkflowError::Execution(EngineError::Timeout { timeout_secs: 5 })),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(outcome(&Err(WorkflowError::Busy)), "busy");
        assert_eq!(outcome(&Err(WorkflowError::NoAudioTrack {
                slot: InputSlot::Audio
            })), "invalid_input");
        let output = ConversionOutput::new("output.mp3", "audio/mpeg", vec![1]);
        assert_eq!(outcome(&Ok(output)), "success");
    }
}
