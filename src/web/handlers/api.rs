use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::db::table::QueryOutcome;
use crate::llm::prompt::instructions;
use crate::pipeline::Answer;
use crate::schema::TableSchema;
use crate::web::state::AppState;

// Query types

#[derive(Debug, Deserialize)]
pub struct ExecuteQueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub sql: String,
    pub execution_time_ms: u64,
    pub outcome: QueryOutcome,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NlQueryRequest {
    pub question: String,
}

// Schema

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub table: TableSchema,
    pub instructions: &'static str,
}

// System status

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime_seconds: i64,
    pub questions_answered: u64,
    pub llm_backend: String,
    pub llm_model: String,
    pub database_reachable: bool,
}

// API Implementations

// Natural language query
pub async fn nl_query(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<NlQueryRequest>,
) -> (StatusCode, Json<Answer>) {
    let answer = app_state.pipeline.answer(&payload.question).await;
    app_state.record_answer();

    let status = if answer.generation_failed() {
        StatusCode::BAD_GATEWAY
    } else if answer.query_failed() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };

    (status, Json(answer))
}

// Query execution
pub async fn execute_query(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ExecuteQueryRequest>,
) -> (StatusCode, Json<QueryResponse>) {
    let start_time = Instant::now();
    info!("Executing SQL query: {}", payload.query);

    let outcome = state.pipeline.gateway().execute_async(payload.query.clone()).await;
    let status = if outcome.is_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };

    (
        status,
        Json(QueryResponse {
            sql: payload.query,
            execution_time_ms: start_time.elapsed().as_millis() as u64,
            outcome,
        }),
    )
}

// Export
pub async fn export_data(
    State(state): State<Arc<AppState>>,
    Path(format): Path<String>,
    Json(payload): Json<ExecuteQueryRequest>,
) -> Result<Response, (StatusCode, String)> {
    if !matches!(format.as_str(), "csv" | "json") {
        return Err((StatusCode::BAD_REQUEST, "Unsupported export format".to_string()));
    }

    let outcome = state.pipeline.gateway().execute_async(payload.query).await;
    if let Some(message) = outcome.error_message() {
        return Err((StatusCode::BAD_REQUEST, format!("SQL error: {}", message)));
    }
    let table = outcome.table();

    match format.as_str() {
        "csv" => {
            let body = table.to_csv().map_err(|e| {
                error!("Failed to write CSV: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to write CSV: {}", e))
            })?;
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                    (header::CONTENT_DISPOSITION, "attachment; filename=\"result.csv\""),
                ],
                body,
            )
                .into_response())
        }
        _ => Ok(Json(table).into_response()),
    }
}

// Schema
pub async fn get_schema() -> Json<SchemaResponse> {
    Json(SchemaResponse {
        table: TableSchema::top_scorers(),
        instructions: instructions(),
    })
}

// System status
pub async fn system_status(State(state): State<Arc<AppState>>) -> Json<SystemStatus> {
    let now = chrono::Utc::now();
    let uptime = now.signed_duration_since(state.startup_time).num_seconds();

    let gateway = state.pipeline.gateway().clone();
    let database_reachable = tokio::task::spawn_blocking(move || gateway.ping())
        .await
        .unwrap_or(false);

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        questions_answered: state.questions_answered(),
        llm_backend: state.config.llm.backend.clone(),
        llm_model: state.config.llm.model.clone(),
        database_reachable,
    })
}
