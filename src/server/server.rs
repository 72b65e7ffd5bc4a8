use anyhow::Result;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::error::payload_rejection;
use super::state::{ServerState, SharedService};
use crate::config::ServerConfig;
use crate::observability::EngineStats;
use crate::service::ServiceError;
use crate::shutdown::shutdown_signal;
use crate::workflows::WorkflowDefinition;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub definitions: usize,
    pub instances: usize,
    pub metrics: EngineStats,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        definitions: state.service.store().definition_count(),
        instances: state.service.store().instance_count(),
        metrics: state.service.metrics().get_stats(),
    };
    Json(stats)
}

async fn create_definition(
    State(service): State<SharedService>,
    payload: Result<Json<WorkflowDefinition>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Json(def) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return Ok(payload_rejection(rejection)),
    };
    let stored = service.create_definition(def)?;
    let location = format!("/workflows/{}", stored.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(stored)).into_response())
}

async fn get_definition(
    State(service): State<SharedService>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    Ok(Json(service.get_definition(&id)?).into_response())
}

async fn list_definitions(State(service): State<SharedService>) -> Response {
    Json(service.list_definitions()).into_response()
}

async fn create_instance(
    State(service): State<SharedService>,
    Path(workflow_id): Path<String>,
) -> Result<Response, ServiceError> {
    let instance = service.create_instance(&workflow_id)?;
    let location = format!("/instances/{}", instance.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(instance)).into_response())
}

async fn get_instance(
    State(service): State<SharedService>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    Ok(Json(service.get_instance(&id)?).into_response())
}

async fn list_instances(State(service): State<SharedService>) -> Response {
    Json(service.list_instances()).into_response()
}

async fn get_available_actions(
    State(service): State<SharedService>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    Ok(Json(service.available_actions(&id)?).into_response())
}

async fn execute_action(
    State(service): State<SharedService>,
    Path((instance_id, action_id)): Path<(String, String)>,
) -> Result<Response, ServiceError> {
    Ok(Json(service.execute_action(&instance_id, &action_id)?).into_response())
}

pub fn make_app(service: SharedService) -> Router {
    let state = ServerState::new(service);

    let workflow_routes: Router<ServerState> = Router::new()
        .route("/workflows", post(create_definition).get(list_definitions))
        .route("/workflows/{id}", get(get_definition))
        .route("/workflows/{id}/instances", post(create_instance));

    let instance_routes: Router<ServerState> = Router::new()
        .route("/instances", get(list_instances))
        .route("/instances/{id}", get(get_instance))
        .route("/instances/{id}/actions", get(get_available_actions))
        .route("/instances/{instance_id}/actions/{action_id}", post(execute_action));

    Router::new()
        .route("/", get(home))
        .merge(workflow_routes)
        .merge(instance_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(service: SharedService, config: &ServerConfig) -> Result<()> {
    let app = make_app(service);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!(address = %listener.local_addr()?, "Workflow engine listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
