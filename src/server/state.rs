use axum::extract::FromRef;
use std::sync::Arc;
use std::time::Instant;

use crate::service::WorkflowService;

pub type SharedService = Arc<WorkflowService>;

#[derive(Clone)]
pub struct ServerState {
    pub service: SharedService,
    pub start_time: Instant,
}

impl ServerState {
    pub fn new(service: SharedService) -> Self {
        Self {
            service,
            start_time: Instant::now(),
        }
    }
}

impl FromRef<ServerState> for SharedService {
    fn from_ref(input: &ServerState) -> Self {
        input.service.clone()
    }
}
