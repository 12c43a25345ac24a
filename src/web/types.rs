// src/web/types.rs

use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::apply::{ApplyResult, ApplyStatus, ApplyTimings, SendOutcome};
use crate::core::GenerativeService;
use crate::discovery::{DescriptionWriter, OpportunityFinder};
use crate::state::{AppState, BusyFlag};
use crate::types::{Job, LocationData, UserRole};

pub type SharedState = Arc<Mutex<AppState>>;

/// Everything the handlers need, managed by Rocket
pub struct ServerContext {
    pub state: SharedState,
    pub finder: OpportunityFinder,
    pub writer: DescriptionWriter,
    pub outcome: Box<dyn SendOutcome>,
    pub apply_timings: ApplyTimings,
}

impl ServerContext {
    pub fn new(
        state: AppState,
        service: Arc<dyn GenerativeService>,
        outcome: Box<dyn SendOutcome>,
        apply_timings: ApplyTimings,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            finder: OpportunityFinder::new(service.clone()),
            writer: DescriptionWriter::new(service),
            outcome,
            apply_timings,
        }
    }
}

// ===== Response Envelopes =====

#[derive(Serialize)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum ResponseType {
    Text,
    Data,
    Error,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct TextResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DataResponse<T> {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub data: T,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
}

pub type ApiError = status::Custom<Json<StandardErrorResponse>>;
pub type ApiResult<T> = Result<Json<DataResponse<T>>, ApiError>;

impl TextResponse {
    pub fn success(message: String) -> Self {
        Self {
            response_type: ResponseType::Text,
            success: true,
            message,
        }
    }
}

impl<T> DataResponse<T> {
    pub fn success(message: String, data: T) -> Self {
        Self {
            response_type: ResponseType::Data,
            success: true,
            message,
            data,
        }
    }
}

impl StandardErrorResponse {
    pub fn new(error: String, error_code: String, suggestions: Vec<String>) -> Self {
        Self {
            response_type: ResponseType::Error,
            success: false,
            error,
            error_code,
            suggestions,
        }
    }
}

pub fn api_error(status: Status, error: &str, error_code: &str, suggestions: &[&str]) -> ApiError {
    status::Custom(
        status,
        Json(StandardErrorResponse::new(
            error.to_string(),
            error_code.to_string(),
            suggestions.iter().map(|s| s.to_string()).collect(),
        )),
    )
}

// ===== Request Types =====

#[derive(Debug, Default, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct NearbySearchRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct DescribeRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ApplyRequest {
    #[serde(default)]
    pub message: String,
}

// ===== Response Data =====

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct SessionInfo {
    pub role: UserRole,
    pub location: Option<LocationData>,
    pub loading_location: bool,
    pub searching_nearby: bool,
    pub generating_description: bool,
    pub job_count: usize,
}

impl From<&AppState> for SessionInfo {
    fn from(state: &AppState) -> Self {
        Self {
            role: state.role(),
            location: state.location().cloned(),
            loading_location: state.loading_location(),
            searching_nearby: state.is_busy(BusyFlag::Discovery),
            generating_description: state.is_busy(BusyFlag::Description),
            job_count: state.jobs().len(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct NearbySearchData {
    pub added: usize,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DescriptionData {
    pub description: String,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ApplyData {
    pub result: ApplyResult,
    pub status: ApplyStatus,
    pub open: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct ApplyFormData {
    pub job_id: String,
    pub status: ApplyStatus,
}
