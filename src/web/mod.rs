// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use types::*;

use crate::apply::{ApplyTimings, RandomOutcome};
use crate::core::location::{acquire_location, position_source_from_config};
use crate::core::{GeminiClient, GenerativeService};
use crate::environment::AppConfig;
use crate::state::AppState;
use crate::types::{Job, JobDraft};
use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::serde::json::Json;
use rocket::{catchers, get, options, post, routes, Build, Request, Response, Rocket, State};
use std::sync::Arc;
use tracing::{error, info};

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
    }
}

#[get("/health")]
pub async fn health(context: &State<ServerContext>) -> Json<TextResponse> {
    handlers::health_handler(context).await
}

#[get("/session")]
pub async fn get_session(context: &State<ServerContext>) -> Json<DataResponse<SessionInfo>> {
    handlers::get_session_handler(context).await
}

#[post("/role/toggle")]
pub async fn toggle_role(context: &State<ServerContext>) -> Json<DataResponse<SessionInfo>> {
    handlers::toggle_role_handler(context).await
}

#[get("/jobs?<q>")]
pub async fn list_jobs(
    q: Option<String>,
    context: &State<ServerContext>,
) -> Json<DataResponse<Vec<Job>>> {
    handlers::list_jobs_handler(q, context).await
}

#[get("/jobs/<id>")]
pub async fn get_job(id: &str, context: &State<ServerContext>) -> ApiResult<Job> {
    handlers::get_job_handler(id, context).await
}

#[post("/jobs", data = "<draft>")]
pub async fn post_job(draft: Json<JobDraft>, context: &State<ServerContext>) -> ApiResult<Job> {
    handlers::post_job_handler(draft.into_inner(), context).await
}

#[post("/jobs/nearby", data = "<request>")]
pub async fn search_nearby(
    request: Json<NearbySearchRequest>,
    context: &State<ServerContext>,
) -> ApiResult<NearbySearchData> {
    handlers::search_nearby_handler(request.into_inner(), context).await
}

#[post("/jobs/describe", data = "<request>")]
pub async fn describe_job(
    request: Json<DescribeRequest>,
    context: &State<ServerContext>,
) -> ApiResult<DescriptionData> {
    handlers::describe_job_handler(request.into_inner(), context).await
}

#[post("/jobs/<id>/apply", data = "<request>")]
pub async fn apply_to_job(
    id: &str,
    request: Json<ApplyRequest>,
    context: &State<ServerContext>,
) -> ApiResult<ApplyData> {
    handlers::apply_handler(id, request.into_inner(), context).await
}

#[get("/jobs/<id>/apply")]
pub async fn application_status(
    id: &str,
    context: &State<ServerContext>,
) -> ApiResult<ApplyFormData> {
    handlers::application_status_handler(id, context).await
}

#[post("/jobs/<id>/apply/close")]
pub async fn close_application(
    id: &str,
    context: &State<ServerContext>,
) -> Result<Json<TextResponse>, ApiError> {
    handlers::close_application_handler(id, context).await
}

#[options("/<_..>")]
pub async fn options() -> rocket::http::Status {
    rocket::http::Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
    ))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Resource not found".to_string(),
        "NOT_FOUND".to_string(),
        vec!["Check the endpoint path".to_string()],
    ))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Request body could not be parsed".to_string(),
        "UNPROCESSABLE_ENTITY".to_string(),
        vec!["Send a JSON body matching the endpoint".to_string()],
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec!["Try again in a few moments".to_string()],
    ))
}

/// Assemble the API around an already-built context
pub fn build_rocket(rocket: Rocket<Build>, context: ServerContext) -> Rocket<Build> {
    rocket
        .attach(Cors)
        .manage(context)
        .register(
            "/api",
            catchers![bad_request, not_found, unprocessable, internal_error],
        )
        .mount(
            "/api",
            routes![
                health,
                get_session,
                toggle_role,
                list_jobs,
                get_job,
                post_job,
                search_nearby,
                describe_job,
                apply_to_job,
                application_status,
                close_application,
                options,
            ],
        )
}

// Main server start function
pub async fn start_web_server(config: AppConfig) -> Result<()> {
    let service: Arc<dyn GenerativeService> = Arc::new(GeminiClient::new(&config.gemini)?);
    if !config.has_api_key() {
        info!("No Gemini API key configured, AI features return defaults");
    }

    let context = ServerContext::new(
        AppState::default(),
        service,
        Box::new(RandomOutcome::new(config.apply.success_rate)),
        ApplyTimings::from(&config.apply),
    );

    // Location resolves in the background; the session reports loading until then
    let source = position_source_from_config(&config.location)?;
    let shared = context.state.clone();
    tokio::spawn(async move {
        let location = acquire_location(source.as_ref()).await;
        shared.lock().await.set_location(location);
    });

    let figment = rocket::Config::figment()
        .merge(("port", config.port))
        .merge(("address", "0.0.0.0"));

    info!("Starting job board API on port {}", config.port);

    if let Err(e) = build_rocket(rocket::custom(figment), context).launch().await {
        error!("Server stopped with error: {}", e);
        return Err(anyhow::anyhow!("Rocket failed: {}", e));
    }

    Ok(())
}
