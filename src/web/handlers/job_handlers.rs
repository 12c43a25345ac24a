// src/web/handlers/job_handlers.rs
use crate::apply::ApplyResult;
use crate::discovery::description::{ensure_title_and_company, MISSING_FIELDS_MESSAGE};
use crate::state::BusyFlag;
use crate::types::{Job, JobDraft, UserRole};
use crate::web::types::*;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info, warn};

pub const NO_OPPORTUNITY_MESSAGE: &str =
    "Yakında yeni bir fırsat bulunamadı. Arama terimini değiştirmeyi deneyin.";
pub const LOCATION_REQUIRED_MESSAGE: &str = "Lütfen konum izni veriniz.";

fn require_role(current: UserRole, required: UserRole) -> Result<(), ApiError> {
    if current == required {
        return Ok(());
    }
    Err(api_error(
        Status::Forbidden,
        &format!("This action is only available to the {:?} view", required),
        "ROLE_MISMATCH",
        &["Toggle the role with POST /api/role/toggle"],
    ))
}

fn busy_error(action: &str) -> ApiError {
    api_error(
        Status::Conflict,
        &format!("{} is already in progress", action),
        "BUSY",
        &["Wait for the running request to finish"],
    )
}

fn job_not_found(id: &str) -> ApiError {
    api_error(
        Status::NotFound,
        &format!("Job not found: {}", id),
        "JOB_NOT_FOUND",
        &["List jobs with GET /api/jobs"],
    )
}

fn form_not_open(id: &str) -> ApiError {
    api_error(
        Status::NotFound,
        &format!("No open application form for job {}", id),
        "FORM_NOT_OPEN",
        &["Apply with POST /api/jobs/<id>/apply"],
    )
}

pub async fn list_jobs_handler(
    query: Option<String>,
    context: &State<ServerContext>,
) -> Json<DataResponse<Vec<Job>>> {
    let state = context.state.lock().await;
    let jobs = state.filtered_jobs(query.as_deref().unwrap_or_default());
    Json(DataResponse::success(
        format!("{} İlan Bulundu", jobs.len()),
        jobs,
    ))
}

pub async fn get_job_handler(id: &str, context: &State<ServerContext>) -> ApiResult<Job> {
    let state = context.state.lock().await;
    match state.job(id) {
        Some(job) => Ok(Json(DataResponse::success(
            "Job found".to_string(),
            job.clone(),
        ))),
        None => Err(job_not_found(id)),
    }
}

pub async fn post_job_handler(draft: JobDraft, context: &State<ServerContext>) -> ApiResult<Job> {
    let mut state = context.state.lock().await;
    require_role(state.role(), UserRole::Employer)?;

    match state.post_job(draft) {
        Ok(job) => Ok(Json(DataResponse::success(
            "İlan başarıyla yayınlandı!".to_string(),
            job,
        ))),
        Err(e) => {
            warn!("Rejected job draft: {}", e);
            Err(api_error(
                Status::BadRequest,
                &e.to_string(),
                "VALIDATION_ERROR",
                &["Fill in title, company name, description and salary"],
            ))
        }
    }
}

pub async fn search_nearby_handler(
    request: NearbySearchRequest,
    context: &State<ServerContext>,
) -> ApiResult<NearbySearchData> {
    let (location, _busy) = {
        let state = context.state.lock().await;
        require_role(state.role(), UserRole::Seeker)?;

        let Some(location) = state.location().cloned() else {
            return Err(api_error(
                Status::Conflict,
                LOCATION_REQUIRED_MESSAGE,
                "LOCATION_REQUIRED",
                &["Wait until the session location is resolved"],
            ));
        };

        let Some(guard) = state.try_begin(BusyFlag::Discovery) else {
            return Err(busy_error("Nearby search"));
        };
        (location, guard)
    };

    let query = request.query.unwrap_or_default();
    let found = context.finder.find_nearby(&query, Some(&location)).await;

    let mut state = context.state.lock().await;

    let jobs = match found {
        Ok(jobs) => jobs,
        Err(e) => {
            error!("Nearby search failed: {}", e);
            return Err(api_error(
                Status::InternalServerError,
                &e.to_string(),
                "DISCOVERY_ERROR",
                &["Try again in a few moments"],
            ));
        }
    };

    if jobs.is_empty() {
        return Ok(Json(DataResponse::success(
            NO_OPPORTUNITY_MESSAGE.to_string(),
            NearbySearchData {
                added: 0,
                jobs: Vec::new(),
            },
        )));
    }

    let jobs = state.add_external_jobs(jobs);
    let added = jobs.len();
    info!("Nearby search for '{}' added {} jobs", query, added);

    Ok(Json(DataResponse::success(
        format!("{} yeni fırsat bulundu", added),
        NearbySearchData { added, jobs },
    )))
}

pub async fn describe_job_handler(
    request: DescribeRequest,
    context: &State<ServerContext>,
) -> ApiResult<DescriptionData> {
    let _busy = {
        let state = context.state.lock().await;
        require_role(state.role(), UserRole::Employer)?;

        if ensure_title_and_company(&request.title, &request.company_name).is_err() {
            return Err(api_error(
                Status::BadRequest,
                MISSING_FIELDS_MESSAGE,
                "VALIDATION_ERROR",
                &["Provide both title and companyName"],
            ));
        }

        let Some(guard) = state.try_begin(BusyFlag::Description) else {
            return Err(busy_error("Description generation"));
        };
        guard
    };

    let description = context
        .writer
        .generate(request.title.trim(), request.company_name.trim())
        .await;

    Ok(Json(DataResponse::success(
        "Description generated".to_string(),
        DescriptionData { description },
    )))
}

pub async fn apply_handler(
    id: &str,
    request: ApplyRequest,
    context: &State<ServerContext>,
) -> ApiResult<ApplyData> {
    let handle = {
        let mut state = context.state.lock().await;
        require_role(state.role(), UserRole::Seeker)?;
        state.application(id)
    };
    let Some(handle) = handle else {
        return Err(job_not_found(id));
    };

    let Some(mut session) = handle.try_claim() else {
        return Err(busy_error("Application send"));
    };

    if let Err(e) = session.set_message(request.message) {
        return Err(api_error(
            Status::Conflict,
            &e.to_string(),
            "FORM_CLOSED",
            &["Open the application form again"],
        ));
    }

    let result = match session
        .send(context.outcome.as_ref(), &context.apply_timings)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            return Err(api_error(
                Status::BadRequest,
                &e.to_string(),
                "VALIDATION_ERROR",
                &["Write a short note to the employer"],
            ))
        }
    };

    if !session.is_open() {
        context.state.lock().await.release_application(id);
    }

    let message = match result {
        ApplyResult::Delivered => "İletildi!",
        ApplyResult::Failed => "Hata!",
    };

    Ok(Json(DataResponse::success(
        message.to_string(),
        ApplyData {
            result,
            status: session.status(),
            open: session.is_open(),
            message: session.message().to_string(),
        },
    )))
}

pub async fn application_status_handler(
    id: &str,
    context: &State<ServerContext>,
) -> ApiResult<ApplyFormData> {
    let state = context.state.lock().await;
    match state.application_status(id) {
        Some(status) => Ok(Json(DataResponse::success(
            format!("Application form is {:?}", status),
            ApplyFormData {
                job_id: id.to_string(),
                status,
            },
        ))),
        None => Err(form_not_open(id)),
    }
}

pub async fn close_application_handler(
    id: &str,
    context: &State<ServerContext>,
) -> Result<Json<TextResponse>, ApiError> {
    let mut state = context.state.lock().await;
    match state.close_application(id) {
        Ok(true) => Ok(Json(TextResponse::success(
            "Application form closed".to_string(),
        ))),
        Ok(false) => Err(form_not_open(id)),
        Err(e) => Err(api_error(
            Status::Conflict,
            &e.to_string(),
            "BUSY",
            &["Wait for the running request to finish"],
        )),
    }
}
