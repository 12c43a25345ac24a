// src/web/handlers/system_handlers.rs
use crate::web::types::*;

use rocket::serde::json::Json;
use rocket::State;
use tracing::info;

pub async fn health_handler(context: &State<ServerContext>) -> Json<TextResponse> {
    let state = context.state.lock().await;
    info!("Health check, {} jobs in session", state.jobs().len());
    Json(TextResponse::success("OK".to_string()))
}

pub async fn get_session_handler(context: &State<ServerContext>) -> Json<DataResponse<SessionInfo>> {
    let state = context.state.lock().await;
    let message = if state.loading_location() {
        "Konum belirleniyor..."
    } else {
        "Oturum hazır"
    };
    Json(DataResponse::success(
        message.to_string(),
        SessionInfo::from(&*state),
    ))
}

pub async fn toggle_role_handler(context: &State<ServerContext>) -> Json<DataResponse<SessionInfo>> {
    let mut state = context.state.lock().await;
    let role = state.toggle_role();
    Json(DataResponse::success(
        format!("Role switched to {:?}", role),
        SessionInfo::from(&*state),
    ))
}
