use actix_web::{web, HttpResponse, Responder};
use dashboard_types::ApiError;

use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/session/reset").route(web::post().to(reset_session)));
}

/// Drop the current session (cancelling its watchers) and mount a new one
async fn reset_session(state: web::Data<AppState>) -> impl Responder {
    match state.sessions.reset().await {
        Ok(session) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "session_id": session.id,
            "started_at": session.started_at.to_rfc3339(),
        })),
        Err(e) => {
            log::error!("[SESSION] Failed to reset session: {}", e);
            HttpResponse::InternalServerError().json(ApiError::new(e, None))
        }
    }
}
