use actix_web::{web, HttpResponse, Responder};

use crate::dashboard::build_dashboard;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/dashboard").route(web::get().to(get_dashboard)));
}

async fn get_dashboard(state: web::Data<AppState>) -> impl Responder {
    let session = state.sessions.current();
    let view = build_dashboard(state.chain.as_ref(), state.chain_id, &session).await;
    HttpResponse::Ok().json(view)
}
