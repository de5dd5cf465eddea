use actix_web::{web, HttpResponse, Responder};

use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health_check)));
    cfg.service(web::resource("/api/version").route(web::get().to(get_version)));
    cfg.service(web::resource("/api/health/config").route(web::get().to(get_config_status)));
    cfg.service(web::resource("/api/nav").route(web::get().to(get_nav)));
}

async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": VERSION
    }))
}

async fn get_version() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "version": VERSION
    }))
}

async fn get_config_status(state: web::Data<AppState>) -> impl Responder {
    let wallet_address = state.chain.account().map(|a| format!("{:?}", a));

    HttpResponse::Ok().json(serde_json::json!({
        "wallet_connected": wallet_address.is_some(),
        "wallet_address": wallet_address,
        "wallet_mode": state.wallet_mode,
        "voting_contract_configured": state.config.voting_contract.is_some(),
        "chain_id": state.chain_id,
        "ws_clients": state.broadcaster.client_count(),
    }))
}

async fn get_nav() -> impl Responder {
    HttpResponse::Ok().json(dashboard_types::nav_menu())
}
