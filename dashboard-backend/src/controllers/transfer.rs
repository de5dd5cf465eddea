//! Native currency transfer endpoints

use actix_web::{web, HttpResponse, Responder};
use dashboard_types::{DispatchResponse, TransferRequest};

use super::flow_error_response;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/transfer")
            .route(web::get().to(get_transfer))
            .route(web::post().to(post_transfer)),
    );
}

async fn get_transfer(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.sessions.current().transfer.view())
}

/// Submit a transfer. Responds once the node has accepted the transaction;
/// confirmation progress is pushed over the WebSocket.
async fn post_transfer(
    state: web::Data<AppState>,
    body: web::Json<TransferRequest>,
) -> impl Responder {
    let transfer = state.sessions.current().transfer.clone();

    match transfer.transfer(&body.to, &body.amount).await {
        Ok(pending) => HttpResponse::Ok().json(DispatchResponse {
            success: true,
            tx_hash: format!("{:?}", pending.tx_hash),
            state: pending.state,
        }),
        Err(e) => {
            log::warn!("[TRANSFER] Dispatch failed: {}", e);
            flow_error_response(&e)
        }
    }
}
