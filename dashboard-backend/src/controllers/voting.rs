//! Voting contract endpoints

use actix_web::{web, HttpResponse, Responder};
use dashboard_types::{DispatchResponse, VoteRequest};

use super::flow_error_response;
use crate::flows::{FlowError, VotingFlow};
use crate::AppState;
use std::sync::Arc;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/voting")
            .route("", web::get().to(get_voting))
            .route("/vote", web::post().to(post_vote))
            .route("/refresh", web::post().to(refresh)),
    );
}

fn voting_flow(state: &AppState) -> Result<Arc<VotingFlow>, HttpResponse> {
    state
        .sessions
        .current()
        .voting
        .clone()
        .ok_or_else(|| flow_error_response(&FlowError::ContractNotConfigured))
}

async fn get_voting(state: web::Data<AppState>) -> impl Responder {
    match voting_flow(&state) {
        Ok(voting) => HttpResponse::Ok().json(voting.view()),
        Err(resp) => resp,
    }
}

async fn post_vote(state: web::Data<AppState>, body: web::Json<VoteRequest>) -> impl Responder {
    let voting = match voting_flow(&state) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match voting.vote(&body.option).await {
        Ok(pending) => HttpResponse::Ok().json(DispatchResponse {
            success: true,
            tx_hash: format!("{:?}", pending.tx_hash),
            state: pending.state,
        }),
        Err(e) => {
            log::warn!("[VOTING] Dispatch failed: {}", e);
            flow_error_response(&e)
        }
    }
}

async fn refresh(state: web::Data<AppState>) -> impl Responder {
    let voting = match voting_flow(&state) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    voting.refresh().await;
    HttpResponse::Ok().json(voting.view())
}
