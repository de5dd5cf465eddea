pub mod dashboard;
pub mod health;
pub mod session;
pub mod transfer;
pub mod voting;

use actix_web::HttpResponse;
use dashboard_types::{ApiError, ErrorKind};

use crate::flows::FlowError;

/// Map a dispatch failure onto an HTTP error response
pub(crate) fn flow_error_response(err: &FlowError) -> HttpResponse {
    let body = ApiError::new(err.detail(), Some(err.kind()));
    match err {
        FlowError::NotConnected | FlowError::ContractNotConfigured => {
            HttpResponse::ServiceUnavailable().json(body)
        }
        _ => match err.kind() {
            ErrorKind::InputValidation => HttpResponse::BadRequest().json(body),
            ErrorKind::PreconditionViolation => HttpResponse::Conflict().json(body),
            ErrorKind::SubmissionRejection | ErrorKind::ConfirmationFailure => {
                HttpResponse::BadGateway().json(body)
            }
        },
    }
}
