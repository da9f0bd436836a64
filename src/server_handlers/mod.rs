use actix_web::HttpResponse;
use serde_json::json;
use tracing::{error, warn};

use crate::error::EligibilityError;

pub mod eligibility;
pub mod health;
pub mod users;

pub use eligibility::*;
pub use health::*;
pub use users::*;

/// Traduce un error del dominio a la respuesta HTTP correspondiente.
pub fn error_response(e: &EligibilityError) -> HttpResponse {
    match e {
        EligibilityError::UserNotFound(_) | EligibilityError::ProgramNotFound(_) => {
            HttpResponse::NotFound().json(json!({"error": e.to_string()}))
        }
        EligibilityError::InvalidGrade(_) => {
            warn!("invalid grade data: {}", e);
            HttpResponse::UnprocessableEntity().json(json!({"error": e.to_string()}))
        }
        EligibilityError::Validation(_) => HttpResponse::BadRequest().json(json!({"error": e.to_string()})),
        _ => {
            error!("request failed: {}", e);
            HttpResponse::InternalServerError().json(json!({"error": e.to_string()}))
        }
    }
}

/// Error del pool bloqueante de actix (el closure entró en pánico o se canceló).
pub fn blocking_error_response(e: actix_web::error::BlockingError) -> HttpResponse {
    error!("blocking task failed: {}", e);
    HttpResponse::InternalServerError().json(json!({"error": "internal error"}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        assert_eq!(error_response(&EligibilityError::UserNotFound(1)).status(), StatusCode::NOT_FOUND);
        assert_eq!(error_response(&EligibilityError::ProgramNotFound("P".into())).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            error_response(&EligibilityError::InvalidGrade("N/A".into())).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(error_response(&EligibilityError::Validation("x".into())).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error_response(&EligibilityError::Storage("db down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
