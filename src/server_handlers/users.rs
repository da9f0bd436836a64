use actix_web::{web, HttpResponse, Responder};
use tracing::info;

use crate::api_json::{parse_course_inputs, validate_course_inputs};
use crate::eligibility::recalculate_eligibility;
use crate::error::{EligibilityError, Result};
use crate::models::EligibilityReport;
use crate::server::AppState;
use crate::server_handlers::{blocking_error_response, error_response};
use crate::store::{open_store, AdvisingWriter, EligibilitySource};

/// PUT /users/{user_id}/courses
///
/// Reemplaza los ramos del usuario y recalcula. La validación ocurre antes de
/// abrir la base: un cuerpo inválido no modifica nada.
pub async fn replace_courses_handler(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: String,
) -> impl Responder {
    let user_id = path.into_inner();
    let inputs = match parse_course_inputs(&body) {
        Ok(v) => v,
        Err(e) => return error_response(&e),
    };
    let courses = match validate_course_inputs(&inputs) {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };

    let url = state.database_url.clone();
    let result = web::block(move || -> Result<EligibilityReport> {
        let mut store = open_store(&url)?;
        // una nota inválida ya guardada no impide reemplazar los ramos
        match store.fetch_user_data(user_id) {
            Ok(Some(_)) | Err(EligibilityError::InvalidGrade(_)) => {}
            Ok(None) => return Err(EligibilityError::UserNotFound(user_id)),
            Err(e) => return Err(e),
        }
        store.replace_user_courses(user_id, &courses)?;
        info!(user_id, courses = courses.len(), "user courses replaced");
        recalculate_eligibility(&mut store, user_id)
    })
    .await;

    match result {
        Ok(Ok(report)) => HttpResponse::Ok().json(report),
        Ok(Err(e)) => error_response(&e),
        Err(e) => blocking_error_response(e),
    }
}
