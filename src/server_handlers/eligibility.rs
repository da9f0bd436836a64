use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::eligibility::recalculate_eligibility;
use crate::error::Result;
use crate::models::{EligibilityReport, EligibilityRow};
use crate::server::AppState;
use crate::server_handlers::{blocking_error_response, error_response};
use crate::store::{open_store, EligibilitySink};

/// POST /users/{user_id}/eligibility/recalculate
///
/// Recalcula y devuelve el reporte completo (filas + totales).
pub async fn recalculate_handler(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    let user_id = path.into_inner();
    let url = state.database_url.clone();
    let result = web::block(move || -> Result<EligibilityReport> {
        let mut store = open_store(&url)?;
        recalculate_eligibility(&mut store, user_id)
    })
    .await;

    match result {
        Ok(Ok(report)) => HttpResponse::Ok().json(report),
        Ok(Err(e)) => error_response(&e),
        Err(e) => blocking_error_response(e),
    }
}

/// GET /users/{user_id}/eligibility
///
/// Filas guardadas del último recálculo, en orden de emisión.
pub async fn eligibility_rows_handler(state: web::Data<AppState>, path: web::Path<i64>) -> impl Responder {
    let user_id = path.into_inner();
    let url = state.database_url.clone();
    let result = web::block(move || -> Result<Vec<EligibilityRow>> {
        let mut store = open_store(&url)?;
        store.fetch_user_eligibility(user_id)
    })
    .await;

    match result {
        Ok(Ok(rows)) => HttpResponse::Ok().json(json!({"user_id": user_id, "rows": rows})),
        Ok(Err(e)) => error_response(&e),
        Err(e) => blocking_error_response(e),
    }
}
