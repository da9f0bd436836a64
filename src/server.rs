use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use tracing::info;

use crate::config::Settings;
use crate::server_handlers::{
    eligibility_rows_handler, health_handler, recalculate_handler, replace_courses_handler,
};

/// Estado compartido: sólo la URL. Cada request abre su propia conexión
/// (corta) dentro del pool bloqueante.
#[derive(Debug, Clone)]
pub struct AppState {
    pub database_url: String,
}

/// Rutas de la API; separado de `run_server` para poder montarlas en tests.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_handler))
        .route("/users/{user_id}/eligibility/recalculate", web::post().to(recalculate_handler))
        .route("/users/{user_id}/eligibility", web::get().to(eligibility_rows_handler))
        .route("/users/{user_id}/courses", web::put().to(replace_courses_handler));
}

pub async fn run_server(settings: Settings) -> std::io::Result<()> {
    let state = web::Data::new(AppState { database_url: settings.database_url.clone() });
    info!(bind = %settings.bind, "starting eligibility API");

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .bind(settings.bind.as_str())?
    .run()
    .await
}
