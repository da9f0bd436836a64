// Biblioteca raíz del crate `gradcheck`.
// Motor de elegibilidad de grado, almacenamiento (SQLite / Postgres) y API HTTP.
pub mod algorithm;
pub mod api_json;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod models;
pub mod server;
pub mod server_handlers;
pub mod store;

/// Ejecuta el servidor HTTP (reexport para facilitar uso desde `main`)
pub use server::run_server;

pub use config::Settings;
pub use eligibility::{load_snapshot, recalculate_eligibility};
pub use error::{EligibilityError, Result};
