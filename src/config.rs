// Configuración desde el entorno (.env incluido).

use std::env;
use std::path::PathBuf;

use crate::error::{EligibilityError, Result};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/gradcheck.db";
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub bind: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings { database_url: DEFAULT_DATABASE_URL.to_string(), bind: DEFAULT_BIND.to_string() }
    }
}

impl Settings {
    /// Lee `GRADCHECK_DB_URL` y `GRADCHECK_BIND`, cargando `.env` si existe.
    pub fn from_env() -> Result<Self> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        if let Some(url) = lookup("GRADCHECK_DB_URL").filter(|v| !v.trim().is_empty()) {
            settings.database_url = url.trim().to_string();
        }
        if let Some(bind) = lookup("GRADCHECK_BIND").filter(|v| !v.trim().is_empty()) {
            settings.bind = bind.trim().to_string();
        }
        // falla temprano si la URL no es usable
        resolve_database_url(&settings.database_url)?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    SqliteMemory,
    SqliteFile(PathBuf),
    Postgres(String),
}

/// Interpreta la URL de base de datos. Sin esquema se asume una ruta SQLite.
pub fn resolve_database_url(url: &str) -> Result<DatabaseTarget> {
    let url = url.trim();
    if url.is_empty() {
        return Err(EligibilityError::Config("empty database url".into()));
    }
    if url == ":memory:" || url == "sqlite://:memory:" {
        return Ok(DatabaseTarget::SqliteMemory);
    }
    if let Some(path) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("file://")) {
        if path.is_empty() {
            return Err(EligibilityError::Config(format!("missing sqlite path in {}", url)));
        }
        return Ok(DatabaseTarget::SqliteFile(PathBuf::from(path)));
    }
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        return Ok(DatabaseTarget::Postgres(url.to_string()));
    }
    if url.contains("://") {
        return Err(EligibilityError::Config(format!("unsupported database url scheme: {}", url)));
    }
    Ok(DatabaseTarget::SqliteFile(PathBuf::from(url)))
}
