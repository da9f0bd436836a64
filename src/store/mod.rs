// Acceso al warehouse de advising: SQLite local o Postgres remoto,
// elegido por el esquema de la URL.

pub mod postgres;
pub mod schema;
pub mod sqlite;

use std::collections::{BTreeMap, BTreeSet};

use crate::config::{resolve_database_url, DatabaseTarget};
use crate::error::Result;
use crate::models::{
    EligibilityRow, ProgramDefinition, ProgramRequirements, RequiredCourse, UserCourse, UserData, UserProfile,
};

pub use self::postgres::PostgresStore;
pub use self::sqlite::SqliteStore;

/// Lecturas que necesita un recálculo.
pub trait EligibilitySource {
    /// `None` si el programa no existe.
    fn fetch_program_requirements(&mut self, program_id: &str) -> Result<Option<ProgramRequirements>>;
    /// Ramos core en orden de definición, con créditos del catálogo.
    fn fetch_core_requirements(&mut self, program_id: &str) -> Result<Vec<RequiredCourse>>;
    fn fetch_core_option_courses(&mut self, program_id: &str) -> Result<Vec<RequiredCourse>>;
    fn fetch_subject_area_requirements(&mut self, program_id: &str) -> Result<BTreeMap<String, f64>>;
    fn fetch_elective_courses(&mut self, program_id: &str) -> Result<BTreeSet<String>>;
    /// Texto libre de prerequisitos; `None` si el ramo no tiene o no está en el catálogo.
    fn fetch_prerequisites(&mut self, course_code: &str) -> Result<Option<String>>;
    /// `None` si el usuario no tiene perfil.
    fn fetch_user_data(&mut self, user_id: i64) -> Result<Option<UserData>>;
}

/// Escritura (y lectura) del resultado de elegibilidad.
pub trait EligibilitySink {
    /// Reemplaza todas las filas del usuario en una transacción.
    fn replace_user_eligibility(&mut self, user_id: i64, rows: &[EligibilityRow]) -> Result<()>;
    /// Filas guardadas, en orden de emisión.
    fn fetch_user_eligibility(&mut self, user_id: i64) -> Result<Vec<EligibilityRow>>;
}

/// Carga de datos: esquema, programas, perfiles y ramos del usuario.
pub trait AdvisingWriter {
    fn init_schema(&mut self) -> Result<()>;
    fn import_program(&mut self, program: &ProgramDefinition) -> Result<()>;
    fn upsert_user_profile(&mut self, profile: &UserProfile) -> Result<()>;
    fn replace_user_courses(&mut self, user_id: i64, courses: &[UserCourse]) -> Result<()>;
}

#[derive(Debug)]
pub enum AdvisingStore {
    Sqlite(SqliteStore),
    Postgres(PostgresStore),
}

/// Abre el store indicado por `url` (sqlite://, file://, postgres://, ruta o `:memory:`).
pub fn open_store(url: &str) -> Result<AdvisingStore> {
    match resolve_database_url(url)? {
        DatabaseTarget::SqliteMemory => Ok(AdvisingStore::Sqlite(SqliteStore::open_in_memory()?)),
        DatabaseTarget::SqliteFile(path) => Ok(AdvisingStore::Sqlite(SqliteStore::open(path)?)),
        DatabaseTarget::Postgres(url) => Ok(AdvisingStore::Postgres(PostgresStore::connect(&url)?)),
    }
}

macro_rules! dispatch {
    ($self:ident, $s:ident => $call:expr) => {
        match $self {
            AdvisingStore::Sqlite($s) => $call,
            AdvisingStore::Postgres($s) => $call,
        }
    };
}

impl EligibilitySource for AdvisingStore {
    fn fetch_program_requirements(&mut self, program_id: &str) -> Result<Option<ProgramRequirements>> {
        dispatch!(self, s => s.fetch_program_requirements(program_id))
    }

    fn fetch_core_requirements(&mut self, program_id: &str) -> Result<Vec<RequiredCourse>> {
        dispatch!(self, s => s.fetch_core_requirements(program_id))
    }

    fn fetch_core_option_courses(&mut self, program_id: &str) -> Result<Vec<RequiredCourse>> {
        dispatch!(self, s => s.fetch_core_option_courses(program_id))
    }

    fn fetch_subject_area_requirements(&mut self, program_id: &str) -> Result<BTreeMap<String, f64>> {
        dispatch!(self, s => s.fetch_subject_area_requirements(program_id))
    }

    fn fetch_elective_courses(&mut self, program_id: &str) -> Result<BTreeSet<String>> {
        dispatch!(self, s => s.fetch_elective_courses(program_id))
    }

    fn fetch_prerequisites(&mut self, course_code: &str) -> Result<Option<String>> {
        dispatch!(self, s => s.fetch_prerequisites(course_code))
    }

    fn fetch_user_data(&mut self, user_id: i64) -> Result<Option<UserData>> {
        dispatch!(self, s => s.fetch_user_data(user_id))
    }
}

impl EligibilitySink for AdvisingStore {
    fn replace_user_eligibility(&mut self, user_id: i64, rows: &[EligibilityRow]) -> Result<()> {
        dispatch!(self, s => s.replace_user_eligibility(user_id, rows))
    }

    fn fetch_user_eligibility(&mut self, user_id: i64) -> Result<Vec<EligibilityRow>> {
        dispatch!(self, s => s.fetch_user_eligibility(user_id))
    }
}

impl AdvisingWriter for AdvisingStore {
    fn init_schema(&mut self) -> Result<()> {
        dispatch!(self, s => s.init_schema())
    }

    fn import_program(&mut self, program: &ProgramDefinition) -> Result<()> {
        dispatch!(self, s => s.import_program(program))
    }

    fn upsert_user_profile(&mut self, profile: &UserProfile) -> Result<()> {
        dispatch!(self, s => s.upsert_user_profile(profile))
    }

    fn replace_user_courses(&mut self, user_id: i64, courses: &[UserCourse]) -> Result<()> {
        dispatch!(self, s => s.replace_user_courses(user_id, courses))
    }
}
