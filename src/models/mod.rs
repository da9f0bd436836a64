// Estructuras de datos principales

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::algorithm::grades::Grade;
use crate::error::{EligibilityError, Result};

/// Umbrales de un programa (fila de `PROGRAM_REQUIREMENTS`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramRequirements {
    pub program_id: String,
    pub program_name: Option<String>,
    pub max_credit_hours: f64,
    pub min_gpa: f64,
    pub core_credit_req: f64,
    pub core_options_credit_req: f64,
    pub elective_credit_req: f64,
    pub subject_credit_req: f64,
    /// Excepciones de electivos en texto libre. Sólo se informan en el
    /// resumen de ELECTIVES; no se descuentan de los créditos.
    pub elective_exceptions: Vec<String>,
}

impl ProgramRequirements {
    /// Separa la columna `ELECTIVE_EXCEPTION` (valores separados por comas).
    pub fn parse_exceptions(raw: Option<&str>) -> Vec<String> {
        raw.map(|s| {
            s.split(',')
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
    }
}

/// Ramo del catálogo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub course_code: String,
    pub course_name: Option<String>,
    pub prerequisites: Option<String>,
    pub credits: f64,
}

/// Ramo exigido por un programa, con los créditos del catálogo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredCourse {
    pub course_code: String,
    pub credits: f64,
}

/// Definición estructural del programa.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementLists {
    pub core: Vec<RequiredCourse>,
    pub core_options: Vec<RequiredCourse>,
    /// subject code -> créditos mínimos
    pub subject_areas: BTreeMap<String, f64>,
    /// subject codes que cuentan como electivo general
    pub elective_subjects: BTreeSet<String>,
}

/// Programa completo tal como se importa desde JSON (`gradcheck import-program`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramDefinition {
    pub requirements: ProgramRequirements,
    #[serde(default)]
    pub catalog: Vec<CourseRecord>,
    #[serde(default)]
    pub core: Vec<String>,
    #[serde(default)]
    pub core_options: Vec<String>,
    #[serde(default)]
    pub subject_areas: BTreeMap<String, f64>,
    #[serde(default)]
    pub elective_subjects: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub gpa: Option<f64>,
    pub program_id: Option<String>,
}

/// Ramo cursado (o en curso) por el usuario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCourse {
    pub course_code: String,
    #[serde(default)]
    pub course_name: Option<String>,
    pub grade: Grade,
    /// Créditos registrados para el usuario; pueden diferir del catálogo.
    pub credits: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub user_id: i64,
    pub program_id: String,
    pub gpa: f64,
    pub completed_courses: Vec<UserCourse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EligibilityStatus {
    Calculated,
    Pending,
}

impl EligibilityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EligibilityStatus::Calculated => "CALCULATED",
            EligibilityStatus::Pending => "PENDING",
        }
    }
}

impl fmt::Display for EligibilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EligibilityStatus {
    type Err = EligibilityError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CALCULATED" => Ok(EligibilityStatus::Calculated),
            "PENDING" => Ok(EligibilityStatus::Pending),
            other => Err(EligibilityError::Storage(format!("unknown eligibility status: {}", other))),
        }
    }
}

/// Fila de salida (`USER_ELIGIBILITY`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityRow {
    pub user_id: i64,
    /// Código de ramo o de categoría agregada (`ELECTIVES`, `SUBJECT_AREA_INFO`).
    pub code: String,
    /// `true` si el estudiante todavía tiene que hacer algo con este ramo/categoría.
    pub actionable: bool,
    pub explanation: String,
    pub status: EligibilityStatus,
}

/// Todo lo que necesita el motor para un recálculo, leído una sola vez.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramSnapshot {
    pub user: UserData,
    pub requirements: ProgramRequirements,
    pub lists: RequirementLists,
    /// Texto de prerequisitos del catálogo para ramos core y core-option.
    pub prerequisites: BTreeMap<String, Option<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CreditTally {
    pub completed: f64,
    pub required: f64,
}

impl CreditTally {
    pub fn is_satisfied(&self) -> bool {
        self.completed >= self.required
    }
}

/// Ramo omitido por un error recuperable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedItem {
    pub course_code: String,
    pub reason: String,
}

/// Resultado completo de un recálculo: filas + totales informativos.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EligibilityReport {
    pub user_id: i64,
    pub program_id: String,
    pub gpa: f64,
    pub meets_min_gpa: bool,
    pub rows: Vec<EligibilityRow>,
    pub core: CreditTally,
    pub core_options: CreditTally,
    pub electives: CreditTally,
    pub elective_credits_by_subject: BTreeMap<String, f64>,
    pub subject_areas: BTreeMap<String, CreditTally>,
    pub total_counted_credits: f64,
    pub max_credit_hours: f64,
    pub skipped: Vec<SkippedItem>,
}
