// Extracción best-effort de prerequisitos desde el texto del catálogo.
//
// Sólo se reconoce el patrón "SUBJ NNNN" opcionalmente seguido de
// "with a minimum grade of X". No se interpretan AND/OR ni paréntesis.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::algorithm::grades::Grade;
use crate::models::UserCourse;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prerequisite {
    pub course_code: String,
    /// `None`: basta cualquier intento que no sea F ni esté en curso.
    pub min_grade: Option<Grade>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PrerequisiteCheck {
    Satisfied,
    Unmet { course_code: String, reason: String },
}

/// Devuelve los pares (ramo, nota mínima) en el orden en que aparecen.
/// Texto vacío o ausente -> lista vacía. Nunca falla.
pub fn parse_prerequisites(text: Option<&str>) -> Vec<Prerequisite> {
    let text = match text.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Vec::new(),
    };

    static PREREQ_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"([A-Z]{4} \d{4})(?: with a minimum grade of ([A-Z][+-]?))?").expect("valid regex")
    });

    let mut out = Vec::new();
    for caps in PREREQ_RE.captures_iter(text) {
        let course_code = caps[1].to_string();
        let min_grade = caps.get(2).and_then(|m| match m.as_str().parse::<Grade>() {
            Ok(g) => Some(g),
            Err(_) => {
                warn!(course = %course_code, token = m.as_str(), "unknown minimum grade in prerequisite text, ignoring it");
                None
            }
        });
        out.push(Prerequisite { course_code, min_grade });
    }

    if out.is_empty() {
        debug!(text, "no prerequisites found");
    }
    out
}

/// Verifica los prerequisitos contra los ramos del usuario. Se usa el primer
/// registro del usuario con ese código, igual que en las pasadas del motor.
pub fn check_prerequisites(user_courses: &[UserCourse], prerequisites: &[Prerequisite]) -> PrerequisiteCheck {
    for prereq in prerequisites {
        let code = &prereq.course_code;
        let Some(taken) = user_courses.iter().find(|c| &c.course_code == code) else {
            let reason = match prereq.min_grade {
                Some(min) => format!("Missing prerequisite: {} with a minimum grade of {}.", code, min),
                None => format!("Missing prerequisite: {}.", code),
            };
            return PrerequisiteCheck::Unmet { course_code: code.clone(), reason };
        };

        let passed = match prereq.min_grade {
            Some(min) => taken.grade.meets(min),
            None => !taken.grade.is_failing() && !taken.grade.is_in_progress(),
        };
        if !passed {
            let reason = match prereq.min_grade {
                Some(min) => format!(
                    "Prerequisite {} requires a minimum grade of {}. User achieved {}.",
                    code, min, taken.grade
                ),
                None => format!("Prerequisite {} not passed yet. User has {}.", code, taken.grade),
            };
            return PrerequisiteCheck::Unmet { course_code: code.clone(), reason };
        }
    }
    PrerequisiteCheck::Satisfied
}

/// Lista legible: "CSYE 6200 (minimum grade B-), INFO 5100".
pub fn describe_prerequisites(prerequisites: &[Prerequisite]) -> String {
    prerequisites
        .iter()
        .map(|p| match p.min_grade {
            Some(g) => format!("{} (minimum grade {})", p.course_code, g),
            None => p.course_code.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
