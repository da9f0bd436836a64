// Registro explícito de qué categoría "reclamó" cada ramo durante las pasadas.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::{EligibilityError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Core,
    CoreOption,
    SubjectArea,
    ProgramElective,
}

impl Category {
    /// Etiqueta que se incrusta al final de la explicación de cada fila.
    pub fn tag(self) -> &'static str {
        match self {
            Category::Core => "(Category: Core Requirement)",
            Category::CoreOption => "(Category: Core Options)",
            Category::SubjectArea => "(Category: Subject area)",
            Category::ProgramElective => "(Category: Program elective)",
        }
    }
}

/// Etiqueta de la segunda (y última) aparición de un ramo core-option
/// reclasificado como electivo.
pub const RECLASSIFIED_TAG: &str = "(Core option course counted as elective)";

/// Mapa ramo -> categoría primaria, más la cola de ramos core-option que
/// deben contarse una vez más como electivo en la pasada 3.
#[derive(Debug, Clone, Default)]
pub struct CourseClassification {
    assigned: BTreeMap<String, Category>,
    as_electives: BTreeSet<String>,
}

impl CourseClassification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asigna la categoría si el ramo no tenía una. Devuelve `false` si ya
    /// estaba clasificado (la primera categoría se mantiene).
    pub fn claim(&mut self, course_code: &str, category: Category) -> bool {
        if self.assigned.contains_key(course_code) {
            return false;
        }
        self.assigned.insert(course_code.to_string(), category);
        true
    }

    pub fn is_classified(&self, course_code: &str) -> bool {
        self.assigned.contains_key(course_code)
    }

    pub fn queue_as_elective(&mut self, course_code: &str) {
        self.as_electives.insert(course_code.to_string());
    }

    pub fn is_queued_as_elective(&self, course_code: &str) -> bool {
        self.as_electives.contains(course_code)
    }

    /// Saca el ramo de la cola; sólo la primera llamada devuelve `true`.
    pub fn take_queued_elective(&mut self, course_code: &str) -> bool {
        self.as_electives.remove(course_code)
    }
}

/// Prefijo de asignatura ("INFO" en "INFO 5100").
pub fn subject_code(course_code: &str) -> Result<&str> {
    match course_code.get(..4) {
        Some(prefix) if prefix.chars().all(|c| c.is_ascii_alphabetic()) => Ok(prefix),
        _ => Err(EligibilityError::MalformedCourseCode(course_code.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_keeps_first_category() {
        let mut c = CourseClassification::new();
        assert!(c.claim("INFO 5100", Category::Core));
        assert!(!c.claim("INFO 5100", Category::CoreOption));
        assert!(c.is_classified("INFO 5100"));
        assert!(!c.is_classified("INFO 6150"));
    }

    #[test]
    fn test_queue_taken_once() {
        let mut c = CourseClassification::new();
        c.claim("CSYE 7200", Category::CoreOption);
        c.queue_as_elective("CSYE 7200");
        assert!(c.is_queued_as_elective("CSYE 7200"));
        assert!(c.take_queued_elective("CSYE 7200"));
        assert!(!c.take_queued_elective("CSYE 7200"));
        assert!(c.is_classified("CSYE 7200"));
    }

    #[test]
    fn test_subject_code() {
        assert_eq!(subject_code("INFO 5100").unwrap(), "INFO");
        assert!(subject_code("CS").is_err());
        assert!(subject_code("12 3456").is_err());
        assert!(subject_code("ÑAND 1000").is_err());
    }
}
