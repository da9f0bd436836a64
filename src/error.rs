// Errores del cálculo de elegibilidad.
//
// Los errores "fatales" abortan el recálculo completo antes de escribir nada;
// el resto se registra por curso y el curso se omite del resultado.

/// Error principal del crate.
#[derive(Debug, thiserror::Error)]
pub enum EligibilityError {
    #[error("no user profile found for user_id: {0}")]
    UserNotFound(i64),

    #[error("no program requirements found for program_id: {0}")]
    ProgramNotFound(String),

    #[error("invalid grade encountered: {0:?}")]
    InvalidGrade(String),

    #[error("malformed course code: {0:?}")]
    MalformedCourseCode(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EligibilityError>;

impl EligibilityError {
    /// `true` cuando el error debe abortar el recálculo completo.
    /// Sólo un código de curso mal formado es recuperable dentro de una pasada.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, EligibilityError::MalformedCourseCode(_))
    }
}

impl From<rusqlite::Error> for EligibilityError {
    fn from(e: rusqlite::Error) -> Self {
        EligibilityError::Storage(e.to_string())
    }
}

impl From<postgres::Error> for EligibilityError {
    fn from(e: postgres::Error) -> Self {
        EligibilityError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for EligibilityError {
    fn from(e: serde_json::Error) -> Self {
        EligibilityError::Validation(e.to_string())
    }
}

impl From<std::io::Error> for EligibilityError {
    fn from(e: std::io::Error) -> Self {
        EligibilityError::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(EligibilityError::UserNotFound(999).is_fatal());
        assert!(EligibilityError::InvalidGrade("Z".into()).is_fatal());
        assert!(!EligibilityError::MalformedCourseCode("CS".into()).is_fatal());
    }

    #[test]
    fn test_display() {
        let e = EligibilityError::UserNotFound(999);
        assert_eq!(e.to_string(), "no user profile found for user_id: 999");
    }
}
