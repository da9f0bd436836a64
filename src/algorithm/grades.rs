// Comparación de notas según la precedencia académica.
//
// Orden total de mejor a peor: A+, A, A-, B+, B, B-, C+, C, C-, D+, D, D-,
// F, S (satisfactorio), IP (en curso). IP queda al final porque un ramo en
// curso todavía no satisface ninguna nota mínima.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EligibilityError, Result};

/// Token con el que se guarda un ramo en curso en `USER_COURSES`.
pub const IN_PROGRESS_TOKEN: &str = "IP (In Progress)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Grade {
    APlus,
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    DPlus,
    D,
    DMinus,
    F,
    S,
    InProgress,
}

/// Tabla de precedencia: (nota, token). La posición + 1 es el rango.
const PRECEDENCE: [(Grade, &str); 15] = [
    (Grade::APlus, "A+"),
    (Grade::A, "A"),
    (Grade::AMinus, "A-"),
    (Grade::BPlus, "B+"),
    (Grade::B, "B"),
    (Grade::BMinus, "B-"),
    (Grade::CPlus, "C+"),
    (Grade::C, "C"),
    (Grade::CMinus, "C-"),
    (Grade::DPlus, "D+"),
    (Grade::D, "D"),
    (Grade::DMinus, "D-"),
    (Grade::F, "F"),
    (Grade::S, "S"),
    (Grade::InProgress, IN_PROGRESS_TOKEN),
];

impl Grade {
    /// Rango 1..=15; un número menor es una nota mejor.
    pub fn rank(self) -> u8 {
        PRECEDENCE
            .iter()
            .position(|(g, _)| *g == self)
            .map(|p| p as u8 + 1)
            .unwrap_or(u8::MAX)
    }

    pub fn token(self) -> &'static str {
        PRECEDENCE
            .iter()
            .find(|(g, _)| *g == self)
            .map(|(_, t)| *t)
            .unwrap_or("?")
    }

    /// `true` si esta nota cumple (iguala o supera) la nota mínima.
    pub fn meets(self, min_grade: Grade) -> bool {
        self.rank() <= min_grade.rank()
    }

    pub fn is_failing(self) -> bool {
        self == Grade::F
    }

    pub fn is_in_progress(self) -> bool {
        self == Grade::InProgress
    }

    /// Todos los tokens aceptados, en orden de precedencia.
    pub fn vocabulary() -> impl Iterator<Item = &'static str> {
        PRECEDENCE.iter().map(|(_, t)| *t)
    }
}

impl FromStr for Grade {
    type Err = EligibilityError;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim();
        if token == "IP" {
            return Ok(Grade::InProgress);
        }
        PRECEDENCE
            .iter()
            .find(|(_, t)| *t == token)
            .map(|(g, _)| *g)
            .ok_or_else(|| EligibilityError::InvalidGrade(s.to_string()))
    }
}

impl TryFrom<String> for Grade {
    type Error = EligibilityError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Grade> for String {
    fn from(g: Grade) -> Self {
        g.token().to_string()
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

// Una nota "mayor" es una nota mejor: A+ > A > ... > F > S > IP.
impl Ord for Grade {
    fn cmp(&self, other: &Self) -> Ordering {
        other.rank().cmp(&self.rank())
    }
}

impl PartialOrd for Grade {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compara dos tokens de nota. Cualquier token desconocido (de cualquier lado)
/// es un error de entrada fatal.
pub fn meets(user_grade: &str, min_grade: &str) -> Result<bool> {
    let user: Grade = user_grade.parse()?;
    let min: Grade = min_grade.parse()?;
    Ok(user.meets(min))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_meets_examples() {
        assert!(meets("B+", "B").unwrap());
        assert!(!meets("B-", "B").unwrap());
        assert!(!meets("IP", "C").unwrap());
        assert!(meets("B", "B").unwrap());
        assert!(meets("A+", "D-").unwrap());
    }

    #[test]
    fn test_unknown_token_is_error() {
        assert_matches!(meets("E", "B"), Err(EligibilityError::InvalidGrade(t)) if t == "E");
        assert_matches!(meets("A", "Z+"), Err(EligibilityError::InvalidGrade(_)));
        assert_matches!(meets("", "A"), Err(EligibilityError::InvalidGrade(_)));
    }

    #[test]
    fn test_total_order() {
        let grades: Vec<Grade> = PRECEDENCE.iter().map(|(g, _)| *g).collect();
        for pair in grades.windows(2) {
            assert!(pair[0] > pair[1], "{} debe ser mejor que {}", pair[0], pair[1]);
        }
        assert!(Grade::F > Grade::S);
        assert!(Grade::S > Grade::InProgress);
    }

    #[test]
    fn test_in_progress_aliases() {
        assert_eq!("IP".parse::<Grade>().unwrap(), Grade::InProgress);
        assert_eq!(IN_PROGRESS_TOKEN.parse::<Grade>().unwrap(), Grade::InProgress);
        assert_eq!(Grade::InProgress.to_string(), IN_PROGRESS_TOKEN);
        assert_eq!(" B- ".parse::<Grade>().unwrap(), Grade::BMinus);
    }

    #[test]
    fn test_serde_as_token() {
        let json = serde_json::to_string(&Grade::AMinus).unwrap();
        assert_eq!(json, "\"A-\"");
        let g: Grade = serde_json::from_str("\"C+\"").unwrap();
        assert_eq!(g, Grade::CPlus);
        assert!(serde_json::from_str::<Grade>("\"Q\"").is_err());
    }
}
