use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::algorithm::grades::Grade;
use crate::error::{EligibilityError, Result};
use crate::models::{ProgramDefinition, UserCourse};

/// Créditos admitidos para un ramo registrado por el usuario.
pub const ALLOWED_CREDITS: [f64; 5] = [0.0, 1.0, 2.0, 3.0, 4.0];

/// Ramo enviado por el cliente en `PUT /users/{id}/courses`.
///
/// # JSON esperado:
/// ```json
/// [
///   {"course_code": "INFO 5100", "course_name": "Application Engineering", "grade": "A-", "credits": 4},
///   {"course_code": "CSYE 7200", "grade": "IP (In Progress)", "credits": 4}
/// ]
/// ```
///
/// `grade` acepta el vocabulario completo del comparador (A+ … F, S, `IP` o
/// `IP (In Progress)`); `credits` debe ser 0, 1, 2, 3 o 4.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseInput {
    pub course_code: String,
    #[serde(default)]
    pub course_name: Option<String>,
    pub grade: String,
    pub credits: f64,
}

/// Formato "SUBJ NNNN" (p.ej. "INFO 5100").
pub fn is_valid_course_code(code: &str) -> bool {
    static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{4} \d{4}$").expect("valid regex"));
    CODE_RE.is_match(code)
}

/// Parsea el cuerpo JSON (lista de ramos) sin validar.
pub fn parse_course_inputs(json_str: &str) -> Result<Vec<CourseInput>> {
    Ok(serde_json::from_str(json_str)?)
}

/// Valida y convierte la entrada del cliente. Se reportan todos los
/// problemas juntos para que el formulario pueda mostrarlos de una vez.
pub fn validate_course_inputs(inputs: &[CourseInput]) -> Result<Vec<UserCourse>> {
    let mut problems: Vec<String> = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut out = Vec::with_capacity(inputs.len());

    for (i, input) in inputs.iter().enumerate() {
        let code = input.course_code.trim().to_string();
        if !is_valid_course_code(&code) {
            problems.push(format!("[{}] invalid course code {:?} (expected e.g. \"INFO 5100\")", i, input.course_code));
        } else if !seen.insert(code.clone()) {
            problems.push(format!("[{}] duplicate course code {}", i, code));
        }

        let grade = match input.grade.parse::<Grade>() {
            Ok(g) => Some(g),
            Err(_) => {
                problems.push(format!(
                    "[{}] invalid grade {:?}, allowed: {}",
                    i,
                    input.grade,
                    Grade::vocabulary().collect::<Vec<_>>().join(", ")
                ));
                None
            }
        };

        if !ALLOWED_CREDITS.contains(&input.credits) {
            problems.push(format!("[{}] invalid credits {} (allowed 0-4)", i, input.credits));
        }

        if let Some(grade) = grade {
            out.push(UserCourse {
                course_code: code,
                course_name: input.course_name.as_ref().map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
                grade,
                credits: input.credits,
            });
        }
    }

    if problems.is_empty() {
        Ok(out)
    } else {
        Err(EligibilityError::Validation(problems.join("; ")))
    }
}

/// Lee un `ProgramDefinition` (JSON) y revisa los códigos de ramo.
pub fn parse_program_definition(json_str: &str) -> Result<ProgramDefinition> {
    let program: ProgramDefinition = serde_json::from_str(json_str)?;
    if program.requirements.program_id.trim().is_empty() {
        return Err(EligibilityError::Validation("program_id is required".into()));
    }
    let bad: Vec<&str> = program
        .catalog
        .iter()
        .map(|c| c.course_code.as_str())
        .chain(program.core.iter().map(String::as_str))
        .chain(program.core_options.iter().map(String::as_str))
        .filter(|c| !is_valid_course_code(c))
        .collect();
    if !bad.is_empty() {
        return Err(EligibilityError::Validation(format!("invalid course codes: {}", bad.join(", "))));
    }
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn input(code: &str, grade: &str, credits: f64) -> CourseInput {
        CourseInput { course_code: code.into(), course_name: None, grade: grade.into(), credits }
    }

    #[test]
    fn test_parse_and_validate_ok() {
        let parsed = parse_course_inputs(
            r#"[{"course_code": "INFO 5100", "grade": "A-", "credits": 4},
                {"course_code": "CSYE 7200", "course_name": " Big Data ", "grade": "IP", "credits": 4}]"#,
        )
        .unwrap();
        let courses = validate_course_inputs(&parsed).unwrap();
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].grade, Grade::AMinus);
        assert_eq!(courses[1].grade, Grade::InProgress);
        assert_eq!(courses[1].course_name.as_deref(), Some("Big Data"));
    }

    #[test]
    fn test_validation_collects_all_problems() {
        let err = validate_course_inputs(&[
            input("info 5100", "A", 4.0),
            input("INFO 5200", "Z", 4.0),
            input("INFO 5300", "B", 5.0),
        ])
        .unwrap_err();
        assert_matches!(err, EligibilityError::Validation(ref msg) => {
            assert!(msg.contains("invalid course code"));
            assert!(msg.contains("invalid grade \"Z\""));
            assert!(msg.contains("invalid credits 5"));
        });
    }

    #[test]
    fn test_duplicate_codes_rejected() {
        let err = validate_course_inputs(&[input("INFO 5100", "A", 4.0), input("INFO 5100", "B", 4.0)]).unwrap_err();
        assert_matches!(err, EligibilityError::Validation(ref msg) if msg.contains("duplicate"));
    }

    #[test]
    fn test_program_definition_rejects_bad_codes() {
        let json = r#"{"requirements": {"program_id": "P", "program_name": null, "max_credit_hours": 32,
            "min_gpa": 3.0, "core_credit_req": 4, "core_options_credit_req": 0, "elective_credit_req": 0,
            "subject_credit_req": 0, "elective_exceptions": []}, "core": ["INFO5100"]}"#;
        assert_matches!(parse_program_definition(json), Err(EligibilityError::Validation(_)));
    }
}
