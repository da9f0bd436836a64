// Orquestación de un recálculo: leer snapshot, evaluar, reemplazar filas.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{info, warn};

use crate::algorithm::evaluate;
use crate::error::{EligibilityError, Result};
use crate::models::{EligibilityReport, ProgramSnapshot, RequirementLists};
use crate::store::{EligibilitySink, EligibilitySource};

/// Lee todo lo que necesita el motor. Los chequeos fatales (usuario,
/// programa, notas inválidas) ocurren aquí, antes de tocar las filas guardadas.
pub fn load_snapshot<S: EligibilitySource + ?Sized>(store: &mut S, user_id: i64) -> Result<ProgramSnapshot> {
    let user = store.fetch_user_data(user_id)?.ok_or(EligibilityError::UserNotFound(user_id))?;
    let requirements = store
        .fetch_program_requirements(&user.program_id)?
        .ok_or_else(|| EligibilityError::ProgramNotFound(user.program_id.clone()))?;

    let program_id = requirements.program_id.as_str();
    let lists = RequirementLists {
        core: store.fetch_core_requirements(program_id)?,
        core_options: store.fetch_core_option_courses(program_id)?,
        subject_areas: store.fetch_subject_area_requirements(program_id)?,
        elective_subjects: store.fetch_elective_courses(program_id)?,
    };

    let mut prerequisites = BTreeMap::new();
    for course in lists.core.iter().chain(lists.core_options.iter()) {
        if prerequisites.contains_key(&course.course_code) {
            continue;
        }
        let text = store.fetch_prerequisites(&course.course_code)?;
        prerequisites.insert(course.course_code.clone(), text);
    }

    Ok(ProgramSnapshot { user, requirements, lists, prerequisites })
}

/// Recalcula y reemplaza la elegibilidad del usuario. Si falla antes de la
/// escritura, las filas anteriores quedan intactas.
pub fn recalculate_eligibility<S>(store: &mut S, user_id: i64) -> Result<EligibilityReport>
where
    S: EligibilitySource + EligibilitySink + ?Sized,
{
    let start = Instant::now();
    let snapshot = load_snapshot(store, user_id)?;
    let report = evaluate(&snapshot)?;

    if !report.skipped.is_empty() {
        warn!(
            user_id,
            skipped = report.skipped.len(),
            items = ?report.skipped.iter().map(|s| s.course_code.as_str()).collect::<Vec<_>>(),
            "recalculation finished with skipped items"
        );
    }

    store.replace_user_eligibility(user_id, &report.rows)?;
    info!(
        user_id,
        program = %report.program_id,
        rows = report.rows.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "eligibility rows replaced"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::algorithm::grades::Grade;
    use crate::models::{EligibilityRow, ProgramRequirements, RequiredCourse, UserCourse, UserData};

    /// Store en memoria para probar la orquestación sin base de datos.
    #[derive(Default)]
    struct FakeStore {
        user: Option<UserData>,
        program: Option<ProgramRequirements>,
        rows: Vec<EligibilityRow>,
        writes: usize,
    }

    impl EligibilitySource for FakeStore {
        fn fetch_program_requirements(&mut self, _: &str) -> Result<Option<ProgramRequirements>> {
            Ok(self.program.clone())
        }
        fn fetch_core_requirements(&mut self, _: &str) -> Result<Vec<RequiredCourse>> {
            Ok(vec![RequiredCourse { course_code: "INFO 5100".into(), credits: 4.0 }])
        }
        fn fetch_core_option_courses(&mut self, _: &str) -> Result<Vec<RequiredCourse>> {
            Ok(Vec::new())
        }
        fn fetch_subject_area_requirements(&mut self, _: &str) -> Result<BTreeMap<String, f64>> {
            Ok(BTreeMap::new())
        }
        fn fetch_elective_courses(&mut self, _: &str) -> Result<BTreeSet<String>> {
            Ok(BTreeSet::new())
        }
        fn fetch_prerequisites(&mut self, _: &str) -> Result<Option<String>> {
            Ok(None)
        }
        fn fetch_user_data(&mut self, user_id: i64) -> Result<Option<UserData>> {
            Ok(self.user.clone().filter(|u| u.user_id == user_id))
        }
    }

    impl EligibilitySink for FakeStore {
        fn replace_user_eligibility(&mut self, _: i64, rows: &[EligibilityRow]) -> Result<()> {
            self.rows = rows.to_vec();
            self.writes += 1;
            Ok(())
        }
        fn fetch_user_eligibility(&mut self, _: i64) -> Result<Vec<EligibilityRow>> {
            Ok(self.rows.clone())
        }
    }

    fn program() -> ProgramRequirements {
        ProgramRequirements {
            program_id: "MP_IS_MSIS".into(),
            program_name: None,
            max_credit_hours: 32.0,
            min_gpa: 3.0,
            core_credit_req: 4.0,
            core_options_credit_req: 0.0,
            elective_credit_req: 0.0,
            subject_credit_req: 0.0,
            elective_exceptions: Vec::new(),
        }
    }

    fn user() -> UserData {
        UserData {
            user_id: 7,
            program_id: "MP_IS_MSIS".into(),
            gpa: 3.5,
            completed_courses: vec![UserCourse {
                course_code: "INFO 5100".into(),
                course_name: None,
                grade: Grade::A,
                credits: 4.0,
            }],
        }
    }

    #[test]
    fn test_missing_user_writes_nothing() {
        let mut store = FakeStore { program: Some(program()), ..Default::default() };
        let err = recalculate_eligibility(&mut store, 999).unwrap_err();
        assert!(matches!(err, EligibilityError::UserNotFound(999)));
        assert_eq!(store.writes, 0);
    }

    #[test]
    fn test_missing_program_writes_nothing() {
        let mut store = FakeStore { user: Some(user()), ..Default::default() };
        let err = recalculate_eligibility(&mut store, 7).unwrap_err();
        assert!(matches!(err, EligibilityError::ProgramNotFound(ref p) if p == "MP_IS_MSIS"));
        assert_eq!(store.writes, 0);
    }

    #[test]
    fn test_recalculate_writes_rows_once() {
        let mut store = FakeStore { user: Some(user()), program: Some(program()), ..Default::default() };
        let report = recalculate_eligibility(&mut store, 7).unwrap();
        assert_eq!(store.writes, 1);
        assert_eq!(store.rows, report.rows);
        assert!(report.core.is_satisfied());
        assert!(report.meets_min_gpa);
    }
}
