mod common;

use std::collections::BTreeMap;

use assert_matches::assert_matches;
use gradcheck::algorithm::classification::{Category, RECLASSIFIED_TAG};
use gradcheck::algorithm::{ELECTIVES_CODE, SUBJECT_AREA_PREFIX};
use gradcheck::models::{EligibilityRow, EligibilityStatus};
use gradcheck::store::{AdvisingWriter, EligibilitySink, EligibilitySource};
use gradcheck::{recalculate_eligibility, EligibilityError};

use common::{msis_program, seeded_memory_store, PROGRAM_ID, USER_ID};

fn rows_for<'a>(rows: &'a [EligibilityRow], code: &str) -> Vec<&'a EligibilityRow> {
    rows.iter().filter(|r| r.code == code).collect()
}

#[test]
fn test_full_recalculation_scenario() {
    let mut store = seeded_memory_store();
    let report = recalculate_eligibility(&mut store, USER_ID).unwrap();

    assert_eq!(report.rows.len(), 11);
    assert_eq!(report.core.completed, 8.0);
    assert_eq!(report.core_options.completed, 4.0);
    assert_eq!(report.electives.completed, 6.0);
    assert_eq!(report.subject_areas["INFO"].completed, 2.0);
    assert!(report.meets_min_gpa);
    assert!(report.skipped.is_empty());

    let in_progress = rows_for(&report.rows, "INFO 6150");
    assert_eq!(in_progress.len(), 1);
    assert_eq!(in_progress[0].status, EligibilityStatus::Pending);

    // DAMG no es electiva: requisito cubierto pero el ramo sigue pendiente
    let damg = rows_for(&report.rows, "DAMG 7250");
    assert_eq!(damg.len(), 1);
    assert!(damg[0].actionable);

    let failed = rows_for(&report.rows, "TELE 5330");
    assert_eq!(failed.len(), 1);
    assert!(failed[0].actionable);
    assert!(failed[0].explanation.starts_with("Failed with grade 'F'."));

    let electives = rows_for(&report.rows, ELECTIVES_CODE);
    assert_eq!(electives.len(), 1);
    assert!(electives[0].actionable);
    assert_eq!(
        electives[0].explanation,
        "6/8 credits completed for elective, courses: (CSYE 7245, INFO 6105), \
         electives are subject codes (CSYE, INFO, TELE), exceptions are (INFO 6105, CSYE 7374)"
    );

    let area = rows_for(&report.rows, &format!("{}INFO", SUBJECT_AREA_PREFIX));
    assert!(!area[0].actionable);
}

#[test]
fn test_core_and_core_option_partition() {
    let mut store = seeded_memory_store();
    let report = recalculate_eligibility(&mut store, USER_ID).unwrap();
    let program = msis_program();

    for code in program.core.iter().chain(program.core_options.iter()) {
        let rows = rows_for(&report.rows, code);
        let primary: Vec<&str> = [Category::Core, Category::CoreOption]
            .iter()
            .map(|c| c.tag())
            .filter(|tag| rows.iter().any(|r| r.explanation.ends_with(tag)))
            .collect();
        assert_eq!(primary.len(), 1, "{} must have exactly one primary category", code);

        // nunca reaparece como subject area o electivo normal
        assert!(rows.iter().all(|r| !r.explanation.ends_with(Category::SubjectArea.tag())));
        assert!(rows.iter().all(|r| !r.explanation.ends_with(Category::ProgramElective.tag())));

        let reclassified = rows.iter().filter(|r| r.explanation.ends_with(RECLASSIFIED_TAG)).count();
        if code == "CSYE 7245" {
            assert_eq!(rows.len(), 2);
            assert_eq!(reclassified, 1);
        } else {
            assert_eq!(rows.len(), 1, "{}", code);
            assert_eq!(reclassified, 0);
        }
    }
}

#[test]
fn test_recalculation_is_idempotent() {
    let mut store = seeded_memory_store();
    recalculate_eligibility(&mut store, USER_ID).unwrap();
    let first = store.fetch_user_eligibility(USER_ID).unwrap();
    let report = recalculate_eligibility(&mut store, USER_ID).unwrap();
    let second = store.fetch_user_eligibility(USER_ID).unwrap();

    assert_eq!(first, second);
    assert_eq!(second, report.rows);
}

#[test]
fn test_missing_user_leaves_rows_untouched() {
    let mut store = seeded_memory_store();
    let stale = vec![EligibilityRow {
        user_id: 999,
        code: "INFO 5100".to_string(),
        actionable: true,
        explanation: "stale".to_string(),
        status: EligibilityStatus::Calculated,
    }];
    store.replace_user_eligibility(999, &stale).unwrap();
    recalculate_eligibility(&mut store, USER_ID).unwrap();
    let before = store.fetch_user_eligibility(USER_ID).unwrap();

    let err = recalculate_eligibility(&mut store, 999).unwrap_err();
    assert_matches!(err, EligibilityError::UserNotFound(999));

    assert_eq!(store.fetch_user_eligibility(999).unwrap(), stale);
    assert_eq!(store.fetch_user_eligibility(USER_ID).unwrap(), before);
}

#[test]
fn test_program_exceptions_and_lists_round_trip() {
    let mut store = seeded_memory_store();
    // importar dos veces no duplica listas
    store.import_program(&msis_program()).unwrap();

    let reqs = store.fetch_program_requirements(PROGRAM_ID).unwrap().unwrap();
    assert_eq!(reqs.elective_exceptions, vec!["INFO 6105".to_string(), "CSYE 7374".to_string()]);
    assert_eq!(reqs.program_name.as_deref(), Some("Information Systems, MSIS"));

    let core: Vec<String> =
        store.fetch_core_requirements(PROGRAM_ID).unwrap().into_iter().map(|c| c.course_code).collect();
    assert_eq!(core, vec!["INFO 5100", "INFO 6150"]);
    let options = store.fetch_core_option_courses(PROGRAM_ID).unwrap();
    assert_eq!(options.len(), 3);
    assert_eq!(options[0].course_code, "CSYE 7200");
    assert_eq!(options[0].credits, 4.0);

    assert_eq!(store.fetch_subject_area_requirements(PROGRAM_ID).unwrap(), BTreeMap::from([("INFO".to_string(), 2.0)]));
    assert_eq!(store.fetch_elective_courses(PROGRAM_ID).unwrap().len(), 3);
    assert_eq!(
        store.fetch_prerequisites("INFO 6150").unwrap().as_deref(),
        Some("INFO 5100 with a minimum grade of C")
    );
    assert_eq!(store.fetch_prerequisites("INFO 5100").unwrap(), None);
    assert_eq!(store.fetch_prerequisites("NOPE 0000").unwrap(), None);
}

#[test]
fn test_retake_replaces_failed_grade() {
    let mut store = seeded_memory_store();
    let mut courses = common::default_courses();
    courses.retain(|c| c.course_code != "TELE 5330");
    courses.push(common::taken("TELE 5330", gradcheck::algorithm::Grade::B, 4.0));
    store.replace_user_courses(USER_ID, &courses).unwrap();

    let report = recalculate_eligibility(&mut store, USER_ID).unwrap();
    assert_eq!(report.electives.completed, 10.0);
    let tele = rows_for(&report.rows, "TELE 5330");
    assert!(!tele[0].actionable);
    assert!(!rows_for(&report.rows, ELECTIVES_CODE)[0].actionable);
}
