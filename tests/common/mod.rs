#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};

use gradcheck::algorithm::Grade;
use gradcheck::models::{CourseRecord, ProgramDefinition, ProgramRequirements, UserCourse, UserProfile};
use gradcheck::store::{AdvisingWriter, SqliteStore};

pub const PROGRAM_ID: &str = "MP_IS_MSIS";
pub const USER_ID: i64 = 7;

fn course(code: &str, credits: f64, prerequisites: Option<&str>) -> CourseRecord {
    CourseRecord {
        course_code: code.to_string(),
        course_name: None,
        prerequisites: prerequisites.map(str::to_string),
        credits,
    }
}

/// Programa de prueba: 2 core, 3 core-option (4 créditos exigidos),
/// área INFO con 2 créditos mínimos y electivos CSYE / INFO / TELE.
pub fn msis_program() -> ProgramDefinition {
    ProgramDefinition {
        requirements: ProgramRequirements {
            program_id: PROGRAM_ID.to_string(),
            program_name: Some("Information Systems, MSIS".to_string()),
            max_credit_hours: 32.0,
            min_gpa: 3.0,
            core_credit_req: 8.0,
            core_options_credit_req: 4.0,
            elective_credit_req: 8.0,
            subject_credit_req: 2.0,
            elective_exceptions: vec!["INFO 6105".to_string(), "CSYE 7374".to_string()],
        },
        catalog: vec![
            course("INFO 5100", 4.0, None),
            course("INFO 6150", 4.0, Some("INFO 5100 with a minimum grade of C")),
            course("CSYE 7200", 4.0, None),
            course("CSYE 7245", 4.0, Some("CSYE 6200 with a minimum grade of B-")),
            course("DAMG 7250", 4.0, None),
            course("INFO 6105", 4.0, None),
            course("TELE 5330", 4.0, None),
        ],
        core: vec!["INFO 5100".to_string(), "INFO 6150".to_string()],
        core_options: vec!["CSYE 7200".to_string(), "CSYE 7245".to_string(), "DAMG 7250".to_string()],
        subject_areas: BTreeMap::from([("INFO".to_string(), 2.0)]),
        elective_subjects: BTreeSet::from(["CSYE".to_string(), "INFO".to_string(), "TELE".to_string()]),
    }
}

pub fn taken(code: &str, grade: Grade, credits: f64) -> UserCourse {
    UserCourse { course_code: code.to_string(), course_name: None, grade, credits }
}

pub fn default_courses() -> Vec<UserCourse> {
    vec![
        taken("INFO 5100", Grade::A, 4.0),
        taken("INFO 6150", Grade::InProgress, 4.0),
        taken("CSYE 7200", Grade::BPlus, 4.0),
        taken("CSYE 7245", Grade::A, 4.0),
        taken("INFO 6105", Grade::AMinus, 4.0),
        taken("TELE 5330", Grade::F, 4.0),
    ]
}

/// Carga el programa, el perfil del usuario 7 y sus ramos.
pub fn seed<S: AdvisingWriter>(store: &mut S) {
    store.init_schema().unwrap();
    store.import_program(&msis_program()).unwrap();
    store
        .upsert_user_profile(&UserProfile {
            user_id: USER_ID,
            username: Some("jdoe".to_string()),
            gpa: Some(3.4),
            program_id: Some(PROGRAM_ID.to_string()),
        })
        .unwrap();
    store.replace_user_courses(USER_ID, &default_courses()).unwrap();
}

pub fn seeded_memory_store() -> SqliteStore {
    let mut store = SqliteStore::open_in_memory().unwrap();
    seed(&mut store);
    store
}
