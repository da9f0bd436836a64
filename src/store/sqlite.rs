use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::algorithm::grades::Grade;
use crate::error::{EligibilityError, Result};
use crate::models::{
    EligibilityRow, ProgramDefinition, ProgramRequirements, RequiredCourse, UserCourse, UserData, UserProfile,
};
use crate::store::schema::SQLITE_SCHEMA;
use crate::store::{AdvisingWriter, EligibilitySink, EligibilitySource};

/// Warehouse local sobre SQLite (desarrollo, tests y despliegues pequeños).
pub struct SqliteStore {
    conn: Connection,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteStore(..)")
    }
}

impl SqliteStore {
    /// Abre (o crea) la base en `path`, creando el directorio si hace falta.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let conn = Connection::open(path)?;
        Ok(SqliteStore { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(SqliteStore { conn: Connection::open_in_memory()? })
    }

    fn fetch_required(&self, table: &str, program_id: &str) -> Result<Vec<RequiredCourse>> {
        let sql = format!(
            "SELECT r.COURSE_CODE, cc.CREDITS
             FROM {} r
             JOIN COURSE_CATALOG cc ON r.COURSE_CODE = cc.COURSE_CODE
             WHERE r.PROGRAM_ID = ?1
             ORDER BY r.ID",
            table
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![program_id], |row| {
            Ok(RequiredCourse { course_code: row.get(0)?, credits: row.get(1)? })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }
}

impl EligibilitySource for SqliteStore {
    fn fetch_program_requirements(&mut self, program_id: &str) -> Result<Option<ProgramRequirements>> {
        let found = self
            .conn
            .query_row(
                "SELECT PROGRAM_ID, PROGRAM_NAME, MAX_CREDIT_HOURS, MIN_GPA, CORE_CREDIT_REQ,
                        CORE_OPTIONS_CREDIT_REQ, ELECTIVE_CREDIT_REQ, SUBJECT_CREDIT_REQ, ELECTIVE_EXCEPTION
                 FROM PROGRAM_REQUIREMENTS WHERE PROGRAM_ID = ?1",
                params![program_id],
                |row| {
                    let exceptions: Option<String> = row.get(8)?;
                    Ok(ProgramRequirements {
                        program_id: row.get(0)?,
                        program_name: row.get(1)?,
                        max_credit_hours: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                        min_gpa: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
                        core_credit_req: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
                        core_options_credit_req: row.get::<_, Option<f64>>(5)?.unwrap_or(0.0),
                        elective_credit_req: row.get::<_, Option<f64>>(6)?.unwrap_or(0.0),
                        subject_credit_req: row.get::<_, Option<f64>>(7)?.unwrap_or(0.0),
                        elective_exceptions: ProgramRequirements::parse_exceptions(exceptions.as_deref()),
                    })
                },
            )
            .optional()?;
        Ok(found)
    }

    fn fetch_core_requirements(&mut self, program_id: &str) -> Result<Vec<RequiredCourse>> {
        self.fetch_required("CORE_REQUIREMENTS", program_id)
    }

    fn fetch_core_option_courses(&mut self, program_id: &str) -> Result<Vec<RequiredCourse>> {
        self.fetch_required("CORE_OPTIONS_REQUIREMENTS", program_id)
    }

    fn fetch_subject_area_requirements(&mut self, program_id: &str) -> Result<BTreeMap<String, f64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT SUBJECT_CODE, MIN_CREDIT_HOURS FROM SUBJECT_AREAS WHERE PROGRAM_ID = ?1")?;
        let rows = stmt.query_map(params![program_id], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?;
        let mut out = BTreeMap::new();
        for r in rows {
            let (subject, min) = r?;
            out.insert(subject, min);
        }
        Ok(out)
    }

    fn fetch_elective_courses(&mut self, program_id: &str) -> Result<BTreeSet<String>> {
        let mut stmt = self.conn.prepare("SELECT SUBJECT_CODE FROM ELECTIVE_REQUIREMENTS WHERE PROGRAM_ID = ?1")?;
        let rows = stmt.query_map(params![program_id], |row| row.get::<_, String>(0))?;
        let mut out = BTreeSet::new();
        for r in rows {
            out.insert(r?);
        }
        Ok(out)
    }

    fn fetch_prerequisites(&mut self, course_code: &str) -> Result<Option<String>> {
        let text: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT PREREQUISITES FROM COURSE_CATALOG WHERE COURSE_CODE = ?1",
                params![course_code],
                |row| row.get(0),
            )
            .optional()?;
        Ok(text.flatten().map(|t| t.trim().to_string()).filter(|t| !t.is_empty()))
    }

    fn fetch_user_data(&mut self, user_id: i64) -> Result<Option<UserData>> {
        let profile: Option<(Option<String>, Option<f64>)> = self
            .conn
            .query_row(
                "SELECT PROGRAM_ID, GPA FROM USER_PROFILE WHERE USER_ID = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((program_id, gpa)) = profile else {
            return Ok(None);
        };
        let program_id =
            program_id.ok_or_else(|| EligibilityError::ProgramNotFound(format!("<none for user {}>", user_id)))?;

        let mut stmt = self.conn.prepare(
            "SELECT COURSE_CODE, COURSE_NAME, GRADE, CREDITS FROM USER_COURSES WHERE USER_ID = ?1 ORDER BY ID",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
            ))
        })?;
        let mut completed_courses = Vec::new();
        for r in rows {
            let (course_code, course_name, grade, credits) = r?;
            let grade: Grade = grade.parse()?;
            completed_courses.push(UserCourse { course_code, course_name, grade, credits });
        }

        Ok(Some(UserData { user_id, program_id, gpa: gpa.unwrap_or(0.0), completed_courses }))
    }
}

impl EligibilitySink for SqliteStore {
    fn replace_user_eligibility(&mut self, user_id: i64, rows: &[EligibilityRow]) -> Result<()> {
        let ts = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let deleted = tx.execute("DELETE FROM USER_ELIGIBILITY WHERE USER_ID = ?1", params![user_id])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO USER_ELIGIBILITY
                    (USER_ID, ORDINAL, COURSE_OR_REQUIREMENT, ELIGIBLE, DETAILS, STATUS, CHECK_DATE)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for (ordinal, row) in rows.iter().enumerate() {
                stmt.execute(params![
                    user_id,
                    ordinal as i64,
                    row.code,
                    row.actionable,
                    row.explanation,
                    row.status.as_str(),
                    ts,
                ])?;
            }
        }
        tx.commit()?;
        debug!(user_id, deleted, inserted = rows.len(), "user eligibility replaced");
        Ok(())
    }

    fn fetch_user_eligibility(&mut self, user_id: i64) -> Result<Vec<EligibilityRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT COURSE_OR_REQUIREMENT, ELIGIBLE, DETAILS, STATUS
             FROM USER_ELIGIBILITY WHERE USER_ID = ?1 ORDER BY ORDINAL",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?, row.get::<_, String>(2)?, row.get::<_, String>(3)?))
        })?;
        let mut out = Vec::new();
        for r in rows {
            let (code, actionable, explanation, status) = r?;
            out.push(EligibilityRow { user_id, code, actionable, explanation, status: status.parse()? });
        }
        Ok(out)
    }
}

impl AdvisingWriter for SqliteStore {
    fn init_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(SQLITE_SCHEMA)?;
        info!("sqlite schema ready");
        Ok(())
    }

    fn import_program(&mut self, program: &ProgramDefinition) -> Result<()> {
        let reqs = &program.requirements;
        let pid = reqs.program_id.as_str();
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT OR REPLACE INTO PROGRAM_REQUIREMENTS
                (PROGRAM_ID, PROGRAM_NAME, MAX_CREDIT_HOURS, MIN_GPA, CORE_CREDIT_REQ,
                 CORE_OPTIONS_CREDIT_REQ, ELECTIVE_CREDIT_REQ, SUBJECT_CREDIT_REQ, ELECTIVE_EXCEPTION)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                pid,
                reqs.program_name,
                reqs.max_credit_hours,
                reqs.min_gpa,
                reqs.core_credit_req,
                reqs.core_options_credit_req,
                reqs.elective_credit_req,
                reqs.subject_credit_req,
                reqs.elective_exceptions.join(","),
            ],
        )?;

        for course in &program.catalog {
            tx.execute(
                "INSERT OR REPLACE INTO COURSE_CATALOG (COURSE_CODE, COURSE_NAME, PREREQUISITES, CREDITS, SUBJECT_CODE)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    course.course_code,
                    course.course_name,
                    course.prerequisites,
                    course.credits,
                    course.course_code.get(..4),
                ],
            )?;
        }

        for table in ["CORE_REQUIREMENTS", "CORE_OPTIONS_REQUIREMENTS", "SUBJECT_AREAS", "ELECTIVE_REQUIREMENTS"] {
            tx.execute(&format!("DELETE FROM {} WHERE PROGRAM_ID = ?1", table), params![pid])?;
        }
        for code in &program.core {
            tx.execute("INSERT INTO CORE_REQUIREMENTS (PROGRAM_ID, COURSE_CODE) VALUES (?1, ?2)", params![pid, code])?;
        }
        for code in &program.core_options {
            tx.execute(
                "INSERT INTO CORE_OPTIONS_REQUIREMENTS (PROGRAM_ID, COURSE_CODE) VALUES (?1, ?2)",
                params![pid, code],
            )?;
        }
        for (subject, min) in &program.subject_areas {
            tx.execute(
                "INSERT INTO SUBJECT_AREAS (PROGRAM_ID, SUBJECT_CODE, MIN_CREDIT_HOURS) VALUES (?1, ?2, ?3)",
                params![pid, subject, min],
            )?;
        }
        for subject in &program.elective_subjects {
            tx.execute(
                "INSERT INTO ELECTIVE_REQUIREMENTS (PROGRAM_ID, SUBJECT_CODE) VALUES (?1, ?2)",
                params![pid, subject],
            )?;
        }

        tx.commit()?;
        info!(program = pid, courses = program.catalog.len(), "program imported");
        Ok(())
    }

    fn upsert_user_profile(&mut self, profile: &UserProfile) -> Result<()> {
        self.conn.execute(
            "INSERT INTO USER_PROFILE (USER_ID, USERNAME, GPA, PROGRAM_ID) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(USER_ID) DO UPDATE SET USERNAME = excluded.USERNAME, GPA = excluded.GPA,
                PROGRAM_ID = excluded.PROGRAM_ID",
            params![profile.user_id, profile.username, profile.gpa, profile.program_id],
        )?;
        Ok(())
    }

    fn replace_user_courses(&mut self, user_id: i64, courses: &[UserCourse]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM USER_COURSES WHERE USER_ID = ?1", params![user_id])?;
        for c in courses {
            tx.execute(
                "INSERT INTO USER_COURSES (USER_ID, COURSE_CODE, COURSE_NAME, GRADE, CREDITS) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user_id, c.course_code, c.course_name, c.grade.token(), c.credits],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EligibilityStatus;

    fn row(code: &str, actionable: bool) -> EligibilityRow {
        EligibilityRow {
            user_id: 1,
            code: code.to_string(),
            actionable,
            explanation: format!("row {}", code),
            status: EligibilityStatus::Calculated,
        }
    }

    #[test]
    fn test_replace_keeps_emission_order() {
        let mut db = SqliteStore::open_in_memory().unwrap();
        db.init_schema().unwrap();
        db.replace_user_eligibility(1, &[row("ZZZZ 9999", true), row("AAAA 1000", false)]).unwrap();
        let got = db.fetch_user_eligibility(1).unwrap();
        assert_eq!(got.iter().map(|r| r.code.as_str()).collect::<Vec<_>>(), vec!["ZZZZ 9999", "AAAA 1000"]);

        // reemplazo completo, sin acumulación
        db.replace_user_eligibility(1, &[row("INFO 5100", true)]).unwrap();
        let got = db.fetch_user_eligibility(1).unwrap();
        assert_eq!(got, vec![row("INFO 5100", true)]);
    }

    #[test]
    fn test_invalid_grade_in_user_courses_is_fatal() {
        let mut db = SqliteStore::open_in_memory().unwrap();
        db.init_schema().unwrap();
        db.upsert_user_profile(&UserProfile {
            user_id: 5,
            username: None,
            gpa: None,
            program_id: Some("MP_IS_MSIS".into()),
        })
        .unwrap();
        db.conn
            .execute(
                "INSERT INTO USER_COURSES (USER_ID, COURSE_CODE, GRADE, CREDITS) VALUES (5, 'INFO 5100', 'N/A', 4)",
                [],
            )
            .unwrap();
        let err = db.fetch_user_data(5).unwrap_err();
        assert!(matches!(err, EligibilityError::InvalidGrade(ref t) if t == "N/A"));
    }

    #[test]
    fn test_missing_profile_is_none_and_null_gpa_is_zero() {
        let mut db = SqliteStore::open_in_memory().unwrap();
        db.init_schema().unwrap();
        assert!(db.fetch_user_data(999).unwrap().is_none());

        db.upsert_user_profile(&UserProfile { user_id: 3, username: None, gpa: None, program_id: Some("P".into()) })
            .unwrap();
        let data = db.fetch_user_data(3).unwrap().unwrap();
        assert_eq!(data.gpa, 0.0);
        assert!(data.completed_courses.is_empty());
    }

    #[test]
    fn test_profile_without_program_names_user() {
        let mut db = SqliteStore::open_in_memory().unwrap();
        db.init_schema().unwrap();
        db.upsert_user_profile(&UserProfile { user_id: 3, username: None, gpa: Some(3.2), program_id: None })
            .unwrap();
        let err = db.fetch_user_data(3).unwrap_err();
        assert!(matches!(err, EligibilityError::ProgramNotFound(ref p) if p.contains("user 3")));
        assert!(err.to_string().ends_with("<none for user 3>"));
    }

    #[test]
    fn test_open_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("gradcheck.db");
        let mut db = SqliteStore::open(&path).unwrap();
        db.init_schema().unwrap();
        assert!(path.exists());
    }
}
