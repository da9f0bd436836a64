use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use postgres::{Client, NoTls};
use tracing::{debug, info};

use crate::algorithm::grades::Grade;
use crate::error::{EligibilityError, Result};
use crate::models::{
    EligibilityRow, ProgramDefinition, ProgramRequirements, RequiredCourse, UserCourse, UserData, UserProfile,
};
use crate::store::schema::POSTGRES_SCHEMA;
use crate::store::{AdvisingWriter, EligibilitySink, EligibilitySource};

/// Warehouse remoto sobre Postgres.
///
/// El cliente de `postgres` es síncrono y levanta su propio runtime: no usar
/// desde dentro de un task async, sólo desde `web::block` / `spawn_blocking`.
pub struct PostgresStore {
    client: Client,
}

impl std::fmt::Debug for PostgresStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PostgresStore(..)")
    }
}

impl PostgresStore {
    pub fn connect(url: &str) -> Result<Self> {
        let client = Client::connect(url, NoTls)?;
        Ok(PostgresStore { client })
    }

    fn fetch_required(&mut self, table: &str, program_id: &str) -> Result<Vec<RequiredCourse>> {
        let sql = format!(
            "SELECT r.COURSE_CODE, cc.CREDITS
             FROM {} r
             JOIN COURSE_CATALOG cc ON r.COURSE_CODE = cc.COURSE_CODE
             WHERE r.PROGRAM_ID = $1
             ORDER BY r.ID",
            table
        );
        let rows = self.client.query(sql.as_str(), &[&program_id])?;
        Ok(rows
            .iter()
            .map(|r| RequiredCourse { course_code: r.get(0), credits: r.get(1) })
            .collect())
    }
}

impl EligibilitySource for PostgresStore {
    fn fetch_program_requirements(&mut self, program_id: &str) -> Result<Option<ProgramRequirements>> {
        let row = self.client.query_opt(
            "SELECT PROGRAM_ID, PROGRAM_NAME, MAX_CREDIT_HOURS, MIN_GPA, CORE_CREDIT_REQ,
                    CORE_OPTIONS_CREDIT_REQ, ELECTIVE_CREDIT_REQ, SUBJECT_CREDIT_REQ, ELECTIVE_EXCEPTION
             FROM PROGRAM_REQUIREMENTS WHERE PROGRAM_ID = $1",
            &[&program_id],
        )?;
        Ok(row.map(|r| {
            let exceptions: Option<String> = r.get(8);
            ProgramRequirements {
                program_id: r.get(0),
                program_name: r.get(1),
                max_credit_hours: r.get::<_, Option<f64>>(2).unwrap_or(0.0),
                min_gpa: r.get::<_, Option<f64>>(3).unwrap_or(0.0),
                core_credit_req: r.get::<_, Option<f64>>(4).unwrap_or(0.0),
                core_options_credit_req: r.get::<_, Option<f64>>(5).unwrap_or(0.0),
                elective_credit_req: r.get::<_, Option<f64>>(6).unwrap_or(0.0),
                subject_credit_req: r.get::<_, Option<f64>>(7).unwrap_or(0.0),
                elective_exceptions: ProgramRequirements::parse_exceptions(exceptions.as_deref()),
            }
        }))
    }

    fn fetch_core_requirements(&mut self, program_id: &str) -> Result<Vec<RequiredCourse>> {
        self.fetch_required("CORE_REQUIREMENTS", program_id)
    }

    fn fetch_core_option_courses(&mut self, program_id: &str) -> Result<Vec<RequiredCourse>> {
        self.fetch_required("CORE_OPTIONS_REQUIREMENTS", program_id)
    }

    fn fetch_subject_area_requirements(&mut self, program_id: &str) -> Result<BTreeMap<String, f64>> {
        let rows = self.client.query(
            "SELECT SUBJECT_CODE, MIN_CREDIT_HOURS FROM SUBJECT_AREAS WHERE PROGRAM_ID = $1",
            &[&program_id],
        )?;
        Ok(rows.iter().map(|r| (r.get::<_, String>(0), r.get::<_, f64>(1))).collect())
    }

    fn fetch_elective_courses(&mut self, program_id: &str) -> Result<BTreeSet<String>> {
        let rows = self
            .client
            .query("SELECT SUBJECT_CODE FROM ELECTIVE_REQUIREMENTS WHERE PROGRAM_ID = $1", &[&program_id])?;
        Ok(rows.iter().map(|r| r.get::<_, String>(0)).collect())
    }

    fn fetch_prerequisites(&mut self, course_code: &str) -> Result<Option<String>> {
        let row = self
            .client
            .query_opt("SELECT PREREQUISITES FROM COURSE_CATALOG WHERE COURSE_CODE = $1", &[&course_code])?;
        Ok(row
            .and_then(|r| r.get::<_, Option<String>>(0))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()))
    }

    fn fetch_user_data(&mut self, user_id: i64) -> Result<Option<UserData>> {
        let Some(profile) =
            self.client.query_opt("SELECT PROGRAM_ID, GPA FROM USER_PROFILE WHERE USER_ID = $1", &[&user_id])?
        else {
            return Ok(None);
        };
        let program_id: Option<String> = profile.get(0);
        let gpa: Option<f64> = profile.get(1);
        let program_id =
            program_id.ok_or_else(|| EligibilityError::ProgramNotFound(format!("<none for user {}>", user_id)))?;

        let rows = self.client.query(
            "SELECT COURSE_CODE, COURSE_NAME, GRADE, CREDITS FROM USER_COURSES WHERE USER_ID = $1 ORDER BY ID",
            &[&user_id],
        )?;
        let mut completed_courses = Vec::with_capacity(rows.len());
        for r in &rows {
            let grade: String = r.get(2);
            let grade: Grade = grade.parse()?;
            completed_courses.push(UserCourse {
                course_code: r.get(0),
                course_name: r.get(1),
                grade,
                credits: r.get(3),
            });
        }

        Ok(Some(UserData { user_id, program_id, gpa: gpa.unwrap_or(0.0), completed_courses }))
    }
}

impl EligibilitySink for PostgresStore {
    fn replace_user_eligibility(&mut self, user_id: i64, rows: &[EligibilityRow]) -> Result<()> {
        let ts = Utc::now().to_rfc3339();
        let mut tx = self.client.transaction()?;
        let deleted = tx.execute("DELETE FROM USER_ELIGIBILITY WHERE USER_ID = $1", &[&user_id])?;
        let stmt = tx.prepare(
            "INSERT INTO USER_ELIGIBILITY
                (USER_ID, ORDINAL, COURSE_OR_REQUIREMENT, ELIGIBLE, DETAILS, STATUS, CHECK_DATE)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )?;
        for (ordinal, row) in rows.iter().enumerate() {
            let ordinal = ordinal as i64;
            tx.execute(
                &stmt,
                &[&user_id, &ordinal, &row.code, &row.actionable, &row.explanation, &row.status.as_str(), &ts],
            )?;
        }
        tx.commit()?;
        debug!(user_id, deleted, inserted = rows.len(), "user eligibility replaced");
        Ok(())
    }

    fn fetch_user_eligibility(&mut self, user_id: i64) -> Result<Vec<EligibilityRow>> {
        let rows = self.client.query(
            "SELECT COURSE_OR_REQUIREMENT, ELIGIBLE, DETAILS, STATUS
             FROM USER_ELIGIBILITY WHERE USER_ID = $1 ORDER BY ORDINAL",
            &[&user_id],
        )?;
        let mut out = Vec::with_capacity(rows.len());
        for r in &rows {
            let status: String = r.get(3);
            out.push(EligibilityRow {
                user_id,
                code: r.get(0),
                actionable: r.get(1),
                explanation: r.get(2),
                status: status.parse()?,
            });
        }
        Ok(out)
    }
}

impl AdvisingWriter for PostgresStore {
    fn init_schema(&mut self) -> Result<()> {
        self.client.batch_execute(POSTGRES_SCHEMA)?;
        info!("postgres schema ready");
        Ok(())
    }

    fn import_program(&mut self, program: &ProgramDefinition) -> Result<()> {
        let reqs = &program.requirements;
        let pid = reqs.program_id.as_str();
        let exceptions = reqs.elective_exceptions.join(",");
        let mut tx = self.client.transaction()?;

        tx.execute(
            "INSERT INTO PROGRAM_REQUIREMENTS
                (PROGRAM_ID, PROGRAM_NAME, MAX_CREDIT_HOURS, MIN_GPA, CORE_CREDIT_REQ,
                 CORE_OPTIONS_CREDIT_REQ, ELECTIVE_CREDIT_REQ, SUBJECT_CREDIT_REQ, ELECTIVE_EXCEPTION)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (PROGRAM_ID) DO UPDATE SET
                PROGRAM_NAME = EXCLUDED.PROGRAM_NAME,
                MAX_CREDIT_HOURS = EXCLUDED.MAX_CREDIT_HOURS,
                MIN_GPA = EXCLUDED.MIN_GPA,
                CORE_CREDIT_REQ = EXCLUDED.CORE_CREDIT_REQ,
                CORE_OPTIONS_CREDIT_REQ = EXCLUDED.CORE_OPTIONS_CREDIT_REQ,
                ELECTIVE_CREDIT_REQ = EXCLUDED.ELECTIVE_CREDIT_REQ,
                SUBJECT_CREDIT_REQ = EXCLUDED.SUBJECT_CREDIT_REQ,
                ELECTIVE_EXCEPTION = EXCLUDED.ELECTIVE_EXCEPTION",
            &[
                &pid,
                &reqs.program_name,
                &reqs.max_credit_hours,
                &reqs.min_gpa,
                &reqs.core_credit_req,
                &reqs.core_options_credit_req,
                &reqs.elective_credit_req,
                &reqs.subject_credit_req,
                &exceptions,
            ],
        )?;

        for course in &program.catalog {
            let subject = course.course_code.get(..4);
            tx.execute(
                "INSERT INTO COURSE_CATALOG (COURSE_CODE, COURSE_NAME, PREREQUISITES, CREDITS, SUBJECT_CODE)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (COURSE_CODE) DO UPDATE SET
                    COURSE_NAME = EXCLUDED.COURSE_NAME,
                    PREREQUISITES = EXCLUDED.PREREQUISITES,
                    CREDITS = EXCLUDED.CREDITS,
                    SUBJECT_CODE = EXCLUDED.SUBJECT_CODE",
                &[&course.course_code, &course.course_name, &course.prerequisites, &course.credits, &subject],
            )?;
        }

        for table in ["CORE_REQUIREMENTS", "CORE_OPTIONS_REQUIREMENTS", "SUBJECT_AREAS", "ELECTIVE_REQUIREMENTS"] {
            tx.execute(format!("DELETE FROM {} WHERE PROGRAM_ID = $1", table).as_str(), &[&pid])?;
        }
        for code in &program.core {
            tx.execute("INSERT INTO CORE_REQUIREMENTS (PROGRAM_ID, COURSE_CODE) VALUES ($1, $2)", &[&pid, code])?;
        }
        for code in &program.core_options {
            tx.execute(
                "INSERT INTO CORE_OPTIONS_REQUIREMENTS (PROGRAM_ID, COURSE_CODE) VALUES ($1, $2)",
                &[&pid, code],
            )?;
        }
        for (subject, min) in &program.subject_areas {
            tx.execute(
                "INSERT INTO SUBJECT_AREAS (PROGRAM_ID, SUBJECT_CODE, MIN_CREDIT_HOURS) VALUES ($1, $2, $3)",
                &[&pid, subject, min],
            )?;
        }
        for subject in &program.elective_subjects {
            tx.execute(
                "INSERT INTO ELECTIVE_REQUIREMENTS (PROGRAM_ID, SUBJECT_CODE) VALUES ($1, $2)",
                &[&pid, subject],
            )?;
        }

        tx.commit()?;
        info!(program = pid, courses = program.catalog.len(), "program imported");
        Ok(())
    }

    fn upsert_user_profile(&mut self, profile: &UserProfile) -> Result<()> {
        self.client.execute(
            "INSERT INTO USER_PROFILE (USER_ID, USERNAME, GPA, PROGRAM_ID) VALUES ($1, $2, $3, $4)
             ON CONFLICT (USER_ID) DO UPDATE SET USERNAME = EXCLUDED.USERNAME, GPA = EXCLUDED.GPA,
                PROGRAM_ID = EXCLUDED.PROGRAM_ID",
            &[&profile.user_id, &profile.username, &profile.gpa, &profile.program_id],
        )?;
        Ok(())
    }

    fn replace_user_courses(&mut self, user_id: i64, courses: &[UserCourse]) -> Result<()> {
        let mut tx = self.client.transaction()?;
        tx.execute("DELETE FROM USER_COURSES WHERE USER_ID = $1", &[&user_id])?;
        for c in courses {
            tx.execute(
                "INSERT INTO USER_COURSES (USER_ID, COURSE_CODE, COURSE_NAME, GRADE, CREDITS) VALUES ($1, $2, $3, $4, $5)",
                &[&user_id, &c.course_code, &c.course_name, &c.grade.token(), &c.credits],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
