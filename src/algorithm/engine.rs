// engine.rs - Recálculo de elegibilidad en 4 pasadas
//
// PASADA 1: ramos core
//   - F -> accionable, no suma créditos
//   - IP -> suma créditos (progreso), PENDING
//   - aprobado -> suma créditos
//   - no cursado -> prerequisitos del catálogo
//
// PASADA 2: ramos core-option
//   - misma lógica; una vez cubiertos los créditos exigidos, los ramos
//     siguientes se reevalúan contra las asignaturas electivas y pueden
//     quedar en cola para contarse como electivo en la pasada 3
//
// PASADA 3: subject area + electivos, recorriendo los ramos del usuario
//   - los créditos de un ramo pueden repartirse entre subject area y electivo
//
// PASADA 4: filas resumen por subject area y una fila ELECTIVES
//
// Todas las pasadas comparten un `CourseClassification` para que cada ramo
// tenga exactamente una categoría primaria.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::algorithm::classification::{subject_code, Category, CourseClassification, RECLASSIFIED_TAG};
use crate::algorithm::prerequisites::{check_prerequisites, describe_prerequisites, parse_prerequisites, PrerequisiteCheck};
use crate::error::Result;
use crate::models::{
    CreditTally, EligibilityReport, EligibilityRow, EligibilityStatus, ProgramSnapshot, RequiredCourse,
    SkippedItem, UserCourse,
};

/// Código de la fila resumen de electivos.
pub const ELECTIVES_CODE: &str = "ELECTIVES";
/// Prefijo de las filas resumen por subject area.
pub const SUBJECT_AREA_PREFIX: &str = "SUBJECT_AREA_";

/// Acumula filas y ramos omitidos en orden de emisión.
struct Emitter {
    user_id: i64,
    rows: Vec<EligibilityRow>,
    skipped: Vec<SkippedItem>,
}

impl Emitter {
    fn push(&mut self, code: &str, actionable: bool, explanation: String, status: EligibilityStatus) {
        self.rows.push(EligibilityRow {
            user_id: self.user_id,
            code: code.to_string(),
            actionable,
            explanation,
            status,
        });
    }

    /// Los errores recuperables se registran y el ramo se omite; los fatales
    /// se propagan y abortan el recálculo.
    fn recover(&mut self, course_code: &str, res: Result<()>) -> Result<()> {
        match res {
            Ok(()) => Ok(()),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(course = course_code, error = %e, "skipping course");
                self.skipped.push(SkippedItem { course_code: course_code.to_string(), reason: e.to_string() });
                Ok(())
            }
        }
    }
}

/// Totales de la pasada 3.
#[derive(Default)]
struct ElectiveTotals {
    credits: f64,
    courses: Vec<String>,
    by_subject: BTreeMap<String, f64>,
    subject_credits: BTreeMap<String, f64>,
    subject_courses: BTreeMap<String, Vec<String>>,
}

impl ElectiveTotals {
    fn add_elective(&mut self, subject: &str, course_code: &str, credits: f64) {
        self.credits += credits;
        self.courses.push(course_code.to_string());
        *self.by_subject.entry(subject.to_string()).or_default() += credits;
    }
}

/// Formatea créditos sin ".0" cuando son enteros (4 en vez de 4.0).
pub fn fmt_credits(credits: f64) -> String {
    if credits.fract() == 0.0 {
        format!("{:.0}", credits)
    } else {
        format!("{}", credits)
    }
}

fn find_user_course<'a>(courses: &'a [UserCourse], course_code: &str) -> Option<&'a UserCourse> {
    courses.iter().find(|c| c.course_code == course_code)
}

/// "In progress with grade ..." / "Already completed with grade ...".
fn progress_phrase(course: &UserCourse) -> String {
    if course.grade.is_in_progress() {
        format!("In progress with grade '{}'.", course.grade)
    } else {
        format!("Already completed with grade '{}'.", course.grade)
    }
}

fn status_for(course: &UserCourse) -> EligibilityStatus {
    if course.grade.is_in_progress() {
        EligibilityStatus::Pending
    } else {
        EligibilityStatus::Calculated
    }
}

/// Explicación para un ramo requerido que el usuario no ha cursado.
fn not_attempted_explanation(snapshot: &ProgramSnapshot, course_code: &str, category: Category) -> String {
    let text = snapshot.prerequisites.get(course_code).and_then(|t| t.as_deref());
    let prereqs = parse_prerequisites(text);
    if prereqs.is_empty() {
        return format!("Have not started/completed it has no prerequisites, available now. {}", category.tag());
    }
    let outcome = match check_prerequisites(&snapshot.user.completed_courses, &prereqs) {
        PrerequisiteCheck::Satisfied => "Prerequisites satisfied.".to_string(),
        PrerequisiteCheck::Unmet { reason, .. } => reason,
    };
    format!(
        "Have not started/completed. Prerequisites: {}. {} {}",
        describe_prerequisites(&prereqs),
        outcome,
        category.tag()
    )
}

/// PASADA 1: ramos core. Devuelve el total de créditos core (aprobados + en curso).
fn process_core(snapshot: &ProgramSnapshot, classification: &mut CourseClassification, out: &mut Emitter) -> f64 {
    let mut completed = 0.0;
    let tag = Category::Core.tag();

    for required in &snapshot.lists.core {
        let code = required.course_code.as_str();
        if !classification.claim(code, Category::Core) {
            continue;
        }
        debug!(course = code, "processing core course");

        match find_user_course(&snapshot.user.completed_courses, code) {
            Some(taken) if taken.grade.is_failing() => {
                out.push(code, true, format!("Failed with grade '{}'. {}", taken.grade, tag), EligibilityStatus::Calculated);
            }
            Some(taken) => {
                completed += required.credits;
                out.push(code, false, format!("{} {}", progress_phrase(taken), tag), status_for(taken));
            }
            None => {
                let explanation = not_attempted_explanation(snapshot, code, Category::Core);
                out.push(code, true, explanation, EligibilityStatus::Calculated);
            }
        }
    }

    info!(
        "completed core credits: {}/{}",
        fmt_credits(completed),
        fmt_credits(snapshot.requirements.core_credit_req)
    );
    completed
}

/// Ramo core-option que llega cuando el requisito ya está cubierto.
fn core_option_overflow(
    snapshot: &ProgramSnapshot,
    required: &RequiredCourse,
    taken: Option<&UserCourse>,
    classification: &mut CourseClassification,
    out: &mut Emitter,
) -> Result<()> {
    let code = required.course_code.as_str();
    let subject = subject_code(code)?;
    let tag = Category::CoreOption.tag();

    if snapshot.lists.elective_subjects.contains(subject) {
        classification.queue_as_elective(code);
        match taken {
            Some(t) => out.push(
                code,
                false,
                format!(
                    "Completed with grade '{}'. Core options requirement already satisfied, so it counts toward program electives under {}. {}",
                    t.grade, subject, tag
                ),
                EligibilityStatus::Calculated,
            ),
            None => out.push(
                code,
                true,
                format!(
                    "Core options requirement already satisfied but it can be taken as an elective under {}. {}",
                    subject, tag
                ),
                EligibilityStatus::Calculated,
            ),
        }
    } else {
        out.push(
            code,
            taken.is_none(),
            format!("Core options requirement already satisfied. {}", tag),
            EligibilityStatus::Calculated,
        );
    }
    Ok(())
}

/// PASADA 2: ramos core-option. Devuelve el total de créditos core-option.
fn process_core_options(
    snapshot: &ProgramSnapshot,
    classification: &mut CourseClassification,
    out: &mut Emitter,
) -> Result<f64> {
    let mut completed = 0.0;
    let target = snapshot.requirements.core_options_credit_req;
    let tag = Category::CoreOption.tag();

    for required in &snapshot.lists.core_options {
        let code = required.course_code.as_str();
        if !classification.claim(code, Category::CoreOption) {
            continue;
        }
        debug!(course = code, "processing core option course");

        let taken = find_user_course(&snapshot.user.completed_courses, code);
        let res = match taken {
            Some(t) if t.grade.is_failing() => {
                out.push(code, true, format!("Failed with grade '{}'. {}", t.grade, tag), EligibilityStatus::Calculated);
                Ok(())
            }
            // en curso siempre cuenta como progreso del requisito
            Some(t) if t.grade.is_in_progress() => {
                completed += required.credits;
                out.push(code, false, format!("{} {}", progress_phrase(t), tag), EligibilityStatus::Pending);
                Ok(())
            }
            Some(t) if completed < target => {
                completed += required.credits;
                out.push(
                    code,
                    false,
                    format!("Already completed with grade '{}'. Counted toward core options. {}", t.grade, tag),
                    EligibilityStatus::Calculated,
                );
                Ok(())
            }
            None if completed < target => {
                let explanation = not_attempted_explanation(snapshot, code, Category::CoreOption);
                out.push(code, true, explanation, EligibilityStatus::Calculated);
                Ok(())
            }
            other => core_option_overflow(snapshot, required, other, classification, out),
        };
        out.recover(code, res)?;
    }

    info!("completed core option credits: {}/{}", fmt_credits(completed), fmt_credits(target));
    Ok(completed)
}

/// Ramo de una asignatura con mínimo de subject area: se reparte entre el
/// subject area (hasta lo que falte) y electivos (el excedente).
fn allocate_subject_area(
    course: &UserCourse,
    subject: &str,
    required: f64,
    totals: &mut ElectiveTotals,
    classification: &mut CourseClassification,
    out: &mut Emitter,
) {
    let code = course.course_code.as_str();
    if course.grade.is_failing() {
        out.push(
            code,
            true,
            format!("Failed with grade '{}'. {}", course.grade, Category::SubjectArea.tag()),
            EligibilityStatus::Calculated,
        );
        classification.claim(code, Category::SubjectArea);
        return;
    }

    let status = status_for(course);
    let phrase = progress_phrase(course);
    let allocated = totals.subject_credits.get(subject).copied().unwrap_or(0.0);
    let available = (required - allocated).max(0.0).min(course.credits);

    if available > 0.0 {
        *totals.subject_credits.entry(subject.to_string()).or_default() += available;
        totals.subject_courses.entry(subject.to_string()).or_default().push(code.to_string());
        out.push(
            code,
            false,
            format!("{} {} credits counted. {}", phrase, fmt_credits(available), Category::SubjectArea.tag()),
            status,
        );
    }

    let excess = course.credits - available;
    if excess > 0.0 {
        totals.add_elective(subject, code, excess);
        out.push(
            code,
            false,
            format!("{} {} credits counted. {}", phrase, fmt_credits(excess), Category::ProgramElective.tag()),
            status,
        );
    }

    let primary = if available > 0.0 { Category::SubjectArea } else { Category::ProgramElective };
    classification.claim(code, primary);
}

fn allocate_elective(
    course: &UserCourse,
    subject: &str,
    totals: &mut ElectiveTotals,
    classification: &mut CourseClassification,
    out: &mut Emitter,
) {
    let code = course.course_code.as_str();
    let tag = Category::ProgramElective.tag();
    if course.grade.is_failing() {
        out.push(code, true, format!("Failed with grade '{}'. {}", course.grade, tag), EligibilityStatus::Calculated);
    } else {
        totals.add_elective(subject, code, course.credits);
        out.push(
            code,
            false,
            format!("{} {} credits counted. {}", progress_phrase(course), fmt_credits(course.credits), tag),
            status_for(course),
        );
    }
    classification.claim(code, Category::ProgramElective);
}

/// Un ramo del usuario en la pasada 3.
fn process_user_course(
    snapshot: &ProgramSnapshot,
    course: &UserCourse,
    queued: bool,
    totals: &mut ElectiveTotals,
    classification: &mut CourseClassification,
    out: &mut Emitter,
) -> Result<()> {
    let code = course.course_code.as_str();
    let subject = subject_code(code)?;
    let lists = &snapshot.lists;

    if queued && classification.take_queued_elective(code) {
        totals.add_elective(subject, code, course.credits);
        out.push(
            code,
            false,
            format!("Already completed with grade '{}'. {}", course.grade, RECLASSIFIED_TAG),
            EligibilityStatus::Calculated,
        );
        return Ok(());
    }

    if let Some(&required) = lists.subject_areas.get(subject) {
        allocate_subject_area(course, subject, required, totals, classification, out);
    } else if lists.elective_subjects.contains(subject) {
        allocate_elective(course, subject, totals, classification, out);
    } else {
        debug!(course = code, "course does not count toward subject area or electives");
    }
    Ok(())
}

/// PASADA 3: subject area y electivos sobre la lista de ramos del usuario.
fn process_subject_and_electives(
    snapshot: &ProgramSnapshot,
    classification: &mut CourseClassification,
    out: &mut Emitter,
) -> Result<ElectiveTotals> {
    let mut totals = ElectiveTotals::default();

    for course in &snapshot.user.completed_courses {
        let code = course.course_code.as_str();
        let queued = classification.is_queued_as_elective(code);
        if classification.is_classified(code) && !queued {
            debug!(course = code, "skipping already processed course");
            continue;
        }

        let res = process_user_course(snapshot, course, queued, &mut totals, classification, out);
        out.recover(code, res)?;
    }

    Ok(totals)
}

/// PASADA 4: filas resumen.
fn emit_summaries(snapshot: &ProgramSnapshot, totals: &ElectiveTotals, out: &mut Emitter) {
    for (subject, &required) in &snapshot.lists.subject_areas {
        let completed = totals.subject_credits.get(subject).copied().unwrap_or(0.0);
        let courses = totals.subject_courses.get(subject).map(|v| v.join(", ")).unwrap_or_default();
        out.push(
            &format!("{}{}", SUBJECT_AREA_PREFIX, subject),
            completed < required,
            format!(
                "{}/{} credits completed for subject area {}, courses: ({})",
                fmt_credits(completed),
                fmt_credits(required),
                subject,
                courses
            ),
            EligibilityStatus::Calculated,
        );
    }

    let required = snapshot.requirements.elective_credit_req;
    let electives: Vec<&str> = snapshot.lists.elective_subjects.iter().map(String::as_str).collect();
    out.push(
        ELECTIVES_CODE,
        totals.credits < required,
        format!(
            "{}/{} credits completed for elective, courses: ({}), electives are subject codes ({}), exceptions are ({})",
            fmt_credits(totals.credits),
            fmt_credits(required),
            totals.courses.join(", "),
            electives.join(", "),
            snapshot.requirements.elective_exceptions.join(", ")
        ),
        EligibilityStatus::Calculated,
    );
}

/// Ejecuta las 4 pasadas sobre una foto de los datos del usuario y su programa.
///
/// Función pura: no toca almacenamiento. Los errores recuperables quedan en
/// `EligibilityReport::skipped`; los fatales se devuelven como `Err`.
pub fn evaluate(snapshot: &ProgramSnapshot) -> Result<EligibilityReport> {
    let user = &snapshot.user;
    let reqs = &snapshot.requirements;
    info!(user_id = user.user_id, program = %reqs.program_id, "recalculating eligibility");

    let mut classification = CourseClassification::new();
    let mut out = Emitter { user_id: user.user_id, rows: Vec::new(), skipped: Vec::new() };

    let core_completed = process_core(snapshot, &mut classification, &mut out);
    let core_options_completed = process_core_options(snapshot, &mut classification, &mut out)?;
    let totals = process_subject_and_electives(snapshot, &mut classification, &mut out)?;
    emit_summaries(snapshot, &totals, &mut out);

    let subject_areas: BTreeMap<String, CreditTally> = snapshot
        .lists
        .subject_areas
        .iter()
        .map(|(subject, &required)| {
            let completed = totals.subject_credits.get(subject).copied().unwrap_or(0.0);
            (subject.clone(), CreditTally { completed, required })
        })
        .collect();
    let subject_total: f64 = subject_areas.values().map(|t| t.completed).sum();
    let total_counted_credits = core_completed + core_options_completed + subject_total + totals.credits;

    info!(
        user_id = user.user_id,
        rows = out.rows.len(),
        skipped = out.skipped.len(),
        "eligibility recalculated"
    );

    Ok(EligibilityReport {
        user_id: user.user_id,
        program_id: reqs.program_id.clone(),
        gpa: user.gpa,
        meets_min_gpa: user.gpa >= reqs.min_gpa,
        rows: out.rows,
        core: CreditTally { completed: core_completed, required: reqs.core_credit_req },
        core_options: CreditTally { completed: core_options_completed, required: reqs.core_options_credit_req },
        electives: CreditTally { completed: totals.credits, required: reqs.elective_credit_req },
        elective_credits_by_subject: totals.by_subject,
        subject_areas,
        total_counted_credits,
        max_credit_hours: reqs.max_credit_hours,
        skipped: out.skipped,
    })
}
