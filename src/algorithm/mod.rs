// Módulo de alto nivel del motor de elegibilidad
// Declarar submódulos (archivos en la carpeta `src/algorithm`)
pub mod grades;
pub mod prerequisites;
pub mod classification;
pub mod engine;

// Reexportar solo la API pública que se usa desde fuera
pub use grades::{meets, Grade, IN_PROGRESS_TOKEN};
pub use prerequisites::{check_prerequisites, parse_prerequisites, Prerequisite, PrerequisiteCheck};
pub use classification::{Category, CourseClassification};
pub use engine::{evaluate, ELECTIVES_CODE, SUBJECT_AREA_PREFIX};
