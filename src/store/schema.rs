// DDL del warehouse de advising. SQLite y Postgres difieren sólo en tipos y
// en cómo se generan los ids; las columnas son las mismas.

pub const SQLITE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS PROGRAM_REQUIREMENTS (
    PROGRAM_ID TEXT PRIMARY KEY,
    PROGRAM_NAME TEXT,
    MAX_CREDIT_HOURS REAL,
    MIN_GPA REAL,
    CORE_CREDIT_REQ REAL,
    CORE_OPTIONS_CREDIT_REQ REAL,
    ELECTIVE_CREDIT_REQ REAL,
    SUBJECT_CREDIT_REQ REAL,
    ELECTIVE_EXCEPTION TEXT
);

CREATE TABLE IF NOT EXISTS COURSE_CATALOG (
    COURSE_CODE TEXT PRIMARY KEY,
    COURSE_NAME TEXT,
    PREREQUISITES TEXT,
    CREDITS REAL NOT NULL,
    SUBJECT_CODE TEXT
);

CREATE TABLE IF NOT EXISTS SUBJECT_AREAS (
    PROGRAM_ID TEXT NOT NULL,
    SUBJECT_CODE TEXT NOT NULL,
    MIN_CREDIT_HOURS REAL NOT NULL,
    PRIMARY KEY (PROGRAM_ID, SUBJECT_CODE)
);

CREATE TABLE IF NOT EXISTS CORE_REQUIREMENTS (
    ID INTEGER PRIMARY KEY AUTOINCREMENT,
    PROGRAM_ID TEXT NOT NULL,
    COURSE_CODE TEXT NOT NULL,
    UNIQUE (PROGRAM_ID, COURSE_CODE)
);

CREATE TABLE IF NOT EXISTS CORE_OPTIONS_REQUIREMENTS (
    ID INTEGER PRIMARY KEY AUTOINCREMENT,
    PROGRAM_ID TEXT NOT NULL,
    COURSE_CODE TEXT NOT NULL,
    UNIQUE (PROGRAM_ID, COURSE_CODE)
);

CREATE TABLE IF NOT EXISTS ELECTIVE_REQUIREMENTS (
    PROGRAM_ID TEXT NOT NULL,
    SUBJECT_CODE TEXT NOT NULL,
    PRIMARY KEY (PROGRAM_ID, SUBJECT_CODE)
);

CREATE TABLE IF NOT EXISTS USER_PROFILE (
    USER_ID INTEGER PRIMARY KEY,
    USERNAME TEXT,
    GPA REAL,
    PROGRAM_ID TEXT,
    PROGRAM_NAME TEXT,
    CAMPUS TEXT,
    COLLEGE TEXT
);

CREATE TABLE IF NOT EXISTS USER_COURSES (
    ID INTEGER PRIMARY KEY AUTOINCREMENT,
    USER_ID INTEGER NOT NULL,
    COURSE_CODE TEXT NOT NULL,
    COURSE_NAME TEXT,
    GRADE TEXT NOT NULL,
    CREDITS REAL NOT NULL,
    UNIQUE (USER_ID, COURSE_CODE)
);

CREATE TABLE IF NOT EXISTS USER_ELIGIBILITY (
    USER_ID INTEGER NOT NULL,
    ORDINAL INTEGER NOT NULL,
    COURSE_OR_REQUIREMENT TEXT NOT NULL,
    ELIGIBLE INTEGER NOT NULL,
    DETAILS TEXT NOT NULL,
    STATUS TEXT NOT NULL DEFAULT 'PENDING',
    CHECK_DATE TEXT NOT NULL,
    PRIMARY KEY (USER_ID, ORDINAL)
);
";

pub const POSTGRES_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS PROGRAM_REQUIREMENTS (
    PROGRAM_ID TEXT PRIMARY KEY,
    PROGRAM_NAME TEXT,
    MAX_CREDIT_HOURS DOUBLE PRECISION,
    MIN_GPA DOUBLE PRECISION,
    CORE_CREDIT_REQ DOUBLE PRECISION,
    CORE_OPTIONS_CREDIT_REQ DOUBLE PRECISION,
    ELECTIVE_CREDIT_REQ DOUBLE PRECISION,
    SUBJECT_CREDIT_REQ DOUBLE PRECISION,
    ELECTIVE_EXCEPTION TEXT
);

CREATE TABLE IF NOT EXISTS COURSE_CATALOG (
    COURSE_CODE TEXT PRIMARY KEY,
    COURSE_NAME TEXT,
    PREREQUISITES TEXT,
    CREDITS DOUBLE PRECISION NOT NULL,
    SUBJECT_CODE TEXT
);

CREATE TABLE IF NOT EXISTS SUBJECT_AREAS (
    PROGRAM_ID TEXT NOT NULL,
    SUBJECT_CODE TEXT NOT NULL,
    MIN_CREDIT_HOURS DOUBLE PRECISION NOT NULL,
    PRIMARY KEY (PROGRAM_ID, SUBJECT_CODE)
);

CREATE TABLE IF NOT EXISTS CORE_REQUIREMENTS (
    ID BIGSERIAL PRIMARY KEY,
    PROGRAM_ID TEXT NOT NULL,
    COURSE_CODE TEXT NOT NULL,
    UNIQUE (PROGRAM_ID, COURSE_CODE)
);

CREATE TABLE IF NOT EXISTS CORE_OPTIONS_REQUIREMENTS (
    ID BIGSERIAL PRIMARY KEY,
    PROGRAM_ID TEXT NOT NULL,
    COURSE_CODE TEXT NOT NULL,
    UNIQUE (PROGRAM_ID, COURSE_CODE)
);

CREATE TABLE IF NOT EXISTS ELECTIVE_REQUIREMENTS (
    PROGRAM_ID TEXT NOT NULL,
    SUBJECT_CODE TEXT NOT NULL,
    PRIMARY KEY (PROGRAM_ID, SUBJECT_CODE)
);

CREATE TABLE IF NOT EXISTS USER_PROFILE (
    USER_ID BIGINT PRIMARY KEY,
    USERNAME TEXT,
    GPA DOUBLE PRECISION,
    PROGRAM_ID TEXT,
    PROGRAM_NAME TEXT,
    CAMPUS TEXT,
    COLLEGE TEXT
);

CREATE TABLE IF NOT EXISTS USER_COURSES (
    ID BIGSERIAL PRIMARY KEY,
    USER_ID BIGINT NOT NULL,
    COURSE_CODE TEXT NOT NULL,
    COURSE_NAME TEXT,
    GRADE TEXT NOT NULL,
    CREDITS DOUBLE PRECISION NOT NULL,
    UNIQUE (USER_ID, COURSE_CODE)
);

CREATE TABLE IF NOT EXISTS USER_ELIGIBILITY (
    USER_ID BIGINT NOT NULL,
    ORDINAL BIGINT NOT NULL,
    COURSE_OR_REQUIREMENT TEXT NOT NULL,
    ELIGIBLE BOOLEAN NOT NULL,
    DETAILS TEXT NOT NULL,
    STATUS TEXT NOT NULL DEFAULT 'PENDING',
    CHECK_DATE TEXT NOT NULL,
    PRIMARY KEY (USER_ID, ORDINAL)
);
";
