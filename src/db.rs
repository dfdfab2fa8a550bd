use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;

use crate::model::NormalizedPosting;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS job (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            title           VARCHAR(225),
            industry        VARCHAR(225),
            description     TEXT,
            employment_type VARCHAR(125),
            date_posted     DATE
        );

        CREATE TABLE IF NOT EXISTS company (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            job_id  INTEGER,
            name    VARCHAR(225),
            link    TEXT,
            FOREIGN KEY (job_id) REFERENCES job(id)
        );

        CREATE TABLE IF NOT EXISTS education (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            job_id              INTEGER,
            required_credential VARCHAR(225),
            FOREIGN KEY (job_id) REFERENCES job(id)
        );

        CREATE TABLE IF NOT EXISTS experience (
            id                   INTEGER PRIMARY KEY AUTOINCREMENT,
            job_id               INTEGER,
            months_of_experience INTEGER,
            seniority_level      VARCHAR(25),
            FOREIGN KEY (job_id) REFERENCES job(id)
        );

        CREATE TABLE IF NOT EXISTS salary (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            job_id    INTEGER,
            currency  VARCHAR(3),
            min_value NUMERIC,
            max_value NUMERIC,
            unit      VARCHAR(12),
            FOREIGN KEY (job_id) REFERENCES job(id)
        );

        CREATE TABLE IF NOT EXISTS location (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            job_id         INTEGER,
            country        VARCHAR(60),
            locality       VARCHAR(60),
            region         VARCHAR(60),
            postal_code    VARCHAR(25),
            street_address VARCHAR(225),
            latitude       NUMERIC,
            longitude      NUMERIC,
            FOREIGN KEY (job_id) REFERENCES job(id)
        );
        ",
    )?;
    Ok(())
}

/// Insert one posting across the six tables in a single transaction: the job
/// row first, then the five child rows carrying its generated id. Unknown
/// numeric fields bind as NULL, never zero. Returns the job id.
pub fn insert_posting(conn: &Connection, posting: &NormalizedPosting) -> Result<i64> {
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO job (title, industry, description, employment_type, date_posted)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            posting.job.title,
            posting.job.industry,
            posting.job.description,
            posting.job.employment_type,
            posting.job.date_posted,
        ],
    )?;
    let job_id = tx.last_insert_rowid();

    tx.execute(
        "INSERT INTO company (job_id, name, link) VALUES (?1, ?2, ?3)",
        rusqlite::params![job_id, posting.company.name, posting.company.link],
    )?;
    tx.execute(
        "INSERT INTO education (job_id, required_credential) VALUES (?1, ?2)",
        rusqlite::params![job_id, posting.education.required_credential],
    )?;
    tx.execute(
        "INSERT INTO experience (job_id, months_of_experience, seniority_level)
         VALUES (?1, ?2, ?3)",
        rusqlite::params![
            job_id,
            posting.experience.months_of_experience,
            posting.experience.seniority_level,
        ],
    )?;
    tx.execute(
        "INSERT INTO salary (job_id, currency, min_value, max_value, unit)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            job_id,
            posting.salary.currency,
            posting.salary.min_value,
            posting.salary.max_value,
            posting.salary.unit,
        ],
    )?;
    tx.execute(
        "INSERT INTO location (job_id, country, locality, region, postal_code,
                               street_address, latitude, longitude)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            job_id,
            posting.location.country,
            posting.location.locality,
            posting.location.region,
            posting.location.postal_code,
            posting.location.street_address,
            posting.location.latitude,
            posting.location.longitude,
        ],
    )?;

    tx.commit()?;
    Ok(job_id)
}

pub struct Stats {
    pub jobs: usize,
    pub companies: usize,
    pub educations: usize,
    pub experiences: usize,
    pub salaries: usize,
    pub locations: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let count = |table: &str| -> Result<usize> {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?)
    };
    Ok(Stats {
        jobs: count("job")?,
        companies: count("company")?,
        educations: count("education")?,
        experiences: count("experience")?,
        salaries: count("salary")?,
        locations: count("location")?,
    })
}
