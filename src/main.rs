mod db;
mod model;
mod pipeline;
mod source;
mod staging;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "jobs_etl", about = "Normalize JSON-LD job postings into SQLite")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the target tables (idempotent)
    Init {
        /// SQLite database path
        #[arg(long, default_value = "data/jobs.sqlite")]
        db: PathBuf,
    },
    /// Read raw postings from the source CSV into the staging area
    Extract {
        /// Source CSV with a `context` column of JSON-LD postings
        #[arg(long, default_value = "source/jobs.csv")]
        source: PathBuf,
        /// Staging directory for intermediate files
        #[arg(long, default_value = "staging")]
        staging: PathBuf,
    },
    /// Normalize extracted records (flatten fields, clean descriptions)
    Transform {
        #[arg(long, default_value = "staging")]
        staging: PathBuf,
    },
    /// Insert transformed postings into the database
    Load {
        #[arg(long, default_value = "staging")]
        staging: PathBuf,
        #[arg(long, default_value = "data/jobs.sqlite")]
        db: PathBuf,
    },
    /// Full pipeline: init + extract + transform + load, retried on failure
    Run {
        #[arg(long, default_value = "source/jobs.csv")]
        source: PathBuf,
        #[arg(long, default_value = "staging")]
        staging: PathBuf,
        #[arg(long, default_value = "data/jobs.sqlite")]
        db: PathBuf,
        /// Extra attempts after a failed run
        #[arg(long, default_value = "3")]
        retries: u32,
    },
    /// Row counts per table and staged file counts
    Stats {
        #[arg(long, default_value = "staging")]
        staging: PathBuf,
        #[arg(long, default_value = "data/jobs.sqlite")]
        db: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { db } => {
            let conn = db::connect(&db)?;
            db::init_schema(&conn)?;
            println!("Tables ready in {}", db.display());
            Ok(())
        }
        Commands::Extract { source, staging } => {
            let counts = pipeline::extract_stage(&source, &staging)?;
            counts.print("extract");
            Ok(())
        }
        Commands::Transform { staging } => {
            let counts = pipeline::transform_stage(&staging)?;
            counts.print("transform");
            Ok(())
        }
        Commands::Load { staging, db } => {
            let conn = db::connect(&db)?;
            db::init_schema(&conn)?;
            let loaded = pipeline::load_stage(&staging, &conn)?;
            println!("load: {} postings inserted", loaded);
            Ok(())
        }
        Commands::Run {
            source,
            staging,
            db,
            retries,
        } => {
            let loaded = pipeline::run_with_retry(retries, Duration::from_secs(2), || {
                let conn = db::connect(&db)?;
                db::init_schema(&conn)?;

                let extracted = pipeline::extract_stage(&source, &staging)?;
                extracted.print("extract");

                let transformed = pipeline::transform_stage(&staging)?;
                transformed.print("transform");

                pipeline::load_stage(&staging, &conn)
            })?;
            println!("load: {} postings inserted", loaded);
            Ok(())
        }
        Commands::Stats { staging, db } => {
            let conn = db::connect(&db)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            let (extracted, transformed) = staging::count_staged(&staging);
            println!("Staged:     {} extracted, {} transformed", extracted, transformed);
            println!("Jobs:       {}", s.jobs);
            println!("Companies:  {}", s.companies);
            println!("Education:  {}", s.educations);
            println!("Experience: {}", s.experiences);
            println!("Salaries:   {}", s.salaries);
            println!("Locations:  {}", s.locations);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
