use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{fmt, EnvFilter};

use campus_reports::artifacts::ArtifactStore;
use campus_reports::db::PgRowSource;
use campus_reports::filters::RawReportQuery;
use campus_reports::models::{ExportFormat, ReportKind};
use campus_reports::report;
use campus_reports::source::{CsvRowSource, RowSource};

#[derive(Parser)]
#[command(name = "campus-reports")]
#[command(about = "Student and faculty report generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a student report
    Students {
        #[arg(long)]
        department_id: Option<String>,
        #[arg(long)]
        course_id: Option<String>,
        #[arg(long)]
        academic_year: Option<String>,
        /// Export format: pdf or excel (omit for preview only)
        #[arg(long)]
        format: Option<String>,
        /// Read rows from a CSV export instead of the database
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long, default_value = "reports")]
        out_dir: PathBuf,
    },
    /// Generate a faculty report
    Faculty {
        #[arg(long)]
        department_id: Option<String>,
        #[arg(long)]
        employment_type: Option<String>,
        /// Export format: pdf or excel (omit for preview only)
        #[arg(long)]
        format: Option<String>,
        /// Read rows from a CSV export instead of the database
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long, default_value = "reports")]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Students {
            department_id,
            course_id,
            academic_year,
            format,
            csv,
            out_dir,
        } => {
            let raw = RawReportQuery {
                department_id,
                course_id,
                academic_year,
                employment_type: None,
            };
            run_report(ReportKind::Student, raw, format, csv, out_dir).await?;
        }
        Commands::Faculty {
            department_id,
            employment_type,
            format,
            csv,
            out_dir,
        } => {
            let raw = RawReportQuery {
                department_id,
                course_id: None,
                academic_year: None,
                employment_type,
            };
            run_report(ReportKind::Faculty, raw, format, csv, out_dir).await?;
        }
    }

    Ok(())
}

async fn run_report(
    kind: ReportKind,
    raw: RawReportQuery,
    format: Option<String>,
    csv: Option<PathBuf>,
    out_dir: PathBuf,
) -> anyhow::Result<()> {
    let source: Box<dyn RowSource> = match csv {
        Some(path) => Box::new(CsvRowSource::new(path)),
        None => {
            let database_url = std::env::var("DATABASE_URL")
                .context("DATABASE_URL must be set when --csv is not used")?;
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await
                .context("failed to connect to Postgres")?;
            Box::new(PgRowSource::new(pool))
        }
    };

    let store = ArtifactStore::new(&out_dir);
    let format = format.as_deref().and_then(ExportFormat::from_query);
    let result = report::generate_report(source.as_ref(), &store, kind, &raw, format).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(url) = &result.download_url {
        if let Some(filename) = url.rsplit('/').next() {
            println!("Document written to {}.", out_dir.join(filename).display());
        }
    }

    Ok(())
}
