use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

mod db;
mod models;
mod report;
mod risk;
mod warnings;

#[derive(Parser)]
#[command(name = "retention-early-warning")]
#[command(about = "Dropout risk scoring and early warning tracker for Hope State University", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo students and metric snapshots
    Seed,
    /// Import metric snapshots from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Score dropout risk and persist warnings
    #[command(group(
        ArgGroup::new("scope")
            .args(["student", "term"])
            .multiple(false)
    ))]
    Assess {
        #[arg(long)]
        student: Option<String>,
        #[arg(long)]
        term: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    #[command(group(
        ArgGroup::new("scope")
            .args(["student", "term"])
            .multiple(false)
    ))]
    Report {
        #[arg(long)]
        student: Option<String>,
        #[arg(long)]
        term: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let imported = db::import_csv(&pool, &csv).await?;
            println!("Imported {imported} snapshots from {}.", csv.display());
        }
        Commands::Assess {
            student,
            term,
            limit,
            json,
        } => {
            let snapshots =
                db::fetch_snapshots(&pool, student.as_deref(), term.as_deref()).await?;

            if snapshots.is_empty() {
                println!("No snapshots found for this scope.");
                return Ok(());
            }

            let assessed_at = Utc::now();
            let mut assessed = Vec::new();

            for record in snapshots {
                let scores = risk::compute_risk_scores(&record.snapshot).with_context(|| {
                    format!("invalid snapshot for student {}", record.snapshot.student_id)
                })?;
                let student_warnings = warnings::generate_warnings(&record.snapshot, assessed_at);
                db::store_assessment(&pool, &record, &scores, &student_warnings, assessed_at)
                    .await?;
                assessed.push((record, scores, student_warnings));
            }

            assessed.sort_by(|a, b| {
                b.1.overall_risk
                    .partial_cmp(&a.1.overall_risk)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            if json {
                #[derive(serde::Serialize)]
                struct AssessmentOutput<'a> {
                    student_id: &'a str,
                    full_name: &'a str,
                    email: &'a str,
                    term: &'a str,
                    scores: &'a models::RiskScores,
                    warnings: &'a [models::Warning],
                }

                let documents: Vec<AssessmentOutput> = assessed
                    .iter()
                    .map(|(record, scores, student_warnings)| AssessmentOutput {
                        student_id: &record.snapshot.student_id,
                        full_name: &record.full_name,
                        email: &record.email,
                        term: &record.term,
                        scores,
                        warnings: student_warnings,
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&documents)?);
            } else {
                println!("Students by dropout risk:");
                for (record, scores, student_warnings) in assessed.iter().take(limit) {
                    println!(
                        "- {} ({}, {}) risk {:.0}/100 [{}] {} warnings",
                        record.full_name,
                        record.snapshot.student_id,
                        record.term,
                        scores.overall_risk * 100.0,
                        scores.risk_category.as_str(),
                        student_warnings.len()
                    );
                    for warning in student_warnings {
                        println!(
                            "    [{}] {}: {}",
                            warning.severity.as_str(),
                            warning.warning_type.label(),
                            warning.message
                        );
                    }
                }
            }
        }
        Commands::Report { student, term, out } => {
            let assessments =
                db::fetch_assessments(&pool, student.as_deref(), term.as_deref()).await?;
            let warning_rows =
                db::fetch_warnings(&pool, student.as_deref(), term.as_deref()).await?;
            let scope = student.as_deref().or(term.as_deref());
            let report = report::build_report(
                scope,
                Utc::now().date_naive(),
                &assessments,
                &warning_rows,
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
