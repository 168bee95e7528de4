use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    AssessmentRecord, RiskScores, SnapshotRecord, StudentSnapshot, Warning, WarningRecord,
};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let students = vec![
        (
            Uuid::parse_str("7f3b7a64-5a1e-4a0b-9f0a-2d4c8e1b6a91")?,
            "HSU-1001",
            "Maya Torres",
            "maya.torres@hsu.edu",
        ),
        (
            Uuid::parse_str("1c9e2b3d-6f42-4c1a-8e5b-9a7d0c4f2e13")?,
            "HSU-1002",
            "Devon Clark",
            "devon.clark@hsu.edu",
        ),
        (
            Uuid::parse_str("b4d81f26-0e7c-4953-a6d2-57c3f9e8104b")?,
            "HSU-1003",
            "Lena Fischer",
            "lena.fischer@hsu.edu",
        ),
    ];

    for (id, key, name, email) in students {
        sqlx::query(
            r#"
            INSERT INTO retention_early_warning.students (id, student_key, full_name, email)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (student_key) DO UPDATE
            SET full_name = EXCLUDED.full_name, email = EXCLUDED.email
            "#,
        )
        .bind(id)
        .bind(key)
        .bind(name)
        .bind(email)
        .execute(pool)
        .await?;
    }

    let recorded_at = NaiveDate::from_ymd_opt(2025, 12, 5).context("invalid date")?;
    let snapshots = vec![
        (
            "Fall 2025",
            StudentSnapshot {
                student_id: "HSU-1001".to_string(),
                gpa: 1.5,
                credits_completed: 20,
                credits_attempted: 40,
                attendance_rate: 0.55,
                engagement_score: 0.20,
                has_financial_aid: true,
                is_first_generation: true,
                financial_hold: false,
                crisis_flag: false,
                counseling_visits: 0,
            },
        ),
        (
            "Fall 2025",
            StudentSnapshot {
                student_id: "HSU-1002".to_string(),
                gpa: 2.8,
                credits_completed: 55,
                credits_attempted: 60,
                attendance_rate: 0.72,
                engagement_score: 0.60,
                has_financial_aid: false,
                is_first_generation: false,
                financial_hold: false,
                crisis_flag: false,
                counseling_visits: 0,
            },
        ),
        (
            "Fall 2025",
            StudentSnapshot {
                student_id: "HSU-1003".to_string(),
                gpa: 3.5,
                credits_completed: 75,
                credits_attempted: 75,
                attendance_rate: 0.95,
                engagement_score: 0.90,
                has_financial_aid: false,
                is_first_generation: false,
                financial_hold: false,
                crisis_flag: false,
                counseling_visits: 0,
            },
        ),
    ];

    for (term, snapshot) in snapshots {
        let student_pk: Uuid = sqlx::query(
            "SELECT id FROM retention_early_warning.students WHERE student_key = $1",
        )
        .bind(&snapshot.student_id)
        .fetch_one(pool)
        .await?
        .get("id");

        upsert_snapshot(pool, student_pk, term, &snapshot, recorded_at).await?;
    }

    Ok(())
}

async fn upsert_snapshot(
    pool: &PgPool,
    student_pk: Uuid,
    term: &str,
    snapshot: &StudentSnapshot,
    recorded_at: NaiveDate,
) -> anyhow::Result<()> {
    let credits_completed =
        i32::try_from(snapshot.credits_completed).context("credit count too large")?;
    let credits_attempted =
        i32::try_from(snapshot.credits_attempted).context("credit count too large")?;
    let counseling_visits =
        i32::try_from(snapshot.counseling_visits).context("counseling visit count too large")?;

    sqlx::query(
        r#"
        INSERT INTO retention_early_warning.snapshots
        (id, student_id, term, gpa, credits_completed, credits_attempted,
         attendance_rate, engagement_score, has_financial_aid, is_first_generation,
         financial_hold, crisis_flag, counseling_visits, recorded_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        ON CONFLICT (student_id, term) DO UPDATE
        SET gpa = EXCLUDED.gpa,
            credits_completed = EXCLUDED.credits_completed,
            credits_attempted = EXCLUDED.credits_attempted,
            attendance_rate = EXCLUDED.attendance_rate,
            engagement_score = EXCLUDED.engagement_score,
            has_financial_aid = EXCLUDED.has_financial_aid,
            is_first_generation = EXCLUDED.is_first_generation,
            financial_hold = EXCLUDED.financial_hold,
            crisis_flag = EXCLUDED.crisis_flag,
            counseling_visits = EXCLUDED.counseling_visits,
            recorded_at = EXCLUDED.recorded_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_pk)
    .bind(term)
    .bind(snapshot.gpa)
    .bind(credits_completed)
    .bind(credits_attempted)
    .bind(snapshot.attendance_rate)
    .bind(snapshot.engagement_score)
    .bind(snapshot.has_financial_aid)
    .bind(snapshot.is_first_generation)
    .bind(snapshot.financial_hold)
    .bind(snapshot.crisis_flag)
    .bind(counseling_visits)
    .bind(recorded_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        student_key: String,
        full_name: String,
        email: String,
        term: String,
        gpa: f64,
        credits_completed: u32,
        credits_attempted: u32,
        attendance_rate: f64,
        engagement_score: f64,
        has_financial_aid: bool,
        is_first_generation: bool,
        #[serde(default)]
        financial_hold: bool,
        #[serde(default)]
        crisis_flag: bool,
        #[serde(default)]
        counseling_visits: u32,
        recorded_at: NaiveDate,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut imported = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let student_pk: Uuid = sqlx::query(
            r#"
            INSERT INTO retention_early_warning.students (id, student_key, full_name, email)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (student_key) DO UPDATE
            SET full_name = EXCLUDED.full_name, email = EXCLUDED.email
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.student_key)
        .bind(&row.full_name)
        .bind(&row.email)
        .fetch_one(pool)
        .await?
        .get("id");

        let snapshot = StudentSnapshot {
            student_id: row.student_key,
            gpa: row.gpa,
            credits_completed: row.credits_completed,
            credits_attempted: row.credits_attempted,
            attendance_rate: row.attendance_rate,
            engagement_score: row.engagement_score,
            has_financial_aid: row.has_financial_aid,
            is_first_generation: row.is_first_generation,
            financial_hold: row.financial_hold,
            crisis_flag: row.crisis_flag,
            counseling_visits: row.counseling_visits,
        };

        upsert_snapshot(pool, student_pk, &row.term, &snapshot, row.recorded_at).await?;
        imported += 1;
    }

    Ok(imported)
}

pub async fn fetch_snapshots(
    pool: &PgPool,
    student: Option<&str>,
    term: Option<&str>,
) -> anyhow::Result<Vec<SnapshotRecord>> {
    let mut query = String::from(
        "SELECT st.id as student_pk, st.student_key, st.full_name, st.email, \
         sn.term, sn.gpa, sn.credits_completed, sn.credits_attempted, \
         sn.attendance_rate, sn.engagement_score, sn.has_financial_aid, \
         sn.is_first_generation, sn.financial_hold, sn.crisis_flag, sn.counseling_visits \
         FROM retention_early_warning.snapshots sn \
         JOIN retention_early_warning.students st ON st.id = sn.student_id",
    );

    if student.is_some() {
        query.push_str(" WHERE st.student_key = $1");
    } else if term.is_some() {
        query.push_str(" WHERE sn.term = $1");
    }
    query.push_str(" ORDER BY st.student_key, sn.term");

    let mut rows = sqlx::query(&query);
    if let Some(value) = student {
        rows = rows.bind(value);
    } else if let Some(value) = term {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut snapshots = Vec::new();

    for row in records {
        let credits_completed: i32 = row.get("credits_completed");
        let credits_attempted: i32 = row.get("credits_attempted");
        let counseling_visits: i32 = row.get("counseling_visits");

        snapshots.push(SnapshotRecord {
            student_pk: row.get("student_pk"),
            full_name: row.get("full_name"),
            email: row.get("email"),
            term: row.get("term"),
            snapshot: StudentSnapshot {
                student_id: row.get("student_key"),
                gpa: row.get("gpa"),
                credits_completed: u32::try_from(credits_completed)
                    .context("negative credit count in database")?,
                credits_attempted: u32::try_from(credits_attempted)
                    .context("negative credit count in database")?,
                attendance_rate: row.get("attendance_rate"),
                engagement_score: row.get("engagement_score"),
                has_financial_aid: row.get("has_financial_aid"),
                is_first_generation: row.get("is_first_generation"),
                financial_hold: row.get("financial_hold"),
                crisis_flag: row.get("crisis_flag"),
                counseling_visits: u32::try_from(counseling_visits)
                    .context("negative counseling visit count in database")?,
            },
        });
    }

    Ok(snapshots)
}

pub async fn store_assessment(
    pool: &PgPool,
    record: &SnapshotRecord,
    scores: &RiskScores,
    warnings: &[Warning],
    calculated_at: DateTime<Utc>,
) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE retention_early_warning.assessments SET is_current = FALSE \
         WHERE student_id = $1 AND term = $2",
    )
    .bind(record.student_pk)
    .bind(&record.term)
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO retention_early_warning.assessments
        (id, student_id, term, academic_risk, engagement_risk, financial_risk,
         wellness_risk, overall_risk, risk_category, risk_pathway, is_current, calculated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, TRUE, $11)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(record.student_pk)
    .bind(&record.term)
    .bind(scores.academic_risk)
    .bind(scores.engagement_risk)
    .bind(scores.financial_risk)
    .bind(scores.wellness_risk)
    .bind(scores.overall_risk)
    .bind(scores.risk_category.as_str())
    .bind(scores.risk_pathway)
    .bind(calculated_at)
    .execute(pool)
    .await?;

    // The warning set for a snapshot is replaced wholesale on reassessment.
    sqlx::query(
        "DELETE FROM retention_early_warning.warnings WHERE student_id = $1 AND term = $2",
    )
    .bind(record.student_pk)
    .bind(&record.term)
    .execute(pool)
    .await?;

    for warning in warnings {
        sqlx::query(
            r#"
            INSERT INTO retention_early_warning.warnings
            (id, student_id, term, warning_type, severity, message, generated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.student_pk)
        .bind(&record.term)
        .bind(warning.warning_type.label())
        .bind(warning.severity.as_str())
        .bind(&warning.message)
        .bind(warning.generated_at)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn fetch_assessments(
    pool: &PgPool,
    student: Option<&str>,
    term: Option<&str>,
) -> anyhow::Result<Vec<AssessmentRecord>> {
    let mut query = String::from(
        "SELECT st.student_key, st.full_name, st.email, a.term, \
         a.overall_risk, a.risk_category, a.risk_pathway \
         FROM retention_early_warning.assessments a \
         JOIN retention_early_warning.students st ON st.id = a.student_id \
         WHERE a.is_current",
    );

    if student.is_some() {
        query.push_str(" AND st.student_key = $1");
    } else if term.is_some() {
        query.push_str(" AND a.term = $1");
    }
    query.push_str(" ORDER BY a.overall_risk DESC, st.student_key");

    let mut rows = sqlx::query(&query);
    if let Some(value) = student {
        rows = rows.bind(value);
    } else if let Some(value) = term {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut assessments = Vec::new();

    for row in records {
        assessments.push(AssessmentRecord {
            student_key: row.get("student_key"),
            full_name: row.get("full_name"),
            email: row.get("email"),
            term: row.get("term"),
            overall_risk: row.get("overall_risk"),
            risk_category: row.get("risk_category"),
            risk_pathway: row.get("risk_pathway"),
        });
    }

    Ok(assessments)
}

pub async fn fetch_warnings(
    pool: &PgPool,
    student: Option<&str>,
    term: Option<&str>,
) -> anyhow::Result<Vec<WarningRecord>> {
    let mut query = String::from(
        "SELECT st.student_key, st.full_name, w.term, w.warning_type, \
         w.severity, w.message, w.generated_at \
         FROM retention_early_warning.warnings w \
         JOIN retention_early_warning.students st ON st.id = w.student_id",
    );

    if student.is_some() {
        query.push_str(" WHERE st.student_key = $1");
    } else if term.is_some() {
        query.push_str(" WHERE w.term = $1");
    }
    query.push_str(" ORDER BY w.generated_at DESC, st.student_key");

    let mut rows = sqlx::query(&query);
    if let Some(value) = student {
        rows = rows.bind(value);
    } else if let Some(value) = term {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut warnings = Vec::new();

    for row in records {
        warnings.push(WarningRecord {
            student_key: row.get("student_key"),
            full_name: row.get("full_name"),
            term: row.get("term"),
            warning_type: row.get("warning_type"),
            severity: row.get("severity"),
            message: row.get("message"),
            generated_at: row.get("generated_at"),
        });
    }

    Ok(warnings)
}
