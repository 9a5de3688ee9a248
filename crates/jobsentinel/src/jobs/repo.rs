use crate::jobs::model::{DecisionReason, Job, JobStatus, NewJob};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

/// Snapshot of row counts per status, served by the admin API.
#[derive(Debug, Default, Serialize)]
pub struct StatusCounts {
    pub queued: i64,
    pub skipped: i64,
    pub review: i64,
    pub rejected: i64,
    pub applied: i64,
    pub deferred: i64,
    pub applied_today: i64,
}

/// Durable job record store, keyed by `job_key`. The single source of
/// truth between cycles; the orchestrator holds no job state of its own.
///
/// Updates against a missing key are harmless no-ops: the caller is
/// assumed to have just read the row. Rows whose status reached
/// `applied` are frozen; every UPDATE here carries that guard.
#[derive(Clone)]
pub struct JobsRepo {
    pool: SqlitePool,
}

impl JobsRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ----------------------------
    // Ingestion
    // ----------------------------

    pub async fn has_seen(&self, job_key: &str) -> anyhow::Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE job_key = ?1")
            .bind(job_key)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Inserts with `status = queued`. Idempotent: re-inserting a seen
    /// key leaves the existing row untouched.
    pub async fn enqueue(&self, job: &NewJob) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO jobs (
                job_key, platform, title, company, location, description, job_url,
                status, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'queued', ?8, ?8)
            "#,
        )
        .bind(&job.job_key)
        .bind(&job.platform)
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.location)
        .bind(&job.description)
        .bind(&job.job_url)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ----------------------------
    // Reads
    // ----------------------------

    pub async fn get(&self, job_key: &str) -> anyhow::Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE job_key = ?1")
            .bind(job_key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    /// Oldest queued job by `created_at`: the apply phase's FIFO pop.
    /// Callers are serialized (single apply worker per cycle), which is
    /// what keeps one job from being handed out twice.
    pub async fn next_queued(&self) -> anyhow::Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(
            r#"
            SELECT *
            FROM jobs
            WHERE status = 'queued'
            ORDER BY created_at ASC, job_key ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    /// Read-only projection for the dashboard; empty filter slices mean
    /// "any". Limit is clamped to [1, 500].
    pub async fn list(
        &self,
        statuses: &[String],
        platforms: &[String],
        easy_apply: Option<bool>,
        limit: i64,
    ) -> anyhow::Result<Vec<Job>> {
        let limit = limit.clamp(1, 500);

        let mut sql = String::from("SELECT * FROM jobs WHERE 1 = 1");
        if !statuses.is_empty() {
            sql.push_str(" AND status IN (");
            sql.push_str(&vec!["?"; statuses.len()].join(", "));
            sql.push(')');
        }
        if !platforms.is_empty() {
            sql.push_str(" AND platform IN (");
            sql.push_str(&vec!["?"; platforms.len()].join(", "));
            sql.push(')');
        }
        if easy_apply.is_some() {
            sql.push_str(" AND easy_apply = ?");
        }
        sql.push_str(" ORDER BY created_at DESC, job_key DESC LIMIT ?");

        let mut query = sqlx::query_as::<_, Job>(&sql);
        for status in statuses {
            query = query.bind(status);
        }
        for platform in platforms {
            query = query.bind(platform);
        }
        if let Some(easy) = easy_apply {
            query = query.bind(easy);
        }
        query = query.bind(limit);

        Ok(query.fetch_all(&self.pool).await?)
    }

    // ----------------------------
    // State transitions
    // ----------------------------

    pub async fn set_status(&self, job_key: &str, status: JobStatus) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = ?2,
                updated_at = ?3,
                applied_at = CASE WHEN ?2 = 'applied' THEN ?3 ELSE applied_at END
            WHERE job_key = ?1
              AND status <> 'applied'
            "#,
        )
        .bind(job_key)
        .bind(status.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Terminal write of the apply phase: status plus the adapter's
    /// `easy_apply` report in one statement, `applied_at` stamped on the
    /// applied transition and never supplied by the caller.
    pub async fn set_apply_outcome(
        &self,
        job_key: &str,
        status: JobStatus,
        easy_apply: Option<bool>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = ?2,
                easy_apply = ?3,
                updated_at = ?4,
                applied_at = CASE WHEN ?2 = 'applied' THEN ?4 ELSE applied_at END
            WHERE job_key = ?1
              AND status <> 'applied'
            "#,
        )
        .bind(job_key)
        .bind(status.as_str())
        .bind(easy_apply)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn record_decision(
        &self,
        job_key: &str,
        reason: DecisionReason,
        score: i64,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET decision = ?2,
                score = ?3,
                updated_at = ?4
            WHERE job_key = ?1
              AND status <> 'applied'
            "#,
        )
        .bind(job_key)
        .bind(reason.as_str())
        .bind(score)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Best-effort fill-in from an enricher; blank fields never clobber
    /// what the collector already supplied.
    pub async fn store_enrichment(
        &self,
        job_key: &str,
        description: &str,
        company: &str,
        location: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET description = CASE WHEN ?2 <> '' THEN ?2 ELSE description END,
                company     = CASE WHEN ?3 <> '' THEN ?3 ELSE company END,
                location    = CASE WHEN ?4 <> '' THEN ?4 ELSE location END,
                updated_at = ?5
            WHERE job_key = ?1
              AND status <> 'applied'
            "#,
        )
        .bind(job_key)
        .bind(description)
        .bind(company)
        .bind(location)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Puts a single non-applied row back on the queue (dashboard action).
    pub async fn requeue(&self, job_key: &str) -> anyhow::Result<()> {
        self.set_status(job_key, JobStatus::Queued).await
    }

    /// Re-queues every deferred row; opt-in retry path for jobs the apply
    /// adapter produced no report for.
    pub async fn requeue_deferred(&self) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'queued',
                updated_at = ?1
            WHERE status = 'deferred'
            "#,
        )
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected())
    }

    // ----------------------------
    // Quota support
    // ----------------------------

    /// Applications recorded on `day` (UTC calendar day). Derived from
    /// `applied_at` on demand rather than kept as a counter, so a crash
    /// between apply and increment can never drift the quota.
    pub async fn daily_apply_count(&self, day: NaiveDate) -> anyhow::Result<i64> {
        let start = day.and_time(NaiveTime::MIN).and_utc();
        let end = start + chrono::Duration::days(1);

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM jobs
            WHERE status = 'applied'
              AND applied_at >= ?1
              AND applied_at < ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    // ----------------------------
    // Metrics snapshot (for /metrics)
    // ----------------------------

    pub async fn status_counts(&self) -> anyhow::Result<StatusCounts> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM jobs GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut counts = StatusCounts::default();
        for (status, n) in rows {
            match status.as_str() {
                "queued" => counts.queued = n,
                "skipped" => counts.skipped = n,
                "review" => counts.review = n,
                "rejected" => counts.rejected = n,
                "applied" => counts.applied = n,
                "deferred" => counts.deferred = n,
                _ => {}
            }
        }
        counts.applied_today = self.daily_apply_count(Utc::now().date_naive()).await?;

        Ok(counts)
    }

    // ----------------------------
    // Dashboard feedback
    // ----------------------------

    pub async fn record_feedback(
        &self,
        job_key: &str,
        label: &str,
        notes: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO feedback (job_key, label, notes, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(job_key)
        .bind(label)
        .bind(notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn feedback_label(&self, job_key: &str) -> anyhow::Result<Option<String>> {
        let label: Option<String> = sqlx::query_scalar(
            r#"
            SELECT label
            FROM feedback
            WHERE job_key = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(job_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(label)
    }
}
