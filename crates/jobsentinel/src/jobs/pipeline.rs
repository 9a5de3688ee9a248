use crate::config::{Profile, Settings};
use crate::jobs::model::{DecisionReason, JobStatus, NewJob};
use crate::jobs::repo::JobsRepo;
use crate::jobs::{engine, filters, limiter};
use crate::platforms::{ApplyStatus, PlatformRegistry, RawPosting};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Stable identity of a posting: hash of `(platform, job_url)` when a URL
/// exists, else `(platform, title, company, location)`. Computed here,
/// never by the store.
pub fn job_key(posting: &RawPosting) -> String {
    let job_url = posting.job_url.trim();
    let raw = if job_url.is_empty() {
        format!(
            "{}|{}|{}|{}",
            posting.platform, posting.title, posting.company, posting.location
        )
    } else {
        format!("{}|{}", posting.platform, job_url)
    };

    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

/// Aggregate counters for one cycle, one field per observable outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub seen: u64,
    pub enqueued: u64,
    pub entry_skipped: u64,
    pub policy_skipped: u64,
    pub ai_skipped: u64,
    pub review: u64,

    pub applied: u64,
    pub review_apply: u64,
    pub skipped_apply: u64,
    pub deferred: u64,
}

/// Two-phase cycle driver: ingest-and-filter, then rate-limited apply.
///
/// Holds no job state between cycles; the store is the single source of
/// truth, which is what makes a cycle safely restartable after a crash.
pub struct Pipeline {
    jobs: JobsRepo,
    registry: Arc<PlatformRegistry>,
    settings: Settings,
    profile: Profile,
    resume_path: PathBuf,
}

impl Pipeline {
    pub fn new(
        jobs: JobsRepo,
        registry: Arc<PlatformRegistry>,
        settings: Settings,
        profile: Profile,
        resume_path: PathBuf,
    ) -> Self {
        Self {
            jobs,
            registry,
            settings,
            profile,
            resume_path,
        }
    }

    /// Runs one full cycle. Only store-level failures abort it; adapter
    /// failures are contained per platform or per job.
    pub async fn run_cycle(&self) -> anyhow::Result<CycleStats> {
        let app = &self.settings.app;
        info!(
            apply_all = app.apply_all,
            use_ai = app.use_ai,
            use_policy = app.use_policy,
            enrich_before_ai = app.enrich_before_ai,
            entry_level_only = app.entry_level_only,
            daily_limit = self.settings.limits.daily_applications,
            "cycle config"
        );

        let mut stats = CycleStats::default();

        if app.retry_deferred {
            let requeued = self.jobs.requeue_deferred().await?;
            if requeued > 0 {
                info!(count = requeued, "re-queued deferred jobs");
            }
        }

        let postings = self.collect_all().await;
        info!(count = postings.len(), "collected postings");

        self.ingest_and_filter(postings, &mut stats).await?;
        info!(
            seen = stats.seen,
            enqueued = stats.enqueued,
            entry_skipped = stats.entry_skipped,
            policy_skipped = stats.policy_skipped,
            ai_skipped = stats.ai_skipped,
            review = stats.review,
            "phase 1 summary"
        );

        self.apply_queued(&mut stats).await?;
        info!(
            applied = stats.applied,
            review = stats.review_apply,
            skipped = stats.skipped_apply,
            deferred = stats.deferred,
            "phase 2 summary"
        );

        Ok(stats)
    }

    /// Pulls one batch from every enabled platform. A failing collector
    /// contributes zero postings and never aborts the cycle.
    async fn collect_all(&self) -> Vec<RawPosting> {
        let mut postings = Vec::new();

        for platform in &self.settings.platforms.enabled {
            let Some(collector) = self.registry.collector(platform) else {
                warn!(platform = %platform, "no collector registered");
                continue;
            };
            match collector.collect(&self.settings, &self.profile).await {
                Ok(batch) => {
                    info!(platform = %platform, count = batch.len(), "collector returned postings");
                    postings.extend(batch);
                }
                Err(err) => warn!(platform = %platform, error = %err, "collection failed"),
            }
        }

        postings
    }

    /// Phase 1: dedup, persist as queued, then run each fresh job through
    /// the filter chain exactly once. Previously seen keys are counted
    /// and skipped, never re-filtered.
    async fn ingest_and_filter(
        &self,
        postings: Vec<RawPosting>,
        stats: &mut CycleStats,
    ) -> anyhow::Result<()> {
        let app = &self.settings.app;

        for posting in postings {
            let key = job_key(&posting);
            if self.jobs.has_seen(&key).await? {
                stats.seen += 1;
                continue;
            }

            let mut job = NewJob {
                job_key: key,
                platform: posting.platform,
                title: posting.title,
                company: posting.company,
                location: posting.location,
                description: posting.description,
                job_url: posting.job_url,
            };
            self.jobs.enqueue(&job).await?;
            stats.enqueued += 1;

            if app.use_ai && app.enrich_before_ai && job.description.trim().is_empty() {
                if let Some(enricher) = self.registry.enricher(&job.platform) {
                    match enricher.enrich(&job, &self.settings).await {
                        Ok(fields) if !fields.is_empty() => {
                            if !fields.description.is_empty() {
                                job.description = fields.description;
                            }
                            if !fields.company.is_empty() {
                                job.company = fields.company;
                            }
                            if !fields.location.is_empty() {
                                job.location = fields.location;
                            }
                            self.jobs
                                .store_enrichment(
                                    &job.job_key,
                                    &job.description,
                                    &job.company,
                                    &job.location,
                                )
                                .await?;
                            info!(
                                platform = %job.platform,
                                description_len = job.description.len(),
                                "enriched job"
                            );
                        }
                        Ok(_) => {}
                        Err(err) => {
                            warn!(platform = %job.platform, error = %err, "enrichment failed");
                        }
                    }
                }
            }

            if app.entry_level_only && !filters::is_entry_level(&job, &app.seniority_blocklist) {
                self.jobs.set_status(&job.job_key, JobStatus::Skipped).await?;
                self.jobs
                    .record_decision(&job.job_key, DecisionReason::SeniorityReject, 0)
                    .await?;
                stats.entry_skipped += 1;
                continue;
            }

            if app.use_policy && !filters::policy_allows(&job, &self.settings.policy) {
                self.jobs.set_status(&job.job_key, JobStatus::Skipped).await?;
                self.jobs
                    .record_decision(&job.job_key, DecisionReason::PolicyReject, 0)
                    .await?;
                stats.policy_skipped += 1;
                continue;
            }

            if app.use_ai {
                let evaluation = engine::evaluate(
                    &job,
                    &self.profile,
                    self.settings.ai.min_score,
                    self.settings.ai.uncertainty_margin,
                );
                if !evaluation.apply && !evaluation.confused {
                    self.jobs.set_status(&job.job_key, JobStatus::Skipped).await?;
                    self.jobs
                        .record_decision(&job.job_key, DecisionReason::AiDecision, evaluation.score)
                        .await?;
                    stats.ai_skipped += 1;
                    continue;
                }
                if evaluation.confused {
                    self.jobs.set_status(&job.job_key, JobStatus::Review).await?;
                    self.jobs
                        .record_decision(&job.job_key, DecisionReason::AiDecision, evaluation.score)
                        .await?;
                    stats.review += 1;
                    continue;
                }
                self.jobs
                    .record_decision(&job.job_key, DecisionReason::AiDecision, evaluation.score)
                    .await?;
            }
        }

        Ok(())
    }

    /// Phase 2: pop the oldest queued job and dispatch to its platform's
    /// applier while the quota holds. Every popped job leaves `queued` in
    /// this iteration; a job passed over because the quota ran out stays
    /// `queued` for the next cycle.
    async fn apply_queued(&self, stats: &mut CycleStats) -> anyhow::Result<()> {
        let app = &self.settings.app;
        let daily_limit = self.settings.limits.daily_applications;

        loop {
            if !app.apply_all && !limiter::can_apply(&self.jobs, daily_limit).await? {
                break;
            }
            let Some(job) = self.jobs.next_queued().await? else {
                break;
            };

            let Some(applier) = self.registry.applier(&job.platform) else {
                self.jobs.set_status(&job.job_key, JobStatus::Skipped).await?;
                stats.skipped_apply += 1;
                continue;
            };

            info!(
                platform = %job.platform,
                title = %job.title,
                url = %job.job_url,
                "applying"
            );
            match applier.apply(&job, &self.resume_path, &self.settings).await {
                Ok(Some(report)) => {
                    let status = match report.status {
                        ApplyStatus::Applied => JobStatus::Applied,
                        ApplyStatus::Review => JobStatus::Review,
                        ApplyStatus::Skipped => JobStatus::Skipped,
                    };
                    self.jobs
                        .set_apply_outcome(&job.job_key, status, report.easy_apply)
                        .await?;
                    match report.status {
                        ApplyStatus::Applied => stats.applied += 1,
                        ApplyStatus::Review => stats.review_apply += 1,
                        ApplyStatus::Skipped => stats.skipped_apply += 1,
                    }
                    info!(
                        status = status.as_str(),
                        easy_apply = ?report.easy_apply,
                        "apply result"
                    );
                }
                Ok(None) => {
                    self.jobs
                        .set_apply_outcome(&job.job_key, JobStatus::Deferred, None)
                        .await?;
                    stats.deferred += 1;
                    info!(status = "deferred", "apply result");
                }
                Err(err) => {
                    warn!(job_key = %job.job_key, error = %err, "apply failed");
                    self.jobs
                        .set_apply_outcome(&job.job_key, JobStatus::Review, Some(false))
                        .await?;
                    stats.review_apply += 1;
                }
            }
        }

        Ok(())
    }
}
