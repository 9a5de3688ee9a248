#![allow(dead_code)]

use async_trait::async_trait;
use jobsentinel::config::{Profile, Settings};
use jobsentinel::db;
use jobsentinel::jobs::{Job, JobsRepo, NewJob, Pipeline};
use jobsentinel::platforms::{
    AdapterError, Applier, ApplyReport, ApplyStatus, Collector, Enricher, Enrichment,
    PlatformRegistry, RawPosting,
};
use sqlx::SqlitePool;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub struct TestDb {
    pub repo: JobsRepo,
    pub pool: SqlitePool,
    _dir: TempDir,
}

pub async fn setup_db() -> TestDb {
    let dir = tempfile::tempdir().expect("tempdir");
    let pool = db::make_pool(&dir.path().join("jobsentinel.db"))
        .await
        .expect("failed to open test database");
    db::run_migrations(&pool).await.expect("migrations failed");

    TestDb {
        repo: JobsRepo::new(pool.clone()),
        pool,
        _dir: dir,
    }
}

pub fn pipeline(
    db: &TestDb,
    registry: PlatformRegistry,
    settings: Settings,
    profile: Profile,
) -> Pipeline {
    Pipeline::new(
        db.repo.clone(),
        Arc::new(registry),
        settings,
        profile,
        PathBuf::from("resumes/resume.pdf"),
    )
}

pub fn settings_for(platforms: &[&str]) -> Settings {
    let mut settings = Settings::default();
    settings.platforms.enabled = platforms.iter().map(|s| s.to_string()).collect();
    settings
}

pub fn posting(platform: &str, title: &str, description: &str, url: &str) -> RawPosting {
    RawPosting {
        platform: platform.to_string(),
        title: title.to_string(),
        company: "Acme".to_string(),
        location: "Remote".to_string(),
        description: description.to_string(),
        job_url: url.to_string(),
    }
}

pub fn new_job(key: &str, platform: &str) -> NewJob {
    NewJob {
        job_key: key.to_string(),
        platform: platform.to_string(),
        title: "Junior Engineer".to_string(),
        company: "Acme".to_string(),
        location: "Remote".to_string(),
        description: "Build things".to_string(),
        job_url: format!("https://example.com/{key}"),
    }
}

pub async fn get_job(db: &TestDb, key: &str) -> Job {
    db.repo
        .get(key)
        .await
        .expect("get failed")
        .expect("job not found")
}

// ----------------------------
// Scripted adapters
// ----------------------------

pub struct StaticCollector {
    postings: Vec<RawPosting>,
}

impl StaticCollector {
    pub fn new(postings: Vec<RawPosting>) -> Arc<Self> {
        Arc::new(Self { postings })
    }
}

#[async_trait]
impl Collector for StaticCollector {
    async fn collect(
        &self,
        _settings: &Settings,
        _profile: &Profile,
    ) -> Result<Vec<RawPosting>, AdapterError> {
        Ok(self.postings.clone())
    }
}

pub struct FailingCollector {
    platform: String,
}

impl FailingCollector {
    pub fn new(platform: &str) -> Arc<Self> {
        Arc::new(Self {
            platform: platform.to_string(),
        })
    }
}

#[async_trait]
impl Collector for FailingCollector {
    async fn collect(
        &self,
        _settings: &Settings,
        _profile: &Profile,
    ) -> Result<Vec<RawPosting>, AdapterError> {
        Err(AdapterError::Collection {
            platform: self.platform.clone(),
            reason: "simulated outage".to_string(),
        })
    }
}

pub struct StaticEnricher {
    enrichment: Enrichment,
}

impl StaticEnricher {
    pub fn with_description(description: &str) -> Arc<Self> {
        Arc::new(Self {
            enrichment: Enrichment {
                description: description.to_string(),
                ..Enrichment::default()
            },
        })
    }
}

#[async_trait]
impl Enricher for StaticEnricher {
    async fn enrich(
        &self,
        _job: &NewJob,
        _settings: &Settings,
    ) -> Result<Enrichment, AdapterError> {
        Ok(self.enrichment.clone())
    }
}

pub struct FailingEnricher;

#[async_trait]
impl Enricher for FailingEnricher {
    async fn enrich(&self, job: &NewJob, _settings: &Settings) -> Result<Enrichment, AdapterError> {
        Err(AdapterError::Enrichment {
            platform: job.platform.clone(),
            reason: "simulated outage".to_string(),
        })
    }
}

pub enum ApplyScript {
    Report(ApplyStatus, Option<bool>),
    NoReport,
    Fail,
}

/// Plays back a queue of scripted outcomes, one per apply call; once the
/// script runs dry every further call reports a clean application.
pub struct ScriptedApplier {
    scripts: Mutex<VecDeque<ApplyScript>>,
    pub calls: AtomicUsize,
}

impl ScriptedApplier {
    pub fn new(scripts: Vec<ApplyScript>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn always_applied() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Applier for ScriptedApplier {
    async fn apply(
        &self,
        job: &Job,
        _resume_path: &Path,
        _settings: &Settings,
    ) -> Result<Option<ApplyReport>, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let script = self.scripts.lock().expect("scripts lock").pop_front();
        match script {
            Some(ApplyScript::Report(status, easy_apply)) => {
                Ok(Some(ApplyReport { status, easy_apply }))
            }
            Some(ApplyScript::NoReport) => Ok(None),
            Some(ApplyScript::Fail) => Err(AdapterError::Apply {
                platform: job.platform.clone(),
                reason: "simulated failure".to_string(),
            }),
            None => Ok(Some(ApplyReport {
                status: ApplyStatus::Applied,
                easy_apply: Some(true),
            })),
        }
    }
}
