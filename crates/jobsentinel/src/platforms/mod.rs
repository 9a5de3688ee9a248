use crate::config::{Profile, Settings};
use crate::jobs::model::{Job, NewJob};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// One discovered posting as a platform hands it over. Fields a site does
/// not expose are empty strings, never absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPosting {
    pub platform: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub job_url: String,
}

/// Best-effort fill-in for a job collected without a description.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub description: String,
    pub company: String,
    pub location: String,
}

impl Enrichment {
    pub fn is_empty(&self) -> bool {
        self.description.is_empty() && self.company.is_empty() && self.location.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStatus {
    Applied,
    Review,
    Skipped,
}

/// What an applier reports back. No report at all (`Ok(None)` from
/// [`Applier::apply`]) defers the job instead.
#[derive(Debug, Clone, Copy)]
pub struct ApplyReport {
    pub status: ApplyStatus,
    pub easy_apply: Option<bool>,
}

/// Typed failure carried across the adapter boundary; the orchestrator
/// matches on these instead of catching broad errors.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("collection failed on {platform}: {reason}")]
    Collection { platform: String, reason: String },

    #[error("enrichment failed on {platform}: {reason}")]
    Enrichment { platform: String, reason: String },

    #[error("apply failed on {platform}: {reason}")]
    Apply { platform: String, reason: String },
}

#[async_trait]
pub trait Collector: Send + Sync {
    /// Produces one finite, non-restartable batch of postings.
    async fn collect(
        &self,
        settings: &Settings,
        profile: &Profile,
    ) -> Result<Vec<RawPosting>, AdapterError>;
}

#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, job: &NewJob, settings: &Settings) -> Result<Enrichment, AdapterError>;
}

#[async_trait]
pub trait Applier: Send + Sync {
    async fn apply(
        &self,
        job: &Job,
        resume_path: &Path,
        settings: &Settings,
    ) -> Result<Option<ApplyReport>, AdapterError>;
}

/// Capability sets per platform id. Adding a platform means registering
/// it here; the orchestrator never changes.
#[derive(Default)]
pub struct PlatformRegistry {
    collectors: HashMap<String, Arc<dyn Collector>>,
    enrichers: HashMap<String, Arc<dyn Enricher>>,
    appliers: HashMap<String, Arc<dyn Applier>>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_collector(&mut self, platform: &str, collector: Arc<dyn Collector>) {
        self.collectors.insert(platform.to_string(), collector);
    }

    pub fn register_enricher(&mut self, platform: &str, enricher: Arc<dyn Enricher>) {
        self.enrichers.insert(platform.to_string(), enricher);
    }

    pub fn register_applier(&mut self, platform: &str, applier: Arc<dyn Applier>) {
        self.appliers.insert(platform.to_string(), applier);
    }

    pub fn collector(&self, platform: &str) -> Option<Arc<dyn Collector>> {
        self.collectors.get(platform).cloned()
    }

    pub fn enricher(&self, platform: &str) -> Option<Arc<dyn Enricher>> {
        self.enrichers.get(platform).cloned()
    }

    pub fn applier(&self, platform: &str) -> Option<Arc<dyn Applier>> {
        self.appliers.get(platform).cloned()
    }
}
