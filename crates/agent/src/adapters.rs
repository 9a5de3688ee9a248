use async_trait::async_trait;
use jobsentinel::config::{Profile, Settings};
use jobsentinel::jobs::Job;
use jobsentinel::platforms::{
    AdapterError, Applier, ApplyReport, ApplyStatus, Collector, PlatformRegistry, RawPosting,
};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Collects postings from an HTTP endpoint serving a JSON array. Stands
/// in for the browser-driven site collectors, which live outside this
/// repository.
pub struct FeedCollector {
    platform: String,
    url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct FeedItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    company: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    url: String,
}

impl FeedCollector {
    pub fn new(platform: &str, url: String) -> Self {
        Self {
            platform: platform.to_string(),
            url,
            client: reqwest::Client::new(),
        }
    }

    fn fail(&self, reason: impl ToString) -> AdapterError {
        AdapterError::Collection {
            platform: self.platform.clone(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl Collector for FeedCollector {
    async fn collect(
        &self,
        _settings: &Settings,
        _profile: &Profile,
    ) -> Result<Vec<RawPosting>, AdapterError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.fail(e))?
            .error_for_status()
            .map_err(|e| self.fail(e))?;

        let items: Vec<FeedItem> = response.json().await.map_err(|e| self.fail(e))?;

        Ok(items
            .into_iter()
            .map(|item| RawPosting {
                platform: self.platform.clone(),
                title: item.title,
                company: item.company,
                location: item.location,
                description: item.description,
                job_url: item.url,
            })
            .collect())
    }
}

/// Routes every queued job to human review instead of submitting a form.
pub struct HandoffApplier;

#[async_trait]
impl Applier for HandoffApplier {
    async fn apply(
        &self,
        _job: &Job,
        _resume_path: &Path,
        _settings: &Settings,
    ) -> Result<Option<ApplyReport>, AdapterError> {
        Ok(Some(ApplyReport {
            status: ApplyStatus::Review,
            easy_apply: Some(false),
        }))
    }
}

/// Sample wiring. Replace these with your real platform integrations.
pub fn build_registry() -> Arc<PlatformRegistry> {
    let mut registry = PlatformRegistry::new();

    if let Ok(url) = std::env::var("JOBSENTINEL_FEED_URL") {
        if !url.trim().is_empty() {
            registry.register_collector("feed", Arc::new(FeedCollector::new("feed", url)));
            registry.register_applier("feed", Arc::new(HandoffApplier));
        }
    }

    Arc::new(registry)
}
