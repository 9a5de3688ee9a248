use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Immutable runtime configuration. Constructed once, passed explicitly to
/// every component that needs it; nothing reads it through global state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub platforms: PlatformsSettings,
    pub limits: LimitsSettings,
    pub policy: PolicySettings,
    pub app: AppSettings,
    pub ai: AiSettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlatformsSettings {
    pub enabled: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsSettings {
    pub daily_applications: i64,
}

impl Default for LimitsSettings {
    fn default() -> Self {
        Self {
            daily_applications: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    pub blocked_keywords: Vec<String>,
    pub allowed_roles: Vec<String>,
    pub required_skills: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub apply_all: bool,
    pub use_ai: bool,
    pub use_policy: bool,
    pub enrich_before_ai: bool,
    pub entry_level_only: bool,
    pub retry_deferred: bool,
    pub seniority_blocklist: Vec<String>,
    pub resume_path: PathBuf,
    pub run_interval_seconds: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            apply_all: false,
            use_ai: false,
            use_policy: false,
            enrich_before_ai: true,
            entry_level_only: true,
            retry_deferred: false,
            seniority_blocklist: [
                "senior",
                "lead",
                "manager",
                "principal",
                "director",
                "head",
                "staff",
                "architect",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            resume_path: PathBuf::from("resumes/resume.pdf"),
            run_interval_seconds: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub min_score: i64,
    pub uncertainty_margin: i64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            min_score: 70,
            uncertainty_margin: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub db_path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/jobsentinel.db"),
        }
    }
}

/// Candidate profile consumed by the scoring gate.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub skills: Vec<String>,
    pub keywords: Vec<String>,
}

impl Settings {
    /// Loads `configs/settings.yaml` under `base_dir`; a missing file
    /// yields the defaults.
    pub fn load(base_dir: &Path) -> anyhow::Result<Self> {
        load_yaml(&base_dir.join("configs").join("settings.yaml"))
    }

    pub fn resolve_db_path(&self, base_dir: &Path) -> PathBuf {
        resolve(base_dir, &self.storage.db_path)
    }

    pub fn resolve_resume_path(&self, base_dir: &Path) -> PathBuf {
        resolve(base_dir, &self.app.resume_path)
    }
}

impl Profile {
    pub fn load(base_dir: &Path) -> anyhow::Result<Self> {
        load_yaml(&base_dir.join("configs").join("profile.yaml"))
    }
}

fn load_yaml<T: Default + for<'de> Deserialize<'de>>(path: &Path) -> anyhow::Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let raw = std::fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(T::default());
    }
    let value = serde_yaml::from_str(&raw)?;
    Ok(value)
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
