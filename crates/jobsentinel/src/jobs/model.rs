use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Job {
    pub job_key: String,

    pub platform: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub job_url: String,

    pub status: String,
    pub easy_apply: Option<bool>,

    pub decision: Option<String>,
    pub score: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub applied_at: Option<DateTime<Utc>>,
}

/// A freshly collected posting, keyed before insertion. The orchestrator
/// computes `job_key`; the store never derives it.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub job_key: String,
    pub platform: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub job_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Skipped,
    Review,
    Rejected,
    Applied,
    Deferred,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Skipped => "skipped",
            JobStatus::Review => "review",
            JobStatus::Rejected => "rejected",
            JobStatus::Applied => "applied",
            JobStatus::Deferred => "deferred",
        }
    }
}

/// Reason tag stored with the last decision that changed a job's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    SeniorityReject,
    PolicyReject,
    AiDecision,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::SeniorityReject => "seniority_reject",
            DecisionReason::PolicyReject => "policy_reject",
            DecisionReason::AiDecision => "ai_decision",
        }
    }
}
