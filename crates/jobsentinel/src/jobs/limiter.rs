use crate::jobs::repo::JobsRepo;
use chrono::Utc;

/// Daily application quota check, shared across all platforms.
///
/// Stateless: reads the derived count straight from the store, so a
/// restarted process sees exactly the quota already spent today.
pub async fn can_apply(jobs: &JobsRepo, daily_limit: i64) -> anyhow::Result<bool> {
    let today = Utc::now().date_naive();
    Ok(jobs.daily_apply_count(today).await? < daily_limit)
}
