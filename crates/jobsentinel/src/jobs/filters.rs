use crate::config::PolicySettings;
use crate::jobs::model::NewJob;

/// Seniority gate: a posting is entry level unless its title or
/// description mentions a blocklisted term. Plain substring match over
/// the lower-cased text, no tokenization.
pub fn is_entry_level(job: &NewJob, blocklist: &[String]) -> bool {
    let text = format!("{} {}", job.title, job.description).to_lowercase();
    !blocklist
        .iter()
        .any(|term| !term.is_empty() && text.contains(&term.to_lowercase()))
}

/// Deterministic policy gate, independent of scoring.
///
/// Rules, in order: blocked_keywords veto (title or description), then
/// allowed_roles whitelist (title or description), then required_skills
/// whitelist (description only). An empty list disables its rule.
pub fn policy_allows(job: &NewJob, policy: &PolicySettings) -> bool {
    let title = job.title.to_lowercase();
    let description = job.description.to_lowercase();

    for keyword in &policy.blocked_keywords {
        let keyword = keyword.to_lowercase();
        if !keyword.is_empty() && (title.contains(&keyword) || description.contains(&keyword)) {
            return false;
        }
    }

    if !policy.allowed_roles.is_empty() {
        let matched = policy.allowed_roles.iter().any(|role| {
            let role = role.to_lowercase();
            !role.is_empty() && (title.contains(&role) || description.contains(&role))
        });
        if !matched {
            return false;
        }
    }

    if !policy.required_skills.is_empty() {
        let matched = policy.required_skills.iter().any(|skill| {
            let skill = skill.to_lowercase();
            !skill.is_empty() && description.contains(&skill)
        });
        if !matched {
            return false;
        }
    }

    true
}
