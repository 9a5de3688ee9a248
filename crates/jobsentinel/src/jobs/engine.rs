use crate::config::Profile;
use crate::jobs::model::NewJob;

/// Outcome of the heuristic scoring gate.
///
/// `confused` is evaluated independently of `apply` and takes precedence:
/// a job inside the uncertainty window goes to human review even when its
/// raw score would reject it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub apply: bool,
    pub score: i64,
    pub confused: bool,
}

impl Evaluation {
    pub fn from_score(score: i64, min_score: i64, uncertainty_margin: i64) -> Self {
        Self {
            apply: score >= min_score,
            score,
            confused: (score - min_score).abs() <= uncertainty_margin,
        }
    }
}

/// `50 + 10 per distinct profile skill found in the description + 10 per
/// distinct profile keyword found in the title`. Case-insensitive
/// substring matching; each configured term counts at most once.
pub fn evaluate(
    job: &NewJob,
    profile: &Profile,
    min_score: i64,
    uncertainty_margin: i64,
) -> Evaluation {
    let score = 50
        + score_from_text(&job.description, &profile.skills)
        + score_from_text(&job.title, &profile.keywords);

    Evaluation::from_score(score, min_score, uncertainty_margin)
}

fn score_from_text(text: &str, terms: &[String]) -> i64 {
    if text.is_empty() {
        return 0;
    }
    let text = text.to_lowercase();
    let matched = terms
        .iter()
        .filter(|term| !term.is_empty() && text.contains(&term.to_lowercase()))
        .count();
    matched as i64 * 10
}
