//! Text similarity scoring for trend linking
//!
//! Jaccard word overlap over normalized token sets. Pure functions; the
//! graph side effects live in the server's similarity engine.

use std::collections::HashSet;

/// Minimum combined score for a similarity edge to exist (strictly above)
pub const SIMILARITY_THRESHOLD: f64 = 0.3;

/// Weight of the title similarity in the combined score
pub const TITLE_WEIGHT: f64 = 0.7;

/// Weight of the description similarity in the combined score
pub const DESCRIPTION_WEIGHT: f64 = 0.3;

/// Normalize a string into its set of qualifying tokens
///
/// Lowercase, strip non-alphanumeric characters (whitespace kept as the
/// token separator), then drop tokens of length <= 2.
fn token_set(text: &str) -> HashSet<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    normalized
        .split_whitespace()
        .filter(|word| word.len() > 2)
        .map(|word| word.to_string())
        .collect()
}

/// Jaccard similarity between two strings in [0, 1]
///
/// Commutative and deterministic. Returns 0.0 when both token sets are
/// empty (no evidence either way).
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let words_a = token_set(a);
    let words_b = token_set(b);

    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 0.0;
    }

    let intersection = words_a.intersection(&words_b).count();
    intersection as f64 / union as f64
}

/// Combine title and description similarity into an overall score
///
/// The description term is 0 when either trend lacks a description, which
/// callers express by passing `None`.
pub fn combined_similarity(title_sim: f64, desc_sim: Option<f64>) -> f64 {
    TITLE_WEIGHT * title_sim + DESCRIPTION_WEIGHT * desc_sim.unwrap_or(0.0)
}

/// Score a pair of trends from their titles and optional descriptions
pub fn score_pair(
    title_a: &str,
    desc_a: Option<&str>,
    title_b: &str,
    desc_b: Option<&str>,
) -> f64 {
    let title_sim = text_similarity(title_a, title_b);
    let desc_sim = match (desc_a, desc_b) {
        (Some(a), Some(b)) => Some(text_similarity(a, b)),
        _ => None,
    };
    combined_similarity(title_sim, desc_sim)
}
