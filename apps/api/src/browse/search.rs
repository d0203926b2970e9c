//! Typeahead ranking: exact match, then prefix match, then Jaro-Winkler
//! similarity against the query. Ordering is stable on ties.

use serde::Serialize;
use uuid::Uuid;

pub const MAX_RESULTS: usize = 20;
/// Queries shorter than this (after trimming) return an empty result set.
pub const MIN_QUERY_LEN: usize = 2;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    Company,
    JobTitle,
    Location,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub kind: SearchKind,
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Escapes ILIKE wildcards in user input and wraps it for substring search.
pub fn ilike_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Ranks candidate hits against the query and truncates to `MAX_RESULTS`.
pub fn rank_matches(query: &str, mut hits: Vec<SearchHit>) -> Vec<SearchHit> {
    let q = query.trim().to_lowercase();
    hits.sort_by(|a, b| {
        let (tier_a, sim_a) = match_rank(&q, &a.name);
        let (tier_b, sim_b) = match_rank(&q, &b.name);
        tier_a
            .cmp(&tier_b)
            .then(sim_b.total_cmp(&sim_a))
            .then_with(|| a.name.cmp(&b.name))
    });
    hits.truncate(MAX_RESULTS);
    hits
}

/// (tier, similarity): tier 0 = exact, 1 = prefix, 2 = everything else.
fn match_rank(query_lower: &str, name: &str) -> (u8, f64) {
    let name_lower = name.to_lowercase();
    let sim = strsim::jaro_winkler(query_lower, &name_lower);
    if name_lower == query_lower {
        (0, sim)
    } else if name_lower.starts_with(query_lower) {
        (1, sim)
    } else {
        (2, sim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(name: &str) -> SearchHit {
        SearchHit {
            kind: SearchKind::Company,
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
        }
    }

    #[test]
    fn test_exact_match_first() {
        let ranked = rank_matches("stripe", vec![hit("Stripe Atlas"), hit("Stripe")]);
        assert_eq!(ranked[0].name, "Stripe");
    }

    #[test]
    fn test_prefix_beats_substring() {
        let ranked = rank_matches("data", vec![hit("Big Data Corp"), hit("Databricks")]);
        assert_eq!(ranked[0].name, "Databricks");
    }

    #[test]
    fn test_similarity_orders_within_tier() {
        let ranked = rank_matches(
            "software engineer",
            vec![hit("Software Engineering Manager"), hit("Software Engineer II")],
        );
        assert_eq!(ranked[0].name, "Software Engineer II");
    }

    #[test]
    fn test_case_insensitive() {
        let ranked = rank_matches("STRIPE", vec![hit("Stripe Atlas"), hit("stripe")]);
        assert_eq!(ranked[0].name, "stripe");
    }

    #[test]
    fn test_ties_break_alphabetically() {
        let ranked = rank_matches("zz", vec![hit("Beta"), hit("Alpha")]);
        assert_eq!(ranked[0].name, "Alpha");
    }

    #[test]
    fn test_truncates_to_max() {
        let hits: Vec<SearchHit> = (0..50).map(|i| hit(&format!("Company {i:02}"))).collect();
        assert_eq!(rank_matches("company", hits).len(), MAX_RESULTS);
    }

    #[test]
    fn test_ilike_pattern_escapes_wildcards() {
        assert_eq!(ilike_pattern("50%_a\\b"), "%50\\%\\_a\\\\b%");
    }
}
