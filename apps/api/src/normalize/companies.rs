//! Company-name normalization: legal-suffix stripping plus near-duplicate
//! detection for the offline merge report.

use crate::normalize::text::clean;

/// Trailing legal-entity tokens stripped from company names,
/// matched case-insensitively.
const LEGAL_SUFFIXES: &[&str] = &[
    "inc", "inc.", "llc", "llc.", "ltd", "ltd.", "corp", "corp.", "co", "co.", "gmbh", "plc",
    "pvt", "pvt.", "s.a.",
];

/// Jaro-Winkler similarity at or above which two distinct names are
/// reported for manual review.
pub const NEAR_DUPLICATE_THRESHOLD: f64 = 0.93;

/// Canonicalizes a company name: whitespace cleanup and repeated stripping
/// of trailing legal suffixes and dangling separators. Original casing of
/// the remaining words is preserved.
pub fn normalize_company_name(raw: &str) -> String {
    let mut name = clean(raw);
    loop {
        let trimmed = name.trim_end_matches([',', '&', ' ']).to_string();
        let stripped = strip_trailing_suffix(&trimmed);
        if stripped == name {
            return name;
        }
        name = stripped;
    }
}

fn strip_trailing_suffix(name: &str) -> String {
    if let Some((head, last)) = name.rsplit_once(' ') {
        let lower = last.to_lowercase();
        if LEGAL_SUFFIXES.contains(&lower.as_str()) {
            return head.to_string();
        }
    }
    name.to_string()
}

/// Similarity of two names if they are near duplicates: distinct after
/// normalization but close enough to be the same company.
pub fn is_near_duplicate(a: &str, b: &str) -> Option<f64> {
    let na = normalize_company_name(a).to_lowercase();
    let nb = normalize_company_name(b).to_lowercase();
    if na == nb || na.is_empty() || nb.is_empty() {
        return None;
    }
    let similarity = strsim::jaro_winkler(&na, &nb);
    (similarity >= NEAR_DUPLICATE_THRESHOLD).then_some(similarity)
}

/// All near-duplicate pairs among `names`, for the offline report.
pub fn near_duplicates(names: &[String]) -> Vec<(String, String, f64)> {
    let mut pairs = Vec::new();
    for (i, a) in names.iter().enumerate() {
        for b in names.iter().skip(i + 1) {
            if let Some(similarity) = is_near_duplicate(a, b) {
                pairs.push((a.clone(), b.clone(), similarity));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_inc_with_comma() {
        assert_eq!(normalize_company_name("Acme, Inc."), "Acme");
    }

    #[test]
    fn test_strips_llc() {
        assert_eq!(normalize_company_name("Globex LLC"), "Globex");
    }

    #[test]
    fn test_strips_stacked_suffixes() {
        assert_eq!(normalize_company_name("Initech Holdings Co. Ltd."), "Initech Holdings");
    }

    #[test]
    fn test_keeps_suffix_like_words_inside_name() {
        assert_eq!(normalize_company_name("Costco Wholesale"), "Costco Wholesale");
    }

    #[test]
    fn test_preserves_casing() {
        assert_eq!(normalize_company_name("deepmind ltd"), "deepmind");
    }

    #[test]
    fn test_near_duplicate_typo() {
        assert!(is_near_duplicate("Google", "Gooogle").is_some());
    }

    #[test]
    fn test_unrelated_names_are_not_duplicates() {
        assert_eq!(is_near_duplicate("Google", "Amazon"), None);
    }

    #[test]
    fn test_exact_normalized_match_is_not_reported() {
        // Exact matches are merged automatically, not reported for review.
        assert_eq!(is_near_duplicate("Acme Inc.", "Acme"), None);
    }

    #[test]
    fn test_near_duplicates_pairs() {
        let names = vec![
            "Stripe".to_string(),
            "Stripe Inc".to_string(),
            "Stirpe".to_string(),
        ];
        let pairs = near_duplicates(&names);
        // "Stripe" vs "Stripe Inc" normalize identically, so only the typo
        // pairs survive.
        assert!(pairs.iter().all(|(a, b, _)| a == "Stirpe" || b == "Stirpe"));
        assert!(!pairs.is_empty());
    }
}
