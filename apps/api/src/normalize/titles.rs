//! Job-title normalization: canonical abbreviation expansion, casing, and
//! whitespace cleanup. Applied on submission and by the offline script.

use crate::normalize::text::clean;

/// Abbreviations expanded token-wise, matched case-insensitively with any
/// trailing period stripped.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("sr", "Senior"),
    ("jr", "Junior"),
    ("eng", "Engineer"),
    ("engr", "Engineer"),
    ("mgr", "Manager"),
    ("swe", "Software Engineer"),
    ("sde", "Software Development Engineer"),
];

/// Tokens kept fully uppercase regardless of input casing.
const ACRONYMS: &[&str] = &[
    "II", "III", "IV", "QA", "SRE", "ML", "AI", "IT", "UX", "UI", "VP", "CTO", "CEO", "HR",
    "SDET",
];

/// Lowercased connective words, except in first position.
const SMALL_WORDS: &[&str] = &["of", "and", "the", "for", "in", "to"];

/// Canonicalizes a raw job title: whitespace cleanup, abbreviation
/// expansion, acronym casing, and word capitalization.
pub fn normalize_title(raw: &str) -> String {
    let cleaned = clean(raw);
    let mut out: Vec<String> = Vec::new();
    for token in cleaned.split(' ') {
        let bare = token.trim_end_matches(['.', ',']);
        if bare.is_empty() {
            continue;
        }
        let lower = bare.to_lowercase();
        if let Some((_, expansion)) = ABBREVIATIONS.iter().find(|(abbr, _)| *abbr == lower) {
            out.extend(expansion.split(' ').map(String::from));
            continue;
        }
        if let Some(acronym) = ACRONYMS.iter().find(|a| a.eq_ignore_ascii_case(bare)) {
            out.push((*acronym).to_string());
            continue;
        }
        if !out.is_empty() && SMALL_WORDS.contains(&lower.as_str()) {
            out.push(lower);
            continue;
        }
        out.push(capitalize(bare));
    }
    out.join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().to_string() + &chars.as_str().to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expands_seniority_abbreviations() {
        assert_eq!(normalize_title("Sr. Software Engineer"), "Senior Software Engineer");
        assert_eq!(normalize_title("jr developer"), "Junior Developer");
    }

    #[test]
    fn test_expands_swe() {
        assert_eq!(normalize_title("Staff SWE"), "Staff Software Engineer");
    }

    #[test]
    fn test_expands_eng_and_mgr() {
        assert_eq!(normalize_title("software eng"), "Software Engineer");
        assert_eq!(normalize_title("Eng Mgr"), "Engineer Manager");
    }

    #[test]
    fn test_acronym_casing() {
        assert_eq!(normalize_title("qa engineer ii"), "QA Engineer II");
        assert_eq!(normalize_title("ml engineer"), "ML Engineer");
    }

    #[test]
    fn test_small_words_lowercased() {
        assert_eq!(normalize_title("HEAD OF ENGINEERING"), "Head of Engineering");
    }

    #[test]
    fn test_small_word_capitalized_in_first_position() {
        assert_eq!(normalize_title("the architect"), "The Architect");
    }

    #[test]
    fn test_whitespace_and_case_cleanup() {
        assert_eq!(normalize_title("  SENIOR   engineer "), "Senior Engineer");
    }

    #[test]
    fn test_already_canonical_is_unchanged() {
        assert_eq!(normalize_title("Senior Software Engineer"), "Senior Software Engineer");
    }

    #[test]
    fn test_trailing_commas_stripped() {
        assert_eq!(normalize_title("Engineer, Backend"), "Engineer Backend");
    }
}
