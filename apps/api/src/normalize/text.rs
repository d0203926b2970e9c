/// Trims and collapses internal whitespace runs to single spaces.
pub fn clean(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// URL slug: lowercase ascii alphanumerics separated by single dashes.
pub fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    let mut last_dash = true; // suppress leading dash
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_collapses_whitespace() {
        assert_eq!(clean("  Senior   Software\tEngineer "), "Senior Software Engineer");
    }

    #[test]
    fn test_clean_empty() {
        assert_eq!(clean("   "), "");
    }

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Senior Software Engineer"), "senior-software-engineer");
    }

    #[test]
    fn test_slugify_punctuation() {
        assert_eq!(slugify("C++ Developer (Backend)"), "c-developer-backend");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("  New   York --- City  "), "new-york-city");
    }

    #[test]
    fn test_slugify_drops_non_ascii() {
        assert_eq!(slugify("Zürich"), "z-rich");
    }
}
