//! URL-safe slug derivation

/// Generate a URL-friendly slug from a title
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single `-`, and trims leading/trailing dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_slug() {
        assert_eq!(slugify("Local LLM inference"), "local-llm-inference");
    }

    #[test]
    fn test_punctuation_collapsed() {
        assert_eq!(slugify("Trend: rag @ 2025-11-02T09"), "trend-rag-2025-11-02t09");
    }

    #[test]
    fn test_edges_trimmed() {
        assert_eq!(slugify("  hello world!  "), "hello-world");
        assert_eq!(slugify("---"), "");
    }
}
