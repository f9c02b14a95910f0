//! Query tokenization contract (§6 of the design): split on whitespace, keep
//! only alphanumeric code points per token, ASCII-fold case, drop empties.
//!
//! This has to match whatever built the index bit-for-bit — it is
//! deliberately minimal rather than a general-purpose analyzer.

/// Normalize a query string into its term list, preserving order and
/// duplicates (a repeated term opens a second cursor over the same
/// posting list, same as a distinct term would; DAAT addition is
/// commutative so this only matters for which cursors get opened, not for
/// score correctness).
pub fn parse_query(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .filter_map(normalize_token)
        .collect()
}

fn normalize_token(token: &str) -> Option<String> {
    let normalized: String = token
        .chars()
        .filter(|c| c.is_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace_and_lowercases() {
        assert_eq!(parse_query("Quick Brown"), vec!["quick", "brown"]);
    }

    #[test]
    fn strips_non_alphanumeric_characters() {
        assert_eq!(parse_query("fox!! jumps--high"), vec!["fox", "jumpshigh"]);
    }

    #[test]
    fn discards_tokens_that_are_entirely_punctuation() {
        assert_eq!(parse_query("fox -- dog"), vec!["fox", "dog"]);
    }

    #[test]
    fn empty_query_yields_no_terms() {
        assert!(parse_query("   ").is_empty());
        assert!(parse_query("").is_empty());
    }

    #[test]
    fn preserves_duplicate_terms() {
        assert_eq!(parse_query("fox fox"), vec!["fox", "fox"]);
    }
}
