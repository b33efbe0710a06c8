//! Signature keys for exact-match grouping

use crate::grouping::tokenizer::TokenSet;
use std::collections::BTreeSet;

/// Number of leading tokens kept in a signature
pub const SIGNATURE_TOKENS: usize = 6;

/// Separator between signature tokens
pub const SIGNATURE_SEPARATOR: &str = "-";

/// Signature of a record with no surviving tokens
pub const GENERAL_SIGNATURE: &str = "general";

/// Join the first [`SIGNATURE_TOKENS`] tokens with [`SIGNATURE_SEPARATOR`]
///
/// Tokens are already sorted, so the signature does not depend on the word
/// order of the original name.
pub fn signature(tokens: &TokenSet) -> String {
    if tokens.is_empty() {
        return GENERAL_SIGNATURE.to_string();
    }

    tokens
        .iter()
        .take(SIGNATURE_TOKENS)
        .collect::<Vec<_>>()
        .join(SIGNATURE_SEPARATOR)
}

/// Split a stored signature back into its token set
pub fn signature_tokens(signature: &str) -> BTreeSet<String> {
    signature
        .split(SIGNATURE_SEPARATOR)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::tokenizer::Tokenizer;

    #[test]
    fn test_joins_sorted_tokens() {
        let tokens: TokenSet = ["science", "computer", "operating"].into_iter().collect();
        assert_eq!(signature(&tokens), "computer-operating-science");
    }

    #[test]
    fn test_truncates_to_six_tokens() {
        let tokens: TokenSet = ["a1", "b2", "c3", "d4", "e5", "f6", "g7", "h8"]
            .into_iter()
            .collect();
        assert_eq!(signature(&tokens), "a1-b2-c3-d4-e5-f6");
    }

    #[test]
    fn test_empty_is_general() {
        assert_eq!(signature(&TokenSet::default()), GENERAL_SIGNATURE);
    }

    #[test]
    fn test_word_order_invariant() {
        let tokenizer = Tokenizer::default();
        let a = tokenizer.normalize("Data Science", &["CS", "Data Science"]);
        let b = tokenizer.normalize("data   science", &["cs", "DATA SCIENCE"]);
        let c = tokenizer.normalize("Science, Data", &["cs"]);

        assert_eq!(a, b);
        assert_eq!(signature(&a), signature(&b));
        assert_eq!(signature(&a), signature(&c));
    }

    #[test]
    fn test_signature_tokens_round_trip() {
        let tokens = signature_tokens("computer-operating-science");
        let expected: BTreeSet<String> = ["computer", "operating", "science"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(tokens, expected);
    }
}
