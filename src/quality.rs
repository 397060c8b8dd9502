//! Token-overlap quality score
//!
//! Jaccard similarity between the unique word sets of a response and its
//! reference answer. Cheap, deterministic, and no model in the loop.

use std::collections::HashSet;

use crate::cost::round_to;

/// Punctuation stripped from both ends of each word
const STRIP_CHARS: &[char] = &[
    '.', ',', '!', '?', ';', ':', '\'', '"', '(', ')', '[', ']', '{', '}',
];

/// Score `response` against `reference`, in [0, 1], rounded to 3 decimals.
///
/// An empty or whitespace-only reference means there is no ground truth,
/// which scores 1.0.
pub fn score_quality(response: &str, reference: &str) -> f64 {
    if reference.trim().is_empty() {
        return 1.0;
    }

    let ref_tokens = tokenize(reference);
    if ref_tokens.is_empty() {
        return 1.0;
    }
    let resp_tokens = tokenize(response);

    let overlap = ref_tokens.intersection(&resp_tokens).count();
    let union = ref_tokens.union(&resp_tokens).count();
    if union == 0 {
        return 0.0;
    }
    round_to(overlap as f64 / union as f64, 3)
}

/// Lower-case, strip edge punctuation, then keep tokens longer than one char
fn tokenize(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|w| w.to_lowercase().trim_matches(STRIP_CHARS).to_string())
        .filter(|w| w.chars().count() > 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert_eq!(score_quality("The answer is 42", "The answer is 42"), 1.0);
    }

    #[test]
    fn test_no_reference() {
        assert_eq!(score_quality("anything here", ""), 1.0);
        assert_eq!(score_quality("", "   \n\t"), 1.0);
    }

    #[test]
    fn test_reference_of_single_chars_only() {
        assert_eq!(score_quality("whatever", "a b c"), 1.0);
    }

    #[test]
    fn test_length_filter_runs_after_stripping() {
        // "A." and "(...)" strip down to nothing worth scoring
        assert_eq!(score_quality("anything else", "A."), 1.0);
        assert_eq!(score_quality("anything else", "(...)"), 1.0);
        // "9." is dropped, leaving {answer} against {the, answer, is}
        assert_eq!(score_quality("the answer is 9", "9. answer"), 0.333);
    }

    #[test]
    fn test_tokenize_never_yields_empty_token() {
        let tokens = tokenize("(...) \"\" a. Bb! ?");
        assert_eq!(tokens, HashSet::from(["bb".to_string()]));
    }

    #[test]
    fn test_partial_overlap() {
        let score = score_quality(
            "Python lists are mutable containers",
            "Lists are mutable and tuples are immutable",
        );
        assert!(score > 0.0 && score < 1.0);
        // {lists, are, mutable} / {python, lists, are, mutable, containers, and, tuples, immutable}
        assert_eq!(score, 0.375);
    }

    #[test]
    fn test_punctuation_and_case_are_normalized() {
        assert_eq!(score_quality("Tim Berners-Lee, 1989, CERN.", "tim berners-lee 1989 cern"), 1.0);
        assert_eq!(score_quality("(CERN)", "\"cern!\""), 1.0);
    }

    #[test]
    fn test_disjoint_is_zero() {
        assert_eq!(score_quality("completely unrelated words", "nothing shared here"), 0.0);
        assert_eq!(score_quality("", "nothing shared here"), 0.0);
    }

    #[test]
    fn test_rounded_to_three_decimals() {
        // 1 shared of 3 unique
        let score = score_quality("alpha beta", "alpha gamma");
        assert_eq!(score, 0.333);
    }

    #[test]
    fn test_score_is_bounded() {
        let pairs = [
            ("", "x yz"),
            ("one two three", "three two one"),
            ("a", "bb cc"),
            ("Mercury Venus Earth", "Mercury, Venus, Earth, Mars."),
        ];
        for (resp, reference) in pairs {
            let s = score_quality(resp, reference);
            assert!((0.0..=1.0).contains(&s), "{} out of range", s);
        }
    }
}
