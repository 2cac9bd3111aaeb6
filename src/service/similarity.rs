//! Trigram similarity with the semantics of PostgreSQL's `pg_trgm`.

use std::collections::BTreeSet;

/// Minimum score for a picture name to count as a match.
pub const SIMILARITY_THRESHOLD: f32 = 0.3;

/// Set of trigrams of `text`: lower-cased, split on non-alphanumerics,
/// each word padded with two leading blanks and one trailing blank.
pub fn trigrams(text: &str) -> BTreeSet<[char; 3]> {
    let lowered = text.to_lowercase();
    let mut set = BTreeSet::new();
    for word in lowered.split(|c: char| !c.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        let padded: Vec<char> = "  "
            .chars()
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect();
        for w in padded.windows(3) {
            set.insert([w[0], w[1], w[2]]);
        }
    }
    set
}

/// Shared trigrams divided by the union of both sets; `0.0` when either side is empty.
pub fn similarity(a: &str, b: &str) -> f32 {
    let ta = trigrams(a);
    let tb = trigrams(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let shared = ta.intersection(&tb).count();
    let union = ta.len() + tb.len() - shared;
    shared as f32 / union as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(similarity("Starbucks", "starbucks"), 1.0);
    }

    #[test]
    fn word_trigrams_match_pg_trgm() {
        let t = trigrams("cat");
        let expected: BTreeSet<[char; 3]> = [
            [' ', ' ', 'c'],
            [' ', 'c', 'a'],
            ['c', 'a', 't'],
            ['a', 't', ' '],
        ]
        .into_iter()
        .collect();
        assert_eq!(t, expected);
    }

    #[test]
    fn close_names_pass_threshold_and_unrelated_do_not() {
        assert!(similarity("coffee house", "coffee") > SIMILARITY_THRESHOLD);
        assert!(similarity("adidas", "adidass") > SIMILARITY_THRESHOLD);
        assert!(similarity("adidas", "lidl") < SIMILARITY_THRESHOLD);
    }

    #[test]
    fn punctuation_only_never_matches() {
        assert_eq!(similarity("---", "coffee"), 0.0);
    }
}
