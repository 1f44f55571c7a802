//! Message splitting and indexing.
//!
//! Pure transformations from one raw message into the ordered batch of
//! fragments a run will send. The batch is computed exactly once per run and
//! reused across every repeat, so identical inputs always produce identical
//! sends.

use crate::config::SplitRule;

/// Split a raw message into fragments according to the rule.
///
/// `Disabled` passes the message through verbatim as a single fragment. The
/// splitting rules trim each piece and drop empty ones; an all-empty result
/// is valid and means the run performs zero sends.
pub fn split(message: &str, rule: &SplitRule) -> Vec<String> {
    match rule {
        SplitRule::Disabled => vec![message.to_string()],
        SplitRule::Newline => collect_fragments(message.split('\n')),
        SplitRule::Delimiter(d) => collect_fragments(message.split(d.as_str())),
    }
}

fn collect_fragments<'a>(pieces: impl Iterator<Item = &'a str>) -> Vec<String> {
    pieces
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Prefix fragments with a 1-based ordinal ("1. ", "2. ", ...) when
/// `show_index` is set; identity otherwise. The counter restarts for every
/// call, so numbering is per batch, never per repeat.
pub fn index(fragments: Vec<String>, show_index: bool) -> Vec<String> {
    if !show_index {
        return fragments;
    }
    fragments
        .into_iter()
        .enumerate()
        .map(|(i, fragment)| format!("{}. {}", i + 1, fragment))
        .collect()
}

/// Derive the full batch for a run: split, then index.
pub fn build_batch(message: &str, rule: &SplitRule, show_index: bool) -> Vec<String> {
    index(split(message, rule), show_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_disabled_is_identity() {
        assert_eq!(
            split("hello world", &SplitRule::Disabled),
            vec!["hello world"]
        );
        // No trimming in disabled mode, the message goes out verbatim.
        assert_eq!(split("  padded  ", &SplitRule::Disabled), vec!["  padded  "]);
    }

    #[test]
    fn test_split_newline_trims_and_drops_empties() {
        assert_eq!(
            split("a\nb\n\n c ", &SplitRule::Newline),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_split_delimiter_trims_and_drops_empties() {
        assert_eq!(
            split("a, b ,,c", &SplitRule::Delimiter(",".to_string())),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_split_multichar_delimiter() {
        assert_eq!(
            split("one::two:: ::three", &SplitRule::Delimiter("::".to_string())),
            vec!["one", "two", "three"]
        );
    }

    #[test]
    fn test_split_can_yield_empty_batch() {
        assert!(split("\n\n  \n", &SplitRule::Newline).is_empty());
    }

    #[test]
    fn test_index_numbers_fragments() {
        assert_eq!(
            index(vec!["a".to_string(), "b".to_string()], true),
            vec!["1. a", "2. b"]
        );
    }

    #[test]
    fn test_index_disabled_is_identity() {
        let fragments = vec!["a".to_string(), "b".to_string()];
        assert_eq!(index(fragments.clone(), false), fragments);
    }

    #[test]
    fn test_index_counter_restarts_per_call() {
        let first = index(vec!["x".to_string()], true);
        let second = index(vec!["y".to_string()], true);
        assert_eq!(first, vec!["1. x"]);
        assert_eq!(second, vec!["1. y"]);
    }

    #[test]
    fn test_build_batch_splits_then_indexes() {
        assert_eq!(
            build_batch("Hi\nBye", &SplitRule::Newline, true),
            vec!["1. Hi", "2. Bye"]
        );
    }
}
