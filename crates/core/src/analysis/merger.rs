use crate::ingest::types::TranscriptFragment;

pub const DEFAULT_MAX_CHUNK_CHARS: usize = 1500;

const SENTENCE_TERMINATORS: [char; 3] = ['.', '?', '!'];

/// A merged span of transcript text handed to the NLP collaborators.
pub type TextUnit = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// A unit is cut once its length in characters exceeds this.
    pub max_chunk_chars: usize,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
        }
    }
}

impl MergeOptions {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Ok(s) = std::env::var("MERGE_MAX_CHUNK_CHARS") {
            if let Ok(n) = s.parse::<usize>() {
                out.max_chunk_chars = n;
            }
        }

        out
    }
}

/// Glues caption fragments into sentence-sized units.
///
/// A unit closes when a fragment ends in `.`, `?` or `!`, or when the accumulated text grows
/// past `max_chunk_chars`. Whatever is left after the last fragment becomes the final unit.
/// Units are trimmed, and a unit that is empty after trimming is dropped rather than
/// emitted, so whitespace-only fragments never reach the collaborators.
pub fn merge(fragments: &[TranscriptFragment], opts: MergeOptions) -> Vec<TextUnit> {
    let mut units = Vec::new();
    let mut current = String::new();
    let mut current_chars: usize = 0;

    for fragment in fragments {
        let text = fragment.text.as_str();
        current.push(' ');
        current.push_str(text);
        current_chars += 1 + text.chars().count();

        if text.ends_with(&SENTENCE_TERMINATORS[..]) || current_chars > opts.max_chunk_chars {
            push_unit(&mut units, &current);
            current.clear();
            current_chars = 0;
        }
    }

    if !current.is_empty() {
        push_unit(&mut units, &current);
    }

    units
}

fn push_unit(units: &mut Vec<TextUnit>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        units.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragments(texts: &[&str]) -> Vec<TranscriptFragment> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TranscriptFragment {
                text: t.to_string(),
                start: i as f64 * 2.0,
                duration: 2.0,
            })
            .collect()
    }

    #[test]
    fn empty_input_yields_no_units() {
        assert!(merge(&[], MergeOptions::default()).is_empty());
    }

    #[test]
    fn splits_on_terminal_punctuation() {
        let units = merge(
            &fragments(&["Apple stock", "fell today.", "Why?", "Nobody knows", "for sure!"]),
            MergeOptions::default(),
        );
        assert_eq!(
            units,
            vec!["Apple stock fell today.", "Why?", "Nobody knows for sure!"]
        );
    }

    #[test]
    fn flushes_trailing_text_without_punctuation() {
        let units = merge(
            &fragments(&["first.", "and then", "it trailed off"]),
            MergeOptions::default(),
        );
        assert_eq!(units, vec!["first.", "and then it trailed off"]);
    }

    #[test]
    fn punctuation_check_uses_raw_fragment_text() {
        let units = merge(&fragments(&["done. ", "more"]), MergeOptions::default());
        assert_eq!(units, vec!["done. more"]);
    }

    #[test]
    fn cuts_when_threshold_exceeded() {
        let opts = MergeOptions { max_chunk_chars: 10 };
        let units = merge(&fragments(&["aaaa", "bbbb", "cccc", "dd"]), opts);
        // " aaaa bbbb" is 10 chars, " aaaa bbbb cccc" exceeds it.
        assert_eq!(units, vec!["aaaa bbbb cccc", "dd"]);
        for unit in &units {
            assert!(unit.chars().count() <= opts.max_chunk_chars + "cccc".len());
        }
    }

    #[test]
    fn oversized_single_fragment_becomes_its_own_unit() {
        let long = "x".repeat(40);
        let opts = MergeOptions { max_chunk_chars: 10 };
        let units = merge(&fragments(&[long.as_str(), "tail"]), opts);
        assert_eq!(units, vec![long.clone(), "tail".to_string()]);
    }

    #[test]
    fn every_fragment_appears_once_in_order() {
        let texts = ["one", "two.", "three", "four?", "five", "six", "seven!"];
        let units = merge(&fragments(&texts), MergeOptions { max_chunk_chars: 12 });
        let rejoined: Vec<String> = units
            .iter()
            .flat_map(|u| u.split_whitespace().map(str::to_string))
            .collect();
        assert_eq!(rejoined, texts.iter().map(|s| s.to_string()).collect::<Vec<_>>());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let opts = MergeOptions { max_chunk_chars: 6 };
        // " ééééé" is 6 chars (11 bytes), so no cut yet.
        let units = merge(&fragments(&["ééééé", "b"]), opts);
        assert_eq!(units, vec!["ééééé b"]);
    }

    #[test]
    fn whitespace_only_tail_is_dropped() {
        let units = merge(&fragments(&["end.", ""]), MergeOptions::default());
        assert_eq!(units, vec!["end."]);
    }

    #[test]
    fn whitespace_only_unit_cut_by_threshold_is_dropped() {
        let opts = MergeOptions { max_chunk_chars: 2 };
        let units = merge(&fragments(&["   ", "ok."]), opts);
        assert_eq!(units, vec!["ok."]);
    }
}
