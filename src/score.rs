//! Score extraction from unstructured model responses.
//!
//! The reviewer prompt asks the model to end with `Soundness Score: [n]` and
//! `Novelty Score: [n]`, but models rarely comply exactly. The parser searches
//! the whole response for each label independently, so a malformed or missing
//! soundness line never blocks novelty extraction (and vice versa).

use regex::Regex;

/// Scores pulled from one response. Either field may be absent independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParsedScores {
    pub soundness: Option<u8>,
    pub novelty: Option<u8>,
}

/// Compiled patterns for both score labels. Build once, reuse across the run.
pub struct ScoreParser {
    soundness: Regex,
    novelty: Regex,
}

impl ScoreParser {
    pub fn new() -> Self {
        // "soundness", optional " score", optional colon, optional whitespace,
        // then a one-or-two-digit integer as a whole word. First match wins.
        Self {
            soundness: Self::label_pattern("soundness"),
            novelty: Self::label_pattern("novelty"),
        }
    }

    fn label_pattern(label: &str) -> Regex {
        let pattern = format!(r"(?i){label}(?: score)?:?\s*\b(\d{{1,2}})\b");
        Regex::new(&pattern).expect("score pattern is valid")
    }

    /// Extracts both scores from `response`. Values outside the nominal 1-10
    /// range are captured as-is; range validation belongs downstream.
    pub fn parse(&self, response: &str) -> ParsedScores {
        ParsedScores {
            soundness: Self::first_capture(&self.soundness, response),
            novelty: Self::first_capture(&self.novelty, response),
        }
    }

    fn first_capture(pattern: &Regex, response: &str) -> Option<u8> {
        pattern
            .captures(response)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

impl Default for ScoreParser {
    fn default() -> Self {
        Self::new()
    }
}
