use clash_types::{AnswerPayload, ChallengePayload, CommandError, WordChallenge};

/// Thresholds for the fuzzy text path. Empirically chosen values; kept
/// configurable because they materially affect fairness of "correct"
/// determinations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyConfig {
    /// Minimum ratio of submitted tokens that must match a ground-truth
    /// token for the token-overlap tier to accept.
    pub token_overlap: f64,
    /// Minimum per-token character similarity (same-position matches over
    /// the longer length) for two tokens to count as matching.
    pub char_similarity: f64,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            token_overlap: 0.80,
            char_similarity: 0.85,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub is_correct: bool,
    pub selected_index: Option<usize>,
}

/// Scores a submitted answer against the active challenge's ground truth.
/// Selection types compare exactly; free-text types go through a permissive
/// three-tier match that tolerates speech-to-text and typing noise.
#[derive(Debug, Clone)]
pub struct AnswerValidator {
    fuzzy: FuzzyConfig,
}

impl AnswerValidator {
    pub fn new(fuzzy: FuzzyConfig) -> Self {
        Self { fuzzy }
    }

    pub fn validate(
        &self,
        challenge: &WordChallenge,
        answer: &AnswerPayload,
    ) -> Result<Verdict, CommandError> {
        match (&challenge.payload, answer) {
            (
                ChallengePayload::MultipleChoice {
                    definitions,
                    correct_index,
                },
                AnswerPayload::MultipleChoice { selected_index },
            ) => {
                if *selected_index >= definitions.len() {
                    return Err(CommandError::validation("selected index out of range"));
                }
                Ok(Verdict {
                    is_correct: selected_index == correct_index,
                    selected_index: Some(*selected_index),
                })
            }
            (
                ChallengePayload::SentenceChoice {
                    sentences,
                    correct_index,
                },
                AnswerPayload::SentenceChoice { selected_index },
            ) => {
                if *selected_index >= sentences.len() {
                    return Err(CommandError::validation("selected index out of range"));
                }
                Ok(Verdict {
                    is_correct: selected_index == correct_index,
                    selected_index: Some(*selected_index),
                })
            }
            (
                ChallengePayload::Recording { sentence },
                AnswerPayload::Recording { transcript },
            ) => Ok(Verdict {
                is_correct: self.text_matches(transcript, sentence),
                selected_index: None,
            }),
            (
                ChallengePayload::SentenceScramble { correct_order, .. },
                AnswerPayload::ScrambleOrdering { ordering },
            ) => Ok(Verdict {
                is_correct: ordering == correct_order,
                selected_index: None,
            }),
            (
                ChallengePayload::SentenceScramble {
                    scrambled,
                    correct_order,
                },
                AnswerPayload::ScrambleSentence { sentence },
            ) => {
                let target = unscramble(scrambled, correct_order);
                Ok(Verdict {
                    is_correct: self.text_matches(sentence, &target),
                    selected_index: None,
                })
            }
            (ChallengePayload::Dictation { sentence }, AnswerPayload::Dictation { text }) => {
                Ok(Verdict {
                    is_correct: self.text_matches(text, sentence),
                    selected_index: None,
                })
            }
            _ => Err(CommandError::validation(
                "answer type does not match the current question",
            )),
        }
    }

    /// Three-tier acceptance for free-text answers. Tiers, most to least
    /// strict: exact normalized equality, positional token equality, and
    /// token-overlap with per-token character similarity.
    pub fn text_matches(&self, submitted: &str, truth: &str) -> bool {
        let submitted = normalize(submitted);
        let truth = normalize(truth);

        if submitted == truth {
            return true;
        }

        let submitted_tokens: Vec<&str> = submitted.split_whitespace().collect();
        let truth_tokens: Vec<&str> = truth.split_whitespace().collect();
        if submitted_tokens.len() != truth_tokens.len() || truth_tokens.is_empty() {
            return false;
        }

        if submitted_tokens
            .iter()
            .zip(truth_tokens.iter())
            .all(|(a, b)| a == b)
        {
            return true;
        }

        let matched = submitted_tokens
            .iter()
            .filter(|&&token| {
                truth_tokens.iter().any(|&truth_token| {
                    token == truth_token
                        || char_similarity(token, truth_token) >= self.fuzzy.char_similarity
                })
            })
            .count();

        matched as f64 / truth_tokens.len() as f64 >= self.fuzzy.token_overlap
    }
}

impl Default for AnswerValidator {
    fn default() -> Self {
        Self::new(FuzzyConfig::default())
    }
}

/// Lowercase, strip punctuation, collapse whitespace.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Characters matching at the same position over the longer length.
/// Tolerates substitution-style typos; insertions shift positions and score
/// low by design of the measure.
pub fn char_similarity(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let max_len = a_chars.len().max(b_chars.len());
    if max_len == 0 {
        return 1.0;
    }

    let matches = a_chars
        .iter()
        .zip(b_chars.iter())
        .filter(|(x, y)| x == y)
        .count();

    matches as f64 / max_len as f64
}

/// Reassemble the original sentence from the shuffled pieces:
/// `original[i] = scrambled[correct_order[i]]`.
pub fn unscramble(scrambled: &[String], correct_order: &[usize]) -> String {
    correct_order
        .iter()
        .filter_map(|&i| scrambled.get(i).map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
