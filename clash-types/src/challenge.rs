use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum QuestionType {
    MultipleChoice,
    SentenceChoice,
    Recording,
    SentenceScramble,
    Dictation,
}

/// Type-specific question data, including the ground truth used for
/// validation. Never sent to clients as-is; see [`SafeChallengePayload`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "question_type")]
pub enum ChallengePayload {
    MultipleChoice {
        definitions: Vec<String>,
        correct_index: usize,
    },
    SentenceChoice {
        sentences: Vec<String>,
        correct_index: usize,
    },
    Recording {
        sentence: String,
    },
    SentenceScramble {
        scrambled: Vec<String>,
        correct_order: Vec<usize>,
    },
    Dictation {
        sentence: String,
    },
}

impl ChallengePayload {
    pub fn question_type(&self) -> QuestionType {
        match self {
            ChallengePayload::MultipleChoice { .. } => QuestionType::MultipleChoice,
            ChallengePayload::SentenceChoice { .. } => QuestionType::SentenceChoice,
            ChallengePayload::Recording { .. } => QuestionType::Recording,
            ChallengePayload::SentenceScramble { .. } => QuestionType::SentenceScramble,
            ChallengePayload::Dictation { .. } => QuestionType::Dictation,
        }
    }
}

/// The question for one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WordChallenge {
    pub word: String,
    pub payload: ChallengePayload,
    /// Whether this sentence was presented as a recording prompt earlier in
    /// the same game. Only meaningful for dictation; it doubles the round
    /// timer because the player now has to transcribe a sentence they
    /// already had to speak.
    pub was_recorded: bool,
}

impl WordChallenge {
    pub fn new(word: impl Into<String>, payload: ChallengePayload) -> Self {
        Self {
            word: word.into(),
            payload,
            was_recorded: false,
        }
    }

    pub fn question_type(&self) -> QuestionType {
        self.payload.question_type()
    }
}

/// One seat's submitted answer, tagged by question type so the validator
/// can match it exhaustively against the active challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "question_type")]
pub enum AnswerPayload {
    MultipleChoice { selected_index: usize },
    SentenceChoice { selected_index: usize },
    Recording { transcript: String },
    /// Scramble reconstructed as an explicit ordering of the shuffled
    /// pieces; judged by exact comparison against the stored ordering.
    ScrambleOrdering { ordering: Vec<usize> },
    /// Scramble typed out as a full sentence; judged by the fuzzy text path.
    ScrambleSentence { sentence: String },
    Dictation { text: String },
}

impl AnswerPayload {
    pub fn selected_index(&self) -> Option<usize> {
        match self {
            AnswerPayload::MultipleChoice { selected_index }
            | AnswerPayload::SentenceChoice { selected_index } => Some(*selected_index),
            _ => None,
        }
    }
}

/// Client-visible challenge payload with the answer key stripped out.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "question_type")]
pub enum SafeChallengePayload {
    MultipleChoice { definitions: Vec<String> },
    SentenceChoice { sentences: Vec<String> },
    Recording { sentence: String },
    SentenceScramble { scrambled: Vec<String> },
    Dictation { sentence: String },
}

impl From<&ChallengePayload> for SafeChallengePayload {
    fn from(payload: &ChallengePayload) -> Self {
        match payload {
            ChallengePayload::MultipleChoice { definitions, .. } => {
                SafeChallengePayload::MultipleChoice {
                    definitions: definitions.clone(),
                }
            }
            ChallengePayload::SentenceChoice { sentences, .. } => {
                SafeChallengePayload::SentenceChoice {
                    sentences: sentences.clone(),
                }
            }
            ChallengePayload::Recording { sentence } => SafeChallengePayload::Recording {
                sentence: sentence.clone(),
            },
            ChallengePayload::SentenceScramble { scrambled, .. } => {
                SafeChallengePayload::SentenceScramble {
                    scrambled: scrambled.clone(),
                }
            }
            ChallengePayload::Dictation { sentence } => SafeChallengePayload::Dictation {
                sentence: sentence.clone(),
            },
        }
    }
}

/// Safe version of [`WordChallenge`] that doesn't expose correct indices or
/// orderings. Used for poll responses where we need to protect game
/// integrity.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SafeChallenge {
    pub word: String,
    pub question_type: QuestionType,
    pub payload: SafeChallengePayload,
    pub was_recorded: bool,
}

impl From<&WordChallenge> for SafeChallenge {
    fn from(challenge: &WordChallenge) -> Self {
        SafeChallenge {
            word: challenge.word.clone(),
            question_type: challenge.question_type(),
            payload: SafeChallengePayload::from(&challenge.payload),
            was_recorded: challenge.was_recorded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_payload_tagged_by_question_type() {
        let answer = AnswerPayload::MultipleChoice { selected_index: 2 };
        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["question_type"], "MultipleChoice");
        assert_eq!(json["selected_index"], 2);
    }

    #[test]
    fn test_safe_challenge_hides_answer_key() {
        let challenge = WordChallenge::new(
            "cat",
            ChallengePayload::MultipleChoice {
                definitions: vec!["a small pet".into(), "a big tree".into()],
                correct_index: 0,
            },
        );
        let safe = SafeChallenge::from(&challenge);
        let json = serde_json::to_value(&safe).unwrap();
        assert!(json["payload"].get("correct_index").is_none());
        assert_eq!(json["question_type"], "MultipleChoice");
    }
}
