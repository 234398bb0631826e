use std::collections::{HashSet, VecDeque};

use rand::Rng;
use rand::seq::SliceRandom;

use clash_types::{ChallengePayload, WordChallenge};

use crate::validation::normalize;

/// Built-in vocabulary: word, definition, example sentence.
const VOCABULARY: &[(&str, &str, &str)] = &[
    ("kitchen", "the room where food is prepared", "We cook dinner in the kitchen every evening."),
    ("window", "an opening in a wall that lets light in", "She opened the window to let in fresh air."),
    ("garden", "an area where plants and flowers grow", "My grandmother waters the garden every morning."),
    ("breakfast", "the first meal of the day", "I always eat breakfast before going to school."),
    ("library", "a place where books are kept and borrowed", "He borrowed three books from the library."),
    ("weather", "the state of the atmosphere outside", "The weather is very nice today."),
    ("bicycle", "a two-wheeled vehicle powered by pedals", "She rides her bicycle to work every day."),
    ("teacher", "a person who helps students learn", "Our teacher explains everything very clearly."),
    ("market", "a place where people buy and sell goods", "They sell fresh fruit at the market."),
    ("holiday", "a day of rest or celebration", "We are planning a holiday by the sea."),
    ("neighbor", "a person who lives next door", "Our neighbor brought us a cake yesterday."),
    ("umbrella", "a device that protects you from rain", "Take your umbrella because it might rain."),
];

/// Supplies one `WordChallenge` per round. Pure data, no game state; the
/// session owns which sentences have already been recorded.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    source: Vec<WordChallenge>,
    queue: VecDeque<WordChallenge>,
}

impl QuestionBank {
    /// Bank over the built-in vocabulary, cycling all five question types
    /// in a shuffled order. Sentences used as recording prompts come back
    /// later as dictation prompts so the double-time rule comes up in
    /// normal play.
    pub fn builtin() -> Self {
        Self::from_source(generate_cycle())
    }

    /// Fixed challenge sequence, drawn in order. For tests and rehearsed
    /// lesson plans.
    pub fn scripted(challenges: Vec<WordChallenge>) -> Self {
        assert!(!challenges.is_empty(), "question bank needs at least one challenge");
        Self::from_source(challenges)
    }

    fn from_source(source: Vec<WordChallenge>) -> Self {
        let queue = source.iter().cloned().collect();
        Self { source, queue }
    }

    /// Draw the next challenge. `recorded_sentences` holds normalized
    /// sentences already presented as recording prompts in this game; a
    /// dictation of one of those is flagged `was_recorded`.
    pub fn draw(&mut self, recorded_sentences: &HashSet<String>) -> WordChallenge {
        if self.queue.is_empty() {
            self.queue = self.source.iter().cloned().collect();
        }
        let mut challenge = self
            .queue
            .pop_front()
            .expect("question bank is never empty");

        if let ChallengePayload::Dictation { sentence } = &challenge.payload {
            challenge.was_recorded = recorded_sentences.contains(&normalize(sentence));
        }

        challenge
    }
}

fn generate_cycle() -> Vec<WordChallenge> {
    let mut rng = rand::thread_rng();
    let mut order: Vec<usize> = (0..VOCABULARY.len()).collect();
    order.shuffle(&mut rng);

    let mut challenges = Vec::new();
    let mut recorded_entries = Vec::new();

    for (position, &entry) in order.iter().enumerate() {
        let challenge = match position % 5 {
            0 => multiple_choice(entry, &mut rng),
            1 => sentence_choice(entry, &mut rng),
            2 => {
                recorded_entries.push(entry);
                recording(entry)
            }
            3 => sentence_scramble(entry, &mut rng),
            _ => dictation(entry),
        };
        challenges.push(challenge);
    }

    // Re-present recorded sentences as dictation prompts later in the game.
    for entry in recorded_entries {
        challenges.push(dictation(entry));
    }

    challenges
}

fn multiple_choice(entry: usize, rng: &mut impl Rng) -> WordChallenge {
    let (word, definition, _) = VOCABULARY[entry];
    let (first, second) = distractors(entry, rng);

    let mut definitions = vec![
        definition.to_string(),
        VOCABULARY[first].1.to_string(),
        VOCABULARY[second].1.to_string(),
    ];
    let correct_index = shuffle_with_answer(&mut definitions, rng);

    WordChallenge::new(
        word,
        ChallengePayload::MultipleChoice {
            definitions,
            correct_index,
        },
    )
}

fn sentence_choice(entry: usize, rng: &mut impl Rng) -> WordChallenge {
    let (word, _, sentence) = VOCABULARY[entry];
    let (first, second) = distractors(entry, rng);

    let mut sentences = vec![
        sentence.to_string(),
        VOCABULARY[first].2.to_string(),
        VOCABULARY[second].2.to_string(),
    ];
    let correct_index = shuffle_with_answer(&mut sentences, rng);

    WordChallenge::new(
        word,
        ChallengePayload::SentenceChoice {
            sentences,
            correct_index,
        },
    )
}

fn recording(entry: usize) -> WordChallenge {
    let (word, _, sentence) = VOCABULARY[entry];
    WordChallenge::new(
        word,
        ChallengePayload::Recording {
            sentence: sentence.to_string(),
        },
    )
}

fn sentence_scramble(entry: usize, rng: &mut impl Rng) -> WordChallenge {
    let (word, _, sentence) = VOCABULARY[entry];
    let words: Vec<String> = sentence.split_whitespace().map(str::to_string).collect();

    let mut permutation: Vec<usize> = (0..words.len()).collect();
    permutation.shuffle(rng);
    if words.len() > 1 && permutation.iter().enumerate().all(|(i, &p)| i == p) {
        permutation.rotate_left(1);
    }

    let scrambled: Vec<String> = permutation.iter().map(|&i| words[i].clone()).collect();
    // correct_order[i] is the scrambled position of the i-th original word.
    let mut correct_order = vec![0; words.len()];
    for (scrambled_pos, &original_pos) in permutation.iter().enumerate() {
        correct_order[original_pos] = scrambled_pos;
    }

    WordChallenge::new(
        word,
        ChallengePayload::SentenceScramble {
            scrambled,
            correct_order,
        },
    )
}

fn dictation(entry: usize) -> WordChallenge {
    let (word, _, sentence) = VOCABULARY[entry];
    WordChallenge::new(
        word,
        ChallengePayload::Dictation {
            sentence: sentence.to_string(),
        },
    )
}

/// Two vocabulary indices distinct from `entry` and from each other.
fn distractors(entry: usize, rng: &mut impl Rng) -> (usize, usize) {
    let first = (entry + rng.gen_range(1..VOCABULARY.len())) % VOCABULARY.len();
    let mut second = (entry + rng.gen_range(1..VOCABULARY.len())) % VOCABULARY.len();
    while second == first || second == entry {
        second = (second + 1) % VOCABULARY.len();
    }
    (first, second)
}

/// Shuffle candidates in place; returns the new index of the answer that
/// started at position 0.
fn shuffle_with_answer(candidates: &mut [String], rng: &mut impl Rng) -> usize {
    let answer = candidates[0].clone();
    candidates.shuffle(rng);
    candidates
        .iter()
        .position(|c| c == &answer)
        .expect("shuffle keeps all candidates")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clash_types::QuestionType;

    #[test]
    fn test_builtin_covers_all_question_types() {
        let mut bank = QuestionBank::builtin();
        let recorded = HashSet::new();
        let mut seen = HashSet::new();
        for _ in 0..VOCABULARY.len() {
            seen.insert(bank.draw(&recorded).question_type());
        }
        assert!(seen.contains(&QuestionType::MultipleChoice));
        assert!(seen.contains(&QuestionType::SentenceChoice));
        assert!(seen.contains(&QuestionType::Recording));
        assert!(seen.contains(&QuestionType::SentenceScramble));
        assert!(seen.contains(&QuestionType::Dictation));
    }

    #[test]
    fn test_scripted_draws_in_order_and_cycles() {
        let first = WordChallenge::new(
            "kitchen",
            ChallengePayload::Dictation {
                sentence: "We cook dinner in the kitchen.".into(),
            },
        );
        let second = WordChallenge::new(
            "garden",
            ChallengePayload::Recording {
                sentence: "My grandmother waters the garden.".into(),
            },
        );
        let mut bank = QuestionBank::scripted(vec![first.clone(), second.clone()]);
        let recorded = HashSet::new();

        assert_eq!(bank.draw(&recorded).word, first.word);
        assert_eq!(bank.draw(&recorded).word, second.word);
        // Exhausted banks refill from the start.
        assert_eq!(bank.draw(&recorded).word, first.word);
    }

    #[test]
    fn test_dictation_of_recorded_sentence_is_flagged() {
        let challenge = WordChallenge::new(
            "weather",
            ChallengePayload::Dictation {
                sentence: "The weather is very nice today.".into(),
            },
        );
        let mut bank = QuestionBank::scripted(vec![challenge.clone(), challenge]);

        let fresh = bank.draw(&HashSet::new());
        assert!(!fresh.was_recorded);

        let mut recorded = HashSet::new();
        recorded.insert(normalize("The weather is very nice today."));
        let repeat = bank.draw(&recorded);
        assert!(repeat.was_recorded);
    }

    #[test]
    fn test_scramble_order_reassembles_sentence() {
        let mut rng = rand::thread_rng();
        let challenge = sentence_scramble(0, &mut rng);
        let ChallengePayload::SentenceScramble {
            scrambled,
            correct_order,
        } = &challenge.payload
        else {
            panic!("expected a scramble challenge");
        };

        let rebuilt = crate::validation::unscramble(scrambled, correct_order);
        assert_eq!(rebuilt, VOCABULARY[0].2);
    }
}
