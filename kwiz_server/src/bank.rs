// Read-only question and answer table.
//
// Built once at startup from the game config and never mutated afterwards:
// the round machine looks up question text by round index and hands the
// accepted answers to the scoring engine. Lookups past the loaded question
// count are valid and come back empty; games can be configured with more
// rounds than questions.
//
// Answer matching folds ASCII case only: cheap and locale-independent.
// Multi-byte characters compare exactly, so "paris" matches "PARIS" but
// "paryż" does not match "PARYŻ".

use crate::config::GameConfig;

/// Immutable question/answer table indexed by round number.
#[derive(Clone, Debug, Default)]
pub struct AnswerBank {
    questions: Vec<BankEntry>,
}

#[derive(Clone, Debug)]
struct BankEntry {
    text: String,
    accepted: Vec<String>,
}

impl AnswerBank {
    /// Build the bank from a loaded config.
    pub fn from_config(config: &GameConfig) -> AnswerBank {
        AnswerBank {
            questions: config
                .questions
                .iter()
                .map(|q| BankEntry {
                    text: q.question.clone(),
                    accepted: q.answers.clone(),
                })
                .collect(),
        }
    }

    /// Number of loaded questions.
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Question text for a round, `None` past the loaded questions.
    pub fn question_text(&self, round: u32) -> Option<&str> {
        self.questions.get(round as usize).map(|q| q.text.as_str())
    }

    /// Accepted answers for a round, empty past the loaded questions.
    pub fn accepted_answers(&self, round: u32) -> &[String] {
        match self.questions.get(round as usize) {
            Some(q) => &q.accepted,
            None => &[],
        }
    }

    /// Whether `answer` scores for `round`.
    pub fn is_accepted(&self, round: u32, answer: &str) -> bool {
        self.accepted_answers(round)
            .iter()
            .any(|a| a.eq_ignore_ascii_case(answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuestionConfig;

    fn sample_bank() -> AnswerBank {
        AnswerBank::from_config(&GameConfig {
            time_limit_secs: 30,
            max_rounds: 3,
            questions: vec![
                QuestionConfig {
                    question: "Stolica Francji?".into(),
                    answers: vec!["Paryż".into(), "Paris".into()],
                },
                QuestionConfig {
                    question: "Bez odpowiedzi?".into(),
                    answers: vec![],
                },
            ],
        })
    }

    #[test]
    fn question_lookup_by_round() {
        let bank = sample_bank();
        assert_eq!(bank.question_count(), 2);
        assert_eq!(bank.question_text(0), Some("Stolica Francji?"));
        assert_eq!(bank.question_text(1), Some("Bez odpowiedzi?"));
        assert_eq!(bank.question_text(2), None);
    }

    #[test]
    fn accepted_answers_past_the_bank_are_empty() {
        let bank = sample_bank();
        assert_eq!(bank.accepted_answers(0).len(), 2);
        assert!(bank.accepted_answers(7).is_empty());
        assert!(!bank.is_accepted(7, "Paris"));
    }

    #[test]
    fn matching_folds_ascii_case_only() {
        let bank = sample_bank();
        assert!(bank.is_accepted(0, "paris"));
        assert!(bank.is_accepted(0, "PARIS"));
        assert!(bank.is_accepted(0, "Paryż"));
        // Ż is outside ASCII, so the fold does not equate it with ż.
        assert!(!bank.is_accepted(0, "paryż"));
        assert!(!bank.is_accepted(0, "Londyn"));
    }

    #[test]
    fn question_without_answers_accepts_nothing() {
        let bank = sample_bank();
        assert!(!bank.is_accepted(1, ""));
        assert!(!bank.is_accepted(1, "cokolwiek"));
    }
}
