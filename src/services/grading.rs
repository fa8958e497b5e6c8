use serde::Serialize;

use crate::db::models::AnswerItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Verdict {
    Correct,
    Incorrect,
}

impl Verdict {
    pub(crate) fn is_correct(self) -> bool {
        self == Self::Correct
    }

    pub(crate) fn message(self) -> &'static str {
        match self {
            Self::Correct => "Correct answer",
            Self::Incorrect => "Incorrect answer",
        }
    }
}

/// Exact, case-sensitive match against every answer flagged correct.
pub(crate) fn grade_answer(submitted: &str, answers: &[AnswerItem]) -> Verdict {
    if answers.iter().any(|answer| answer.is_true && answer.text == submitted) {
        Verdict::Correct
    } else {
        Verdict::Incorrect
    }
}
