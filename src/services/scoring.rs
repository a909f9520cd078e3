// src/services/scoring.rs

use std::collections::HashMap;

use serde::Serialize;

use crate::models::question::Question;

/// Outcome of scoring one submission against a question list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    /// floor(earned_points * 100 / total_points), or 0 when nothing is scorable.
    pub percentage: i32,
    pub correct_count: usize,
    pub earned_points: i64,
    pub total_points: i64,
}

/// Answer comparison: surrounding whitespace is ignored, case is ignored.
pub fn answers_match(submitted: &str, correct: &str) -> bool {
    submitted.trim().to_lowercase() == correct.trim().to_lowercase()
}

/// Sum of effective point values, the maximum a submission can earn.
pub fn total_points(questions: &[Question]) -> i64 {
    questions.iter().map(|q| q.effective_points() as i64).sum()
}

/// Scores a submission.
///
/// Every question is visited once. A question without an entry in `answers`
/// is incorrect. Answers for ids that are not part of `questions` are ignored.
/// Pass/fail is left to the caller so threshold edits never require rescoring.
pub fn score(questions: &[Question], answers: &HashMap<i64, String>) -> ScoreBreakdown {
    let mut earned_points: i64 = 0;
    let mut correct_count = 0;

    for question in questions {
        let Some(submitted) = answers.get(&question.id) else {
            continue;
        };

        if answers_match(submitted, &question.correct_answer) {
            earned_points += question.effective_points() as i64;
            correct_count += 1;
        }
    }

    let total_points = total_points(questions);

    // Integer division truncates: 2 of 3 is 66, not 67.
    let percentage = if total_points > 0 {
        (earned_points * 100 / total_points) as i32
    } else {
        0
    };

    ScoreBreakdown {
        percentage,
        correct_count,
        earned_points,
        total_points,
    }
}

pub fn is_passing(percentage: i32, passing_score: i32) -> bool {
    percentage >= passing_score
}
