// src/services/submission.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::attempt::{QuizResults, SubmissionResult},
    services::scoring,
    store::{AttemptRepository, QuestionBank},
};

/// Scores a submission and records it as the student's attempt.
///
/// * Resolves the quiz, failing with `NotFound` before anything is written.
/// * Scores against the quiz's current questions.
/// * Upserts the (quiz, student) attempt with the percentage and current time.
pub async fn submit_quiz<S>(
    store: &S,
    quiz_id: i64,
    student_id: i64,
    answers: &HashMap<i64, String>,
) -> Result<SubmissionResult, AppError>
where
    S: QuestionBank + AttemptRepository + ?Sized,
{
    submit_quiz_at(store, quiz_id, student_id, answers, Utc::now()).await
}

pub async fn submit_quiz_at<S>(
    store: &S,
    quiz_id: i64,
    student_id: i64,
    answers: &HashMap<i64, String>,
    completed_at: DateTime<Utc>,
) -> Result<SubmissionResult, AppError>
where
    S: QuestionBank + AttemptRepository + ?Sized,
{
    let quiz = store
        .find_quiz_by_id(quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found", quiz_id)))?;

    let questions = store.questions_for_quiz(quiz.id).await?;
    let breakdown = scoring::score(&questions, answers);
    let passed = scoring::is_passing(breakdown.percentage, quiz.passing_score);

    let attempt = store
        .upsert_attempt(quiz.id, student_id, breakdown.percentage, completed_at)
        .await?;

    tracing::info!(
        quiz_id = quiz.id,
        student_id,
        attempt_id = attempt.id,
        score = breakdown.percentage,
        passed,
        "Quiz submission scored"
    );

    Ok(SubmissionResult {
        attempt_id: attempt.id,
        score: breakdown.percentage,
        passed,
        passing_score: quiz.passing_score,
        total_questions: questions.len(),
        correct_answers: breakdown.correct_count,
        earned_points: breakdown.earned_points,
        total_points: breakdown.total_points,
        completed_at: attempt.completed_at,
    })
}

/// Answer-key projection of a quiz: question count, total points and the questions.
pub async fn quiz_results<S>(store: &S, quiz_id: i64) -> Result<QuizResults, AppError>
where
    S: QuestionBank + ?Sized,
{
    let quiz = store
        .find_quiz_by_id(quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found", quiz_id)))?;

    let questions = store.questions_for_quiz(quiz.id).await?;

    Ok(QuizResults {
        quiz_id: quiz.id,
        total_questions: questions.len(),
        total_points: scoring::total_points(&questions),
        questions,
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        models::{
            attempt::QuizAttempt,
            question::{Question, QuestionDraft},
            quiz::{NewQuiz, Quiz},
        },
        store::{MemoryStore, QuizCatalog},
    };

    async fn seed_quiz(store: &MemoryStore, passing_score: i32, answers: &[&str]) -> Quiz {
        let quiz = store
            .create_quiz(NewQuiz {
                title: "Borrowing".to_string(),
                time_limit: None,
                passing_score,
                lesson_id: 1,
            })
            .await
            .unwrap();
        for answer in answers {
            store
                .create_question(
                    quiz.id,
                    QuestionDraft::new("Q".to_string(), None, answer.to_string(), None),
                )
                .await
                .unwrap();
        }
        quiz
    }

    async fn question_ids(store: &MemoryStore, quiz_id: i64) -> Vec<i64> {
        store
            .questions_for_quiz(quiz_id)
            .await
            .unwrap()
            .iter()
            .map(|q| q.id)
            .collect()
    }

    fn submission(ids: &[i64], answers: &[&str]) -> HashMap<i64, String> {
        ids.iter()
            .zip(answers)
            .map(|(id, a)| (*id, a.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn all_correct_passes() {
        let store = MemoryStore::new();
        let quiz = seed_quiz(&store, 70, &["A", "B"]).await;
        let ids = question_ids(&store, quiz.id).await;

        let result = submit_quiz(&store, quiz.id, 1, &submission(&ids, &["A", "B"]))
            .await
            .unwrap();

        assert_eq!(result.score, 100);
        assert!(result.passed);
        assert_eq!(result.passing_score, 70);
        assert_eq!(result.total_questions, 2);
        assert_eq!(result.correct_answers, 2);
        assert_eq!(result.earned_points, 2);
        assert_eq!(result.total_points, 2);
    }

    #[tokio::test]
    async fn half_correct_fails() {
        let store = MemoryStore::new();
        let quiz = seed_quiz(&store, 70, &["A", "B"]).await;
        let ids = question_ids(&store, quiz.id).await;

        let result = submit_quiz(&store, quiz.id, 1, &submission(&ids, &["A", "C"]))
            .await
            .unwrap();

        assert_eq!(result.score, 50);
        assert!(!result.passed);
        assert_eq!(result.correct_answers, 1);
    }

    #[tokio::test]
    async fn two_of_three_is_sixty_six() {
        let store = MemoryStore::new();
        let quiz = seed_quiz(&store, 70, &["A", "B", "C"]).await;
        let ids = question_ids(&store, quiz.id).await;

        let result = submit_quiz(&store, quiz.id, 1, &submission(&ids, &["A", "B", "X"]))
            .await
            .unwrap();

        assert_eq!(result.score, 66);
        assert!(!result.passed);
    }

    #[tokio::test]
    async fn empty_quiz_scores_zero() {
        let store = MemoryStore::new();
        let quiz = seed_quiz(&store, 70, &[]).await;

        let result = submit_quiz(&store, quiz.id, 1, &HashMap::new())
            .await
            .unwrap();

        assert_eq!(result.score, 0);
        assert_eq!(result.total_points, 0);
        assert!(!result.passed);

        let lenient = seed_quiz(&store, 0, &[]).await;
        let result = submit_quiz(&store, lenient.id, 1, &HashMap::new())
            .await
            .unwrap();
        assert!(result.passed);
    }

    #[tokio::test]
    async fn resubmission_overwrites_the_attempt() {
        let store = MemoryStore::new();
        let quiz = seed_quiz(&store, 70, &["A", "B", "C", "D", "E"]).await;
        let ids = question_ids(&store, quiz.id).await;
        let first_time = Utc::now() - chrono::Duration::minutes(5);

        let first = submit_quiz_at(
            &store,
            quiz.id,
            4,
            &submission(&ids, &["A", "B", "X", "X", "X"]),
            first_time,
        )
        .await
        .unwrap();
        assert_eq!(first.score, 40);

        let second = submit_quiz(
            &store,
            quiz.id,
            4,
            &submission(&ids, &["A", "B", "C", "D", "E"]),
        )
        .await
        .unwrap();
        assert_eq!(second.score, 100);
        assert_eq!(first.attempt_id, second.attempt_id);

        let attempts = store.attempts_for_quiz(quiz.id).await.unwrap();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].score, 100);
        assert!(attempts[0].completed_at > first_time);
    }

    #[tokio::test]
    async fn unknown_quiz_is_not_found_and_writes_nothing() {
        let store = MemoryStore::new();

        let err = submit_quiz(&store, 42, 1, &HashMap::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(store.find_attempt(42, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn results_report_totals() {
        let store = MemoryStore::new();
        let quiz = seed_quiz(&store, 70, &["A", "B"]).await;
        store
            .create_question(
                quiz.id,
                QuestionDraft::new("Q".to_string(), None, "C".to_string(), Some(3)),
            )
            .await
            .unwrap();

        let results = quiz_results(&store, quiz.id).await.unwrap();

        assert_eq!(results.total_questions, 3);
        assert_eq!(results.total_points, 5);
        assert_eq!(results.questions.len(), 3);
        assert!(matches!(
            quiz_results(&store, 999).await,
            Err(AppError::NotFound(_))
        ));
    }

    /// Storage whose attempt writes always fail.
    struct BrokenAttempts {
        inner: MemoryStore,
    }

    #[async_trait]
    impl QuestionBank for BrokenAttempts {
        async fn find_quiz_by_id(&self, id: i64) -> Result<Option<Quiz>, AppError> {
            self.inner.find_quiz_by_id(id).await
        }

        async fn questions_for_quiz(&self, quiz_id: i64) -> Result<Vec<Question>, AppError> {
            self.inner.questions_for_quiz(quiz_id).await
        }
    }

    #[async_trait]
    impl AttemptRepository for BrokenAttempts {
        async fn find_attempt(
            &self,
            quiz_id: i64,
            student_id: i64,
        ) -> Result<Option<QuizAttempt>, AppError> {
            self.inner.find_attempt(quiz_id, student_id).await
        }

        async fn upsert_attempt(
            &self,
            _quiz_id: i64,
            _student_id: i64,
            _score: i32,
            _completed_at: DateTime<Utc>,
        ) -> Result<QuizAttempt, AppError> {
            Err(AppError::InternalServerError("connection reset".to_string()))
        }

        async fn attempts_for_quiz(&self, quiz_id: i64) -> Result<Vec<QuizAttempt>, AppError> {
            self.inner.attempts_for_quiz(quiz_id).await
        }
    }

    #[tokio::test]
    async fn storage_failure_fails_the_submission() {
        let inner = MemoryStore::new();
        let quiz = seed_quiz(&inner, 70, &["A"]).await;
        let store = BrokenAttempts { inner };

        let err = submit_quiz(&store, quiz.id, 1, &HashMap::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InternalServerError(_)));
        assert!(store.find_attempt(quiz.id, 1).await.unwrap().is_none());
    }
}
