// src/store/memory.rs

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    error::AppError,
    models::{
        attempt::QuizAttempt,
        course::{Course, CourseDraft, CourseFilter},
        enrollment::{COMPLETE_PROGRESS, Enrollment},
        lesson::{Lesson, LessonChanges, NewLesson},
        question::{Question, QuestionDraft},
        quiz::{NewQuiz, Quiz, QuizChanges},
        user::{NewUser, User},
    },
    store::{
        AttemptRepository, CourseCatalog, EnrollmentRepository, QuestionBank, QuizCatalog,
        UserRepository,
    },
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    courses: BTreeMap<i64, Course>,
    lessons: BTreeMap<i64, Lesson>,
    enrollments: BTreeMap<i64, Enrollment>,
    quizzes: BTreeMap<i64, Quiz>,
    questions: BTreeMap<i64, Question>,
    attempts: HashMap<(i64, i64), QuizAttempt>,
    user_seq: i64,
    course_seq: i64,
    lesson_seq: i64,
    enrollment_seq: i64,
    quiz_seq: i64,
    question_seq: i64,
    attempt_seq: i64,
}

fn next_id(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

impl Tables {
    /// Drops the given quizzes with their questions and attempts.
    fn remove_quizzes(&mut self, ids: &[i64]) {
        self.quizzes.retain(|id, _| !ids.contains(id));
        self.questions.retain(|_, q| !ids.contains(&q.quiz_id));
        self.attempts
            .retain(|(quiz_id, _), _| !ids.contains(quiz_id));
    }

    fn remove_lessons(&mut self, ids: &[i64]) {
        self.lessons.retain(|id, _| !ids.contains(id));
        let quiz_ids: Vec<i64> = self
            .quizzes
            .values()
            .filter(|q| ids.contains(&q.lesson_id))
            .map(|q| q.id)
            .collect();
        self.remove_quizzes(&quiz_ids);
    }
}

/// Process-local store for development and tests.
///
/// All tables sit behind one lock, so a write (including the attempt
/// find-then-write) is never interleaved with another write.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict(format!(
                "Username '{}' already exists",
                user.username
            )));
        }

        let id = next_id(&mut tables.user_seq);
        let created = User {
            id,
            username: user.username,
            password: user.password,
            role: user.role.as_str().to_string(),
            created_at: Some(Utc::now()),
        };
        tables.users.insert(id, created.clone());

        Ok(created)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl CourseCatalog for MemoryStore {
    async fn create_course(
        &self,
        teacher_id: Option<i64>,
        draft: CourseDraft,
    ) -> Result<Course, AppError> {
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.course_seq);
        let created = Course {
            id,
            title: draft.title,
            description: draft.description,
            category: draft.category,
            teacher_id,
            created_at: Utc::now(),
        };
        tables.courses.insert(id, created.clone());
        Ok(created)
    }

    async fn find_course(&self, id: i64) -> Result<Option<Course>, AppError> {
        Ok(self.tables.read().await.courses.get(&id).cloned())
    }

    async fn list_courses(&self, filter: &CourseFilter) -> Result<Vec<Course>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .courses
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }

    async fn update_course(
        &self,
        id: i64,
        draft: CourseDraft,
    ) -> Result<Option<Course>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(course) = tables.courses.get_mut(&id) else {
            return Ok(None);
        };
        course.title = draft.title;
        course.description = draft.description;
        course.category = draft.category;
        Ok(Some(course.clone()))
    }

    async fn delete_course(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.courses.remove(&id).is_none() {
            return Ok(false);
        }
        let lesson_ids: Vec<i64> = tables
            .lessons
            .values()
            .filter(|l| l.course_id == id)
            .map(|l| l.id)
            .collect();
        tables.remove_lessons(&lesson_ids);
        tables.enrollments.retain(|_, e| e.course_id != id);
        Ok(true)
    }

    async fn create_lesson(&self, lesson: NewLesson) -> Result<Lesson, AppError> {
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.lesson_seq);
        let created = Lesson {
            id,
            course_id: lesson.course_id,
            title: lesson.title,
            content: lesson.content,
            video_url: lesson.video_url,
            order_index: lesson.order_index,
        };
        tables.lessons.insert(id, created.clone());
        Ok(created)
    }

    async fn find_lesson(&self, id: i64) -> Result<Option<Lesson>, AppError> {
        Ok(self.tables.read().await.lessons.get(&id).cloned())
    }

    async fn lessons_for_course(&self, course_id: i64) -> Result<Vec<Lesson>, AppError> {
        let tables = self.tables.read().await;
        let mut lessons: Vec<Lesson> = tables
            .lessons
            .values()
            .filter(|l| l.course_id == course_id)
            .cloned()
            .collect();
        lessons.sort_by_key(|l| (l.order_index, l.id));
        Ok(lessons)
    }

    async fn update_lesson(
        &self,
        id: i64,
        changes: LessonChanges,
    ) -> Result<Option<Lesson>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(lesson) = tables.lessons.get_mut(&id) else {
            return Ok(None);
        };
        lesson.title = changes.title;
        lesson.content = changes.content;
        lesson.video_url = changes.video_url;
        if let Some(order_index) = changes.order_index {
            lesson.order_index = order_index;
        }
        Ok(Some(lesson.clone()))
    }

    async fn delete_lesson(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.lessons.contains_key(&id) {
            return Ok(false);
        }
        tables.remove_lessons(&[id]);
        Ok(true)
    }
}

#[async_trait]
impl EnrollmentRepository for MemoryStore {
    async fn enroll(
        &self,
        student_id: i64,
        course_id: i64,
        enrolled_at: DateTime<Utc>,
    ) -> Result<Enrollment, AppError> {
        let mut tables = self.tables.write().await;

        let taken = tables
            .enrollments
            .values()
            .any(|e| e.student_id == student_id && e.course_id == course_id);
        if taken {
            return Err(AppError::Conflict(format!(
                "Already enrolled in course {}",
                course_id
            )));
        }

        let id = next_id(&mut tables.enrollment_seq);
        let enrollment = Enrollment {
            id,
            student_id,
            course_id,
            enrolled_at,
            progress: 0,
            completed: false,
        };
        tables.enrollments.insert(id, enrollment.clone());
        Ok(enrollment)
    }

    async fn find_enrollment(&self, id: i64) -> Result<Option<Enrollment>, AppError> {
        Ok(self.tables.read().await.enrollments.get(&id).cloned())
    }

    async fn update_progress(
        &self,
        id: i64,
        progress: i32,
    ) -> Result<Option<Enrollment>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(enrollment) = tables.enrollments.get_mut(&id) else {
            return Ok(None);
        };
        enrollment.progress = progress;
        enrollment.completed = enrollment.completed || progress >= COMPLETE_PROGRESS;
        Ok(Some(enrollment.clone()))
    }

    async fn delete_enrollment(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.tables.write().await.enrollments.remove(&id).is_some())
    }

    async fn enrollments_for_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<Enrollment>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .enrollments
            .values()
            .filter(|e| e.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn enrollments_for_course(&self, course_id: i64) -> Result<Vec<Enrollment>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .enrollments
            .values()
            .filter(|e| e.course_id == course_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl QuestionBank for MemoryStore {
    async fn find_quiz_by_id(&self, id: i64) -> Result<Option<Quiz>, AppError> {
        Ok(self.tables.read().await.quizzes.get(&id).cloned())
    }

    async fn questions_for_quiz(&self, quiz_id: i64) -> Result<Vec<Question>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .questions
            .values()
            .filter(|q| q.quiz_id == quiz_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl QuizCatalog for MemoryStore {
    async fn create_quiz(&self, quiz: NewQuiz) -> Result<Quiz, AppError> {
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.quiz_seq);
        let created = Quiz {
            id,
            title: quiz.title,
            time_limit: quiz.time_limit,
            passing_score: quiz.passing_score,
            lesson_id: quiz.lesson_id,
        };
        tables.quizzes.insert(id, created.clone());
        Ok(created)
    }

    async fn update_quiz(&self, id: i64, changes: QuizChanges) -> Result<Option<Quiz>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(quiz) = tables.quizzes.get_mut(&id) else {
            return Ok(None);
        };
        quiz.title = changes.title;
        quiz.time_limit = changes.time_limit;
        quiz.passing_score = changes.passing_score;
        Ok(Some(quiz.clone()))
    }

    async fn delete_quiz(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.quizzes.contains_key(&id) {
            return Ok(false);
        }
        tables.remove_quizzes(&[id]);
        Ok(true)
    }

    async fn quizzes_for_lesson(&self, lesson_id: i64) -> Result<Vec<Quiz>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .quizzes
            .values()
            .filter(|q| q.lesson_id == lesson_id)
            .cloned()
            .collect())
    }

    async fn create_question(
        &self,
        quiz_id: i64,
        draft: QuestionDraft,
    ) -> Result<Question, AppError> {
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.question_seq);
        let created = Question {
            id,
            quiz_id,
            question_text: draft.question_text,
            options: draft.options,
            correct_answer: draft.correct_answer,
            points: Some(draft.points),
        };
        tables.questions.insert(id, created.clone());
        Ok(created)
    }

    async fn find_question(&self, id: i64) -> Result<Option<Question>, AppError> {
        Ok(self.tables.read().await.questions.get(&id).cloned())
    }

    async fn update_question(
        &self,
        id: i64,
        draft: QuestionDraft,
    ) -> Result<Option<Question>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(question) = tables.questions.get_mut(&id) else {
            return Ok(None);
        };
        question.question_text = draft.question_text;
        question.options = draft.options;
        question.correct_answer = draft.correct_answer;
        question.points = Some(draft.points);
        Ok(Some(question.clone()))
    }

    async fn delete_question(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.tables.write().await.questions.remove(&id).is_some())
    }
}

#[async_trait]
impl AttemptRepository for MemoryStore {
    async fn find_attempt(
        &self,
        quiz_id: i64,
        student_id: i64,
    ) -> Result<Option<QuizAttempt>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.attempts.get(&(quiz_id, student_id)).cloned())
    }

    async fn upsert_attempt(
        &self,
        quiz_id: i64,
        student_id: i64,
        score: i32,
        completed_at: DateTime<Utc>,
    ) -> Result<QuizAttempt, AppError> {
        let mut tables = self.tables.write().await;

        if let Some(existing) = tables.attempts.get_mut(&(quiz_id, student_id)) {
            existing.score = score;
            existing.completed_at = completed_at;
            return Ok(existing.clone());
        }

        let id = next_id(&mut tables.attempt_seq);
        let attempt = QuizAttempt {
            id,
            quiz_id,
            student_id,
            score,
            completed_at,
        };
        tables
            .attempts
            .insert((quiz_id, student_id), attempt.clone());
        Ok(attempt)
    }

    async fn attempts_for_quiz(&self, quiz_id: i64) -> Result<Vec<QuizAttempt>, AppError> {
        let tables = self.tables.read().await;
        let mut attempts: Vec<QuizAttempt> = tables
            .attempts
            .values()
            .filter(|a| a.quiz_id == quiz_id)
            .cloned()
            .collect();
        attempts.sort_by_key(|a| a.id);
        Ok(attempts)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::user::Role;

    fn new_quiz(lesson_id: i64) -> NewQuiz {
        NewQuiz {
            title: "Ownership".to_string(),
            time_limit: Some(10),
            passing_score: 70,
            lesson_id,
        }
    }

    fn draft(answer: &str) -> QuestionDraft {
        QuestionDraft::new("Q".to_string(), None, answer.to_string(), None)
    }

    #[tokio::test]
    async fn upsert_keeps_a_single_attempt_per_pair() {
        let store = MemoryStore::new();
        let first = store.upsert_attempt(1, 7, 40, Utc::now()).await.unwrap();
        let second = store.upsert_attempt(1, 7, 100, Utc::now()).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.score, 100);
        assert_eq!(store.attempts_for_quiz(1).await.unwrap().len(), 1);
        assert_eq!(
            store.find_attempt(1, 7).await.unwrap().map(|a| a.score),
            Some(100)
        );
    }

    #[tokio::test]
    async fn concurrent_upserts_for_one_pair_create_one_record() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for score in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.upsert_attempt(3, 9, score, Utc::now()).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.attempts_for_quiz(3).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn questions_are_scoped_and_ordered() {
        let store = MemoryStore::new();
        let a = store.create_quiz(new_quiz(1)).await.unwrap();
        let b = store.create_quiz(new_quiz(1)).await.unwrap();
        store.create_question(a.id, draft("A")).await.unwrap();
        store.create_question(b.id, draft("B")).await.unwrap();
        store.create_question(a.id, draft("C")).await.unwrap();

        let questions = store.questions_for_quiz(a.id).await.unwrap();
        let answers: Vec<&str> = questions.iter().map(|q| q.correct_answer.as_str()).collect();
        assert_eq!(answers, vec!["A", "C"]);
        assert!(store.questions_for_quiz(99).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_a_quiz_cascades() {
        let store = MemoryStore::new();
        let quiz = store.create_quiz(new_quiz(2)).await.unwrap();
        store.create_question(quiz.id, draft("A")).await.unwrap();
        store
            .upsert_attempt(quiz.id, 1, 50, Utc::now())
            .await
            .unwrap();

        assert!(store.delete_quiz(quiz.id).await.unwrap());
        assert!(!store.delete_quiz(quiz.id).await.unwrap());
        assert!(store.questions_for_quiz(quiz.id).await.unwrap().is_empty());
        assert!(store.find_attempt(quiz.id, 1).await.unwrap().is_none());
    }

    fn course_draft(category: &str) -> CourseDraft {
        CourseDraft {
            title: "Rust".to_string(),
            description: None,
            category: Some(category.to_string()),
        }
    }

    fn new_lesson(course_id: i64, order_index: i32) -> NewLesson {
        NewLesson {
            course_id,
            title: format!("Lesson {}", order_index),
            content: None,
            video_url: None,
            order_index,
        }
    }

    #[tokio::test]
    async fn courses_are_filtered_by_category_and_teacher() {
        let store = MemoryStore::new();
        store.create_course(Some(1), course_draft("systems")).await.unwrap();
        store.create_course(Some(2), course_draft("systems")).await.unwrap();
        store.create_course(Some(1), course_draft("web")).await.unwrap();

        let all = store.list_courses(&CourseFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let filter = CourseFilter {
            category: Some("systems".to_string()),
            teacher_id: Some(1),
        };
        let matched = store.list_courses(&filter).await.unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].teacher_id, Some(1));
    }

    #[tokio::test]
    async fn lessons_are_ordered_by_position() {
        let store = MemoryStore::new();
        let course = store.create_course(None, course_draft("systems")).await.unwrap();
        store.create_lesson(new_lesson(course.id, 2)).await.unwrap();
        store.create_lesson(new_lesson(course.id, 0)).await.unwrap();
        store.create_lesson(new_lesson(course.id, 1)).await.unwrap();

        let positions: Vec<i32> = store
            .lessons_for_course(course.id)
            .await
            .unwrap()
            .iter()
            .map(|l| l.order_index)
            .collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn lesson_update_keeps_position_when_omitted() {
        let store = MemoryStore::new();
        let course = store.create_course(None, course_draft("systems")).await.unwrap();
        let lesson = store.create_lesson(new_lesson(course.id, 3)).await.unwrap();

        let changes = LessonChanges {
            title: "Traits".to_string(),
            content: Some("<p>dyn</p>".to_string()),
            video_url: None,
            order_index: None,
        };
        let updated = store.update_lesson(lesson.id, changes).await.unwrap().unwrap();

        assert_eq!(updated.title, "Traits");
        assert_eq!(updated.order_index, 3);
    }

    #[tokio::test]
    async fn deleting_a_course_cascades_to_lessons_quizzes_and_enrollments() {
        let store = MemoryStore::new();
        let course = store.create_course(None, course_draft("systems")).await.unwrap();
        let lesson = store.create_lesson(new_lesson(course.id, 0)).await.unwrap();
        let quiz = store.create_quiz(new_quiz(lesson.id)).await.unwrap();
        store.create_question(quiz.id, draft("A")).await.unwrap();
        store.upsert_attempt(quiz.id, 5, 80, Utc::now()).await.unwrap();
        let enrollment = store.enroll(5, course.id, Utc::now()).await.unwrap();

        assert!(store.delete_course(course.id).await.unwrap());

        assert!(store.find_lesson(lesson.id).await.unwrap().is_none());
        assert!(store.find_quiz_by_id(quiz.id).await.unwrap().is_none());
        assert!(store.questions_for_quiz(quiz.id).await.unwrap().is_empty());
        assert!(store.find_attempt(quiz.id, 5).await.unwrap().is_none());
        assert!(store.find_enrollment(enrollment.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_enrollment_conflicts() {
        let store = MemoryStore::new();
        store.enroll(3, 1, Utc::now()).await.unwrap();

        let err = store.enroll(3, 1, Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.enrollments_for_student(3).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn full_progress_completes_for_good() {
        let store = MemoryStore::new();
        let enrollment = store.enroll(3, 1, Utc::now()).await.unwrap();

        let halfway = store.update_progress(enrollment.id, 50).await.unwrap().unwrap();
        assert!(!halfway.completed);

        let done = store.update_progress(enrollment.id, 100).await.unwrap().unwrap();
        assert!(done.completed);

        let revisited = store.update_progress(enrollment.id, 80).await.unwrap().unwrap();
        assert_eq!(revisited.progress, 80);
        assert!(revisited.completed);

        assert!(store.update_progress(999, 10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = MemoryStore::new();
        let user = NewUser {
            username: "ada".to_string(),
            password: "hash".to_string(),
            role: Role::Student,
        };
        store.create_user(user.clone()).await.unwrap();

        let err = store.create_user(user).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
