// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, course, enrollment, lesson, question, quiz},
    state::AppState,
    utils::jwt::{auth_middleware, staff_middleware},
};

/// Assembles the main application router.
///
/// * Public reads, student routes (bearer token) and staff routes (bearer
///   token with teacher/admin role) are merged per resource.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let course_routes = Router::new()
        .route("/", get(course::list_courses))
        .route("/{id}", get(course::get_course))
        .merge(
            Router::new()
                .route("/{id}/enroll", post(enrollment::enroll))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        )
        .merge(
            Router::new()
                .route("/", post(course::create_course))
                .route(
                    "/{id}",
                    put(course::update_course).delete(course::delete_course),
                )
                .route("/{id}/enrollments", get(course::list_course_enrollments))
                .layer(middleware::from_fn(staff_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let lesson_routes = Router::new()
        .route("/course/{course_id}", get(lesson::list_by_course))
        .route("/{id}", get(lesson::get_lesson))
        .merge(
            Router::new()
                .route("/", post(lesson::create_lesson))
                .route(
                    "/{id}",
                    put(lesson::update_lesson).delete(lesson::delete_lesson),
                )
                .layer(middleware::from_fn(staff_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let enrollment_routes = Router::new()
        .route("/me", get(enrollment::list_mine))
        .route("/{id}", delete(enrollment::unenroll))
        .route("/{id}/progress", put(enrollment::update_progress))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let quiz_routes = Router::new()
        .route("/lesson/{lesson_id}", get(quiz::list_by_lesson))
        .route("/{id}", get(quiz::get_quiz))
        .route("/{id}/questions", get(quiz::list_public_questions))
        // Any authenticated user
        .merge(
            Router::new()
                .route("/{id}/submit", post(quiz::submit_quiz))
                .route("/{id}/attempt", get(quiz::get_my_attempt))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        )
        // Teachers and admins: Auth first, then role check
        .merge(
            Router::new()
                .route("/", post(quiz::create_quiz))
                .route("/{id}", put(quiz::update_quiz).delete(quiz::delete_quiz))
                .route("/{id}/results", get(quiz::get_results))
                .route("/{id}/attempts", get(quiz::list_attempts))
                .layer(middleware::from_fn(staff_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let question_routes = Router::new()
        .route("/", post(question::create_question))
        .route(
            "/{id}",
            get(question::get_question)
                .put(question::update_question)
                .delete(question::delete_question),
        )
        .layer(middleware::from_fn(staff_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/courses", course_routes)
        .nest("/api/lessons", lesson_routes)
        .nest("/api/enrollments", enrollment_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/questions", question_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
