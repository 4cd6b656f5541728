// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, feedback, participant, quiz, results, session},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Public routes: team registration, quiz-code lookup, sessions, feedback.
/// * `/api/admin/*` except login sits behind auth + admin middleware.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let session_routes = Router::new()
        .route("/", post(session::start_session))
        .route("/{id}", get(session::get_session).delete(session::discard))
        .route("/{id}/answers", put(session::answer))
        .route("/{id}/navigate", post(session::navigate))
        .route("/{id}/next", post(session::next_question))
        .route("/{id}/previous", post(session::previous_question))
        .route("/{id}/submit", post(session::submit));

    let admin_routes = Router::new()
        .route(
            "/quizzes",
            get(admin::list_quizzes).post(admin::create_quiz),
        )
        .route(
            "/quizzes/{id}",
            put(admin::update_quiz).delete(admin::delete_quiz),
        )
        .route("/participants", get(admin::list_participants))
        .route(
            "/participants/{id}",
            delete(admin::delete_participant),
        )
        .route("/results", get(results::list_results))
        .route("/results/stats", get(results::result_stats))
        .route("/results/export", get(results::export_results))
        .route("/dashboard", get(admin::dashboard))
        .route("/feedback", get(feedback::list_feedback))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/api/admin/login", post(auth::login))
        .nest("/api/admin", admin_routes)
        .route("/api/participants", post(participant::register))
        .route("/api/quizzes/code/{code}", get(quiz::get_quiz_by_code))
        .nest("/api/sessions", session_routes)
        .route("/api/feedback", post(feedback::submit_feedback))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
