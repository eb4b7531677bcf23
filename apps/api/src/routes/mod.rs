pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::batch::handlers as batch;
use crate::evaluation::handlers as evaluation;
use crate::extraction::handlers as extraction;
use crate::ranking::handlers as ranking;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Intake (Graph 1)
        .route(
            "/api/v1/candidates",
            post(extraction::handle_process_cv)
                .get(extraction::handle_find_candidates)
                .layer(DefaultBodyLimit::max(extraction::MAX_CV_BYTES)),
        )
        .route(
            "/api/v1/candidates/:id",
            get(extraction::handle_get_candidate),
        )
        .route(
            "/api/v1/candidates/:id/cv",
            get(extraction::handle_download_cv),
        )
        // Jobs and single evaluations (Graph 2)
        .route("/api/v1/jobs", post(evaluation::handle_create_job))
        .route("/api/v1/jobs/:id", get(evaluation::handle_get_job))
        .route("/api/v1/evaluations", post(evaluation::handle_evaluate))
        .route(
            "/api/v1/evaluations/:candidate_id/:job_id",
            get(ranking::handle_get_evaluation),
        )
        // Ranking
        .route(
            "/api/v1/jobs/:id/evaluate",
            post(ranking::handle_evaluate_job),
        )
        .route(
            "/api/v1/jobs/:id/rankings",
            get(ranking::handle_job_rankings),
        )
        .route(
            "/api/v1/candidates/:id/evaluations",
            get(ranking::handle_candidate_evaluations),
        )
        .route(
            "/api/v1/candidates/:id/job-rankings",
            post(ranking::handle_candidate_job_rankings),
        )
        // Batches
        .route("/api/v1/batches", post(batch::handle_run_batch))
        .route(
            "/api/v1/batches/directory",
            post(batch::handle_run_directory_batch),
        )
        .route("/api/v1/batches/:id", get(batch::handle_batch_report))
        .route(
            "/api/v1/batches/:id/candidates",
            get(batch::handle_batch_candidates),
        )
        .with_state(state)
}
