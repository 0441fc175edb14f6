use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::middleware::rate_limit::rate_limit_general;
use crate::middleware::role::{require_admin, require_staff};
use crate::modules::academic_years::router::init_academic_years_router;
use crate::modules::announcements::router::init_announcements_router;
use crate::modules::assignments::router::init_assignments_router;
use crate::modules::attendance::router::init_attendance_router;
use crate::modules::auth::router::init_auth_router;
use crate::modules::classrooms::router::init_classrooms_router;
use crate::modules::dashboard::router::init_dashboard_router;
use crate::modules::exams::router::init_exams_router;
use crate::modules::halls::router::init_halls_router;
use crate::modules::parents::router::init_parents_router;
use crate::modules::payments::router::init_payments_router;
use crate::modules::results::router::init_results_router;
use crate::modules::students::router::init_students_router;
use crate::modules::subjects::router::init_subjects_router;
use crate::modules::teachers::router::init_teachers_router;
use crate::modules::timetables::router::init_timetables_router;
use crate::state::AppState;
use axum::http::{HeaderValue, Method};
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

fn api_router(state: &AppState) -> Router<AppState> {
    let admin = || middleware::from_fn_with_state(state.clone(), require_admin);
    let staff = || middleware::from_fn_with_state(state.clone(), require_staff);

    Router::new()
        .nest("/auth", init_auth_router(state.clone()))
        .nest("/academic-years", init_academic_years_router())
        .nest("/students", init_students_router())
        .nest("/parents", init_parents_router())
        .nest("/classrooms", init_classrooms_router())
        .nest("/subjects", init_subjects_router())
        .nest("/announcements", init_announcements_router())
        .nest("/teachers", init_teachers_router().route_layer(staff()))
        .nest("/halls", init_halls_router().route_layer(staff()))
        .nest("/exams", init_exams_router().route_layer(staff()))
        .nest("/attendance", init_attendance_router().route_layer(staff()))
        .nest("/results", init_results_router().route_layer(staff()))
        .nest("/timetables", init_timetables_router().route_layer(staff()))
        .nest("/assignments", init_assignments_router().route_layer(staff()))
        .nest("/payments", init_payments_router().route_layer(admin()))
        .nest("/dashboard", init_dashboard_router().route_layer(admin()))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_general,
        ))
}

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .nest("/api", api_router(&state))
        .with_state(state.clone())
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_credentials(true)
        })
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
