//! Router configuration for the HTTP API.
//!
//! This module sets up all routes and middleware (CORS, tracing, body limit)
//! and creates the axum router ready for serving.

use super::handlers::{academics, admin, auth, finance, functions, parent, public, teacher};
use super::{handlers, state::AppState};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::sign_up))
        .route("/signin", post(auth::sign_in))
        .route("/signout", post(auth::sign_out))
        .route("/session", get(auth::session))
        .route("/profile-photo", put(auth::upload_profile_photo))
}

fn function_routes() -> Router<AppState> {
    Router::new()
        .route("/createTeacherAccount", post(functions::create_teacher_account))
        .route("/resetTeacherPassword", post(functions::reset_teacher_password))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        // School
        .route("/school", get(admin::get_school).post(admin::create_school))
        .route("/school/registration-available", get(admin::registration_available))
        // Students
        .route("/students", get(admin::list_students).post(admin::create_student))
        .route(
            "/students/{id}",
            get(admin::get_student).put(admin::update_student).delete(admin::delete_student),
        )
        .route("/students/{id}/status", put(admin::update_student_status))
        .route("/students/{id}/enrollments", get(academics::student_enrollments))
        // Teachers
        .route("/teachers", get(admin::list_teachers).post(admin::create_teacher))
        .route(
            "/teachers/{id}",
            get(admin::get_teacher).put(admin::update_teacher).delete(admin::delete_teacher),
        )
        .route("/teachers/{id}/status", put(admin::update_teacher_status))
        // Classes and enrollments
        .route("/classes", get(academics::list_classes).post(academics::create_class))
        .route(
            "/classes/{id}",
            get(academics::get_class).put(academics::update_class).delete(academics::delete_class),
        )
        .route("/classes/{id}/status", put(academics::update_class_status))
        .route("/classes/{id}/teacher", put(academics::assign_teacher))
        .route("/classes/{id}/capacity", get(academics::class_capacity))
        .route(
            "/classes/{id}/enrollments",
            get(academics::class_enrollments).post(academics::enroll_student),
        )
        .route("/enrollments/{id}", axum::routing::delete(academics::unenroll))
        // Subjects
        .route("/subjects", get(academics::list_subjects).post(academics::create_subject))
        .route("/subjects/code-available", get(academics::subject_code_available))
        .route(
            "/subjects/{id}",
            get(academics::get_subject).put(academics::update_subject).delete(academics::delete_subject),
        )
        .route("/subjects/{id}/toggle", post(academics::toggle_subject))
        // Grade levels
        .route("/grade-levels", get(academics::list_grade_levels).post(academics::create_grade_level))
        .route(
            "/grade-levels/{id}",
            get(academics::get_grade_level)
                .put(academics::update_grade_level)
                .delete(academics::delete_grade_level),
        )
        .route("/grade-levels/{id}/toggle", post(academics::toggle_grade_level))
        // Announcements
        .route("/announcements", get(admin::list_announcements).post(admin::create_announcement))
        .route(
            "/announcements/{id}",
            get(admin::get_announcement)
                .put(admin::update_announcement)
                .delete(admin::delete_announcement),
        )
        .route("/announcements/{id}/status", put(admin::update_announcement_status))
        // Activity log, dashboard and reports
        .route("/activities", get(admin::list_activities))
        .route("/activities/recent", get(admin::recent_activities))
        .route("/dashboard", get(admin::dashboard))
        .route("/reports/summary", get(admin::report_summary))
        .route("/reports/activity", get(admin::activity_metrics))
        .route("/reports/activity-trend", get(admin::activity_trend))
        .route("/reports/enrollment", get(admin::enrollment_metrics))
        .route("/reports/teachers", get(admin::teacher_metrics))
        // Finance
        .route("/finance/summary", get(finance::summary))
        .route("/finance/fees", get(finance::list_fees).post(finance::create_fee))
        .route(
            "/finance/fees/{id}",
            get(finance::get_fee).put(finance::update_fee).delete(finance::delete_fee),
        )
        .route("/finance/fees/{id}/toggle", post(finance::toggle_fee))
        .route("/finance/fees/{id}/due-date", get(finance::fee_due_date))
        .route("/finance/due-dates", get(finance::list_due_dates).post(finance::create_due_date))
        .route("/finance/due-dates/resolve", post(finance::resolve_due_date))
        .route(
            "/finance/due-dates/{id}",
            put(finance::update_due_date).delete(finance::delete_due_date),
        )
        .route("/finance/payments", get(finance::list_payments).post(finance::create_payment))
        .route(
            "/finance/payments/{id}",
            get(finance::get_payment).put(finance::update_payment).delete(finance::delete_payment),
        )
        .route("/finance/payments/{id}/status", put(finance::update_payment_status))
        .route("/finance/payments/{id}/receipt", post(finance::generate_receipt))
        .route("/finance/payments/{id}/penalty", get(finance::payment_penalty))
}

fn teacher_routes() -> Router<AppState> {
    Router::new()
        .route("/classes", get(teacher::my_classes))
        .route("/classes/{id}/students", get(teacher::class_students))
        .route("/classes/{id}/grades", get(teacher::class_grades))
        .route("/classes/{id}/grades/summary", get(teacher::grade_summaries))
        .route("/classes/{id}/attendance", get(teacher::class_attendance))
        .route("/classes/{id}/attendance/stats", get(teacher::attendance_stats))
        .route("/grades", post(teacher::add_grade))
        .route("/grades/{id}", put(teacher::update_grade).delete(teacher::delete_grade))
        .route("/attendance", post(teacher::record_attendance))
        .route(
            "/attendance/{id}",
            put(teacher::update_attendance).delete(teacher::delete_attendance),
        )
        .route("/absence-requests", get(teacher::absence_requests))
        .route("/absence-requests/pending-count", get(teacher::pending_requests))
        .route("/absence-requests/{id}/review", post(teacher::review_request))
        .route("/absence-requests/{id}/attachment", get(teacher::request_attachment))
}

fn parent_routes() -> Router<AppState> {
    Router::new()
        .route("/children", get(parent::children))
        .route("/children/{id}", get(parent::child))
        .route("/children/{id}/grades", get(parent::child_grades))
        .route("/children/{id}/attendance", get(parent::child_attendance))
        .route("/children/{id}/absence-requests", get(parent::child_requests))
        .route(
            "/children/{id}/absence-requests/{request_id}/attachment",
            put(parent::upload_attachment),
        )
        .route("/absence-requests", post(parent::create_request))
        .route("/announcements", get(parent::announcements))
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/announcements", get(public::announcements))
        .route("/announcements/all", get(public::all_announcements))
}

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .nest("/auth", auth_routes())
        .nest("/functions", function_routes())
        .nest("/admin", admin_routes())
        .nest("/teacher", teacher_routes())
        .nest("/parent", parent_routes())
        .nest("/public", public_routes());

    let body_limit = state.settings.storage.max_upload_bytes;

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
