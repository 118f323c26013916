//! Shared test utilities for the school manager.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test records with sensible defaults.

use crate::{
    core::{
        activity::Actor,
        auth::{self, AuthPolicy, SignUpRequest},
        class::{self, NewClass},
        enrollment,
        financial::{fees::NewFee, payments::NewPayment},
        grade::NewGrade,
        grade_level::{self, NewGradeLevel},
        student::{self, NewStudent},
        subject::{self, NewSubject},
        teacher::{self, NewTeacher},
    },
    entities::{
        self,
        fee::{BillingCycle, FeeCategory},
        grade::GradeType,
        grade_level::Stage,
        user::Role,
    },
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Password used by every test account.
pub const TEST_PASSWORD: &str = "secreto123";

/// Parent email set on students created by [`create_test_student`].
pub const TEST_PARENT_EMAIL: &str = "padre@correo.com";

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// An admin-like actor scoped to `tenant_id`.
#[must_use]
pub fn test_actor(tenant_id: &str) -> Actor {
    Actor {
        user_id: format!("user-{tenant_id}"),
        name: "Admin de Prueba".to_string(),
        email: "admin@escuela.edu".to_string(),
        tenant_id: tenant_id.to_string(),
    }
}

/// Signs up an admin account. The admin's id is also their tenant id.
pub async fn create_test_admin(db: &DatabaseConnection, email: &str) -> Result<entities::user::Model> {
    sign_up_as(db, email, Role::Admin).await
}

/// Signs up a parent account.
pub async fn create_test_parent(db: &DatabaseConnection, email: &str) -> Result<entities::user::Model> {
    sign_up_as(db, email, Role::Parent).await
}

async fn sign_up_as(db: &DatabaseConnection, email: &str, role: Role) -> Result<entities::user::Model> {
    auth::sign_up(
        db,
        &AuthPolicy::default(),
        SignUpRequest {
            full_name: format!("Usuario {email}"),
            email: email.to_string(),
            phone_number: String::new(),
            password: TEST_PASSWORD.to_string(),
            role,
        },
    )
    .await
}

/// Creates an active student.
///
/// # Defaults
/// * `parent_email`: [`TEST_PARENT_EMAIL`]
/// * `date_of_birth`: 2015-03-14
pub async fn create_test_student(
    db: &DatabaseConnection,
    actor: &Actor,
    name: &str,
    grade_level: &str,
) -> Result<entities::student::Model> {
    student::create_student(
        db,
        actor,
        NewStudent {
            full_name: name.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2015, 3, 14).unwrap_or_default(),
            email: String::new(),
            phone: String::new(),
            address: "Calle Principal 1".to_string(),
            grade_level: grade_level.to_string(),
            parent_name: "Padre de Prueba".to_string(),
            parent_email: TEST_PARENT_EMAIL.to_string(),
            parent_phone: "809-555-0100".to_string(),
            emergency_contact: "Madre de Prueba".to_string(),
            emergency_phone: "809-555-0101".to_string(),
            medical_notes: None,
        },
    )
    .await
}

/// Creates an active teacher without a login account.
pub async fn create_test_teacher(
    db: &DatabaseConnection,
    tenant_id: &str,
    name: &str,
) -> Result<entities::teacher::Model> {
    teacher::create_teacher(
        db,
        tenant_id,
        NewTeacher {
            full_name: name.to_string(),
            email: format!("{}@escuela.edu", name.to_lowercase().replace(' ', ".")),
            phone_number: String::new(),
            subjects: Vec::new(),
        },
    )
    .await
}

/// Creates an active grade level.
pub async fn create_test_grade_level(
    db: &DatabaseConnection,
    actor: &Actor,
    name: &str,
    stage: Stage,
    order: i32,
) -> Result<entities::grade_level::Model> {
    grade_level::create_grade_level(
        db,
        actor,
        NewGradeLevel {
            name: name.to_string(),
            level: order,
            stage,
            order,
            is_active: true,
        },
    )
    .await
}

/// Creates an active subject taught in `grade_level_ids`.
pub async fn create_test_subject(
    db: &DatabaseConnection,
    actor: &Actor,
    name: &str,
    code: &str,
    grade_level_ids: &[&str],
) -> Result<entities::subject::Model> {
    subject::create_subject(
        db,
        actor,
        NewSubject {
            name: name.to_string(),
            code: code.to_string(),
            description: String::new(),
            grade_level_ids: grade_level_ids.iter().map(ToString::to_string).collect(),
            color: "#3b82f6".to_string(),
            is_active: true,
        },
    )
    .await
}

/// Class data with sensible defaults.
///
/// # Defaults
/// * `subject_id`: "subj-1"
/// * `section`: "A"
/// * no teacher, no schedule
/// * `semester`: "1"
#[must_use]
pub fn new_class(name: &str, grade_level_id: &str, max_students: i32) -> NewClass {
    NewClass {
        class_name: name.to_string(),
        subject_id: "subj-1".to_string(),
        grade_level_id: grade_level_id.to_string(),
        section: "A".to_string(),
        teacher_id: None,
        schedule: Vec::new(),
        max_students,
        academic_year: Some("2024-2025".to_string()),
        semester: "1".to_string(),
    }
}

/// Creates an active class from [`new_class`].
pub async fn create_test_class(
    db: &DatabaseConnection,
    actor: &Actor,
    name: &str,
    grade_level_id: &str,
    max_students: i32,
) -> Result<entities::class::Model> {
    class::create_class(db, actor, new_class(name, grade_level_id, max_students)).await
}

/// Creates a class in grade level "gl-1" with one enrolled student per name.
pub async fn create_enrolled_class(
    db: &DatabaseConnection,
    actor: &Actor,
    class_name: &str,
    student_names: &[&str],
) -> Result<(entities::class::Model, Vec<entities::student::Model>)> {
    let class = create_test_class(db, actor, class_name, "gl-1", 30).await?;
    let mut students = Vec::with_capacity(student_names.len());
    for name in student_names {
        let student = create_test_student(db, actor, name, "gl-1").await?;
        enrollment::enroll_student(db, actor, &class.id, &student.id).await?;
        students.push(student);
    }
    Ok((class, students))
}

/// An exam grade out of 100 points.
#[must_use]
pub fn new_grade(class_id: &str, student_id: &str, value: f64) -> NewGrade {
    NewGrade {
        class_id: class_id.to_string(),
        student_id: student_id.to_string(),
        grade_value: value,
        grade_type: GradeType::Exam,
        grade_name: "Examen parcial".to_string(),
        max_points: 100.0,
        earned_points: value,
        weight: None,
        due_date: None,
        submitted_date: None,
        comments: None,
    }
}

/// A monthly tuition fee in the default currency.
#[must_use]
pub fn new_fee(name: &str, amount: f64) -> NewFee {
    NewFee {
        name: name.to_string(),
        description: String::new(),
        category: FeeCategory::Colegiatura,
        amount,
        currency: None,
        billing_cycle: BillingCycle::Mensual,
        is_active: true,
    }
}

/// A payment for September 2024 tuition.
#[must_use]
pub fn new_payment(amount_expected: f64, amount_paid: f64) -> NewPayment {
    NewPayment {
        student_id: "s1".to_string(),
        student_name: "Ana Pérez".to_string(),
        fee_id: "f1".to_string(),
        fee_name: "Colegiatura".to_string(),
        payer_name: "María Pérez".to_string(),
        payer_email: "maria@correo.com".to_string(),
        due_date: NaiveDate::from_ymd_opt(2024, 9, 5).unwrap_or_default(),
        billing_period: "2024-09".to_string(),
        amount_expected,
        amount_paid,
        currency: "DOP".to_string(),
        transaction_reference: "TX-0001".to_string(),
        status: None,
        payment_date: None,
        notes: None,
    }
}
