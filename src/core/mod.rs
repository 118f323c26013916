//! Core business logic - Framework-agnostic school operations
//!
//! Every function takes a SeaORM connection (or transaction) and is scoped to a
//! tenant, either through an explicit `tenant_id` or through the acting
//! [`activity::Actor`]. Nothing in here knows about HTTP.

/// Absence requests submitted by parents and reviewed by teachers
pub mod absence_request;
/// Teacher account creation and password resets
pub mod accounts;
/// Tenant-wide audit log
pub mod activity;
/// Announcements and the public feed
pub mod announcement;
/// Daily attendance
pub mod attendance;
/// Credentials, sessions and profiles
pub mod auth;
/// Classes and teacher assignment
pub mod class;
/// Student enrollment in classes
pub mod enrollment;
/// Fees, due dates and payments
pub mod financial;
/// Grades and averages
pub mod grade;
/// Grade levels (academic years)
pub mod grade_level;
/// Role-based route guards
pub mod guards;
/// Dashboard counters and analytics
pub mod reports;
/// School registration
pub mod school;
/// Student roster
pub mod student;
/// Subjects
pub mod subject;
/// Teacher records
pub mod teacher;
