//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables of the school manager.
//! Each entity has a Model struct for data and an Entity struct for operations.
//! Tenant-owned tables carry a `tenant_id` column that every query filters on.

pub mod absence_request;
pub mod activity;
pub mod announcement;
pub mod attendance;
pub mod class;
pub mod credential;
pub mod due_date;
pub mod enrollment;
pub mod fee;
pub mod grade;
pub mod grade_level;
pub mod payment;
pub mod school;
pub mod session;
pub mod shared;
pub mod student;
pub mod subject;
pub mod teacher;
pub mod user;

// Re-export specific types to avoid conflicts
pub use absence_request::Entity as AbsenceRequest;
pub use activity::Entity as Activity;
pub use announcement::Entity as Announcement;
pub use attendance::Entity as Attendance;
pub use class::Entity as Class;
pub use credential::Entity as Credential;
pub use due_date::Entity as DueDate;
pub use enrollment::Entity as Enrollment;
pub use fee::Entity as Fee;
pub use grade::Entity as Grade;
pub use grade_level::Entity as GradeLevel;
pub use payment::Entity as Payment;
pub use school::Entity as School;
pub use session::Entity as Session;
pub use shared::{ActiveStatus, Schedule, ScheduleSlot, StringList, Weekday};
pub use student::Entity as Student;
pub use subject::Entity as Subject;
pub use teacher::Entity as Teacher;
pub use user::{Entity as User, Role};
