//! Grade entity - A single graded piece of work.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of graded work
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum GradeType {
    /// Exam
    #[sea_orm(string_value = "exam")]
    Exam,
    /// Short quiz
    #[sea_orm(string_value = "quiz")]
    Quiz,
    /// Homework
    #[sea_orm(string_value = "homework")]
    Homework,
    /// Project
    #[sea_orm(string_value = "project")]
    Project,
    /// Class participation
    #[sea_orm(string_value = "participation")]
    Participation,
    /// Final grade
    #[sea_orm(string_value = "final")]
    Final,
}

impl GradeType {
    /// Spanish label shown to users.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Exam => "Examen",
            Self::Quiz => "Quiz",
            Self::Homework => "Tarea",
            Self::Project => "Proyecto",
            Self::Participation => "Participación",
            Self::Final => "Final",
        }
    }
}

/// Grade database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "grades")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning tenant
    pub tenant_id: String,
    /// Class the grade belongs to
    pub class_id: String,
    /// Graded student
    pub student_id: String,
    /// Teacher who published the grade
    pub teacher_id: String,
    /// Score on a 0-100 scale
    pub grade_value: f64,
    /// Letter derived from `grade_value`
    pub grade_letter: String,
    /// Kind of work
    pub grade_type: GradeType,
    /// Name of the graded work (e.g., "Examen parcial 1")
    pub grade_name: String,
    /// Points available
    pub max_points: f64,
    /// Points earned
    pub earned_points: f64,
    /// Relative weight for weighted averages
    pub weight: Option<f64>,
    /// Due date of the work
    pub due_date: Option<Date>,
    /// Date the work was handed in
    pub submitted_date: Option<Date>,
    /// Teacher comments
    pub comments: Option<String>,
    /// Creation time
    pub created_at: DateTimeUtc,
    /// Last modification time
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
