//! Database configuration module.
//!
//! This module handles database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL.

use crate::entities::{
    AbsenceRequest, Activity, Announcement, Attendance, Class, Credential, DueDate, Enrollment,
    Fee, Grade, GradeLevel, Payment, School, Session, Student, Subject, Teacher, User, attendance,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, sea_query::Index};
use tracing::{debug, info};

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    info!("Connecting to database");
    Database::connect(database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    debug!(table = entity.table_name(), "Creating table");
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables (if they do not exist yet) from the entity definitions.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Credential).await?;
    create_table(db, &schema, Session).await?;
    create_table(db, &schema, School).await?;
    create_table(db, &schema, Teacher).await?;
    create_table(db, &schema, Student).await?;
    create_table(db, &schema, Class).await?;
    create_table(db, &schema, Subject).await?;
    create_table(db, &schema, GradeLevel).await?;
    create_table(db, &schema, Enrollment).await?;
    create_table(db, &schema, Grade).await?;
    create_table(db, &schema, Attendance).await?;
    create_table(db, &schema, AbsenceRequest).await?;
    create_table(db, &schema, Announcement).await?;
    create_table(db, &schema, Activity).await?;
    create_table(db, &schema, Fee).await?;
    create_table(db, &schema, DueDate).await?;
    create_table(db, &schema, Payment).await?;

    create_indexes(db).await
}

/// Indexes that enforce uniqueness beyond the primary keys.
async fn create_indexes(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    // One mark per student per class per day.
    let roll_call = Index::create()
        .name("idx_attendance_roll_call")
        .table(Attendance)
        .col(attendance::Column::TenantId)
        .col(attendance::Column::ClassId)
        .col(attendance::Column::StudentId)
        .col(attendance::Column::Date)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&roll_call)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _ = User::find().limit(1).all(&db).await?;
        let _ = Student::find().limit(1).all(&db).await?;
        let _ = Class::find().limit(1).all(&db).await?;
        let _ = Activity::find().limit(1).all(&db).await?;
        let _ = Payment::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_attendance_roll_call_is_unique() -> Result<()> {
        use chrono::{NaiveDate, Utc};
        use sea_orm::{ActiveModelTrait, Set};

        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;

        let now = Utc::now();
        let mark = |id: &str| attendance::ActiveModel {
            id: Set(id.to_string()),
            tenant_id: Set("tenant-1".to_string()),
            class_id: Set("c1".to_string()),
            student_id: Set("s1".to_string()),
            teacher_id: Set("t1".to_string()),
            date: Set(NaiveDate::from_ymd_opt(2024, 9, 2).unwrap_or_default()),
            status: Set(attendance::AttendanceStatus::Present),
            notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        mark("a1").insert(&db).await?;
        assert!(mark("a2").insert(&db).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
