//! Subject business logic - The catalog of subjects a school offers.

use crate::{
    core::activity::{self, Actor},
    entities::{StringList, Subject, activity::ActivityEntity, subject},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

/// Data needed to create a subject.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubject {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub grade_level_ids: Vec<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_color() -> String {
    "#3B82F6".to_string()
}

const fn default_active() -> bool {
    true
}

/// Partial update of a subject.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectUpdate {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub grade_level_ids: Option<Vec<String>>,
    pub color: Option<String>,
    pub is_active: Option<bool>,
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// All subjects of a tenant by name.
pub async fn list_subjects<C>(db: &C, tenant_id: &str) -> Result<Vec<subject::Model>>
where
    C: ConnectionTrait,
{
    Subject::find()
        .filter(subject::Column::TenantId.eq(tenant_id))
        .order_by_asc(subject::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Subjects currently offered.
pub async fn active_subjects<C>(db: &C, tenant_id: &str) -> Result<Vec<subject::Model>>
where
    C: ConnectionTrait,
{
    Subject::find()
        .filter(subject::Column::TenantId.eq(tenant_id))
        .filter(subject::Column::IsActive.eq(true))
        .order_by_asc(subject::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Subjects taught at a grade level.
pub async fn subjects_by_grade_level<C>(db: &C, tenant_id: &str, grade_level_id: &str) -> Result<Vec<subject::Model>>
where
    C: ConnectionTrait,
{
    // Membership lives in a JSON column, so filter after loading.
    let subjects = list_subjects(db, tenant_id).await?;
    Ok(subjects
        .into_iter()
        .filter(|s| s.grade_level_ids.contains(grade_level_id))
        .collect())
}

/// Finds a subject of the tenant by id.
pub async fn get_subject<C>(db: &C, tenant_id: &str, id: &str) -> Result<Option<subject::Model>>
where
    C: ConnectionTrait,
{
    Subject::find_by_id(id)
        .filter(subject::Column::TenantId.eq(tenant_id))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn require_subject<C>(db: &C, tenant_id: &str, id: &str) -> Result<subject::Model>
where
    C: ConnectionTrait,
{
    get_subject(db, tenant_id, id)
        .await?
        .ok_or_else(|| Error::not_found("Asignatura no encontrada"))
}

/// Whether no other subject of the tenant uses `code`.
pub async fn is_code_unique<C>(db: &C, tenant_id: &str, code: &str, exclude_id: Option<&str>) -> Result<bool>
where
    C: ConnectionTrait,
{
    let mut query = Subject::find()
        .filter(subject::Column::TenantId.eq(tenant_id))
        .filter(subject::Column::Code.eq(normalize_code(code)));
    if let Some(id) = exclude_id {
        query = query.filter(subject::Column::Id.ne(id));
    }
    Ok(query.one(db).await?.is_none())
}

/// Creates a subject. Codes are stored uppercase and must be unique per tenant.
pub async fn create_subject<C>(db: &C, actor: &Actor, data: NewSubject) -> Result<subject::Model>
where
    C: ConnectionTrait,
{
    if data.name.trim().is_empty() || data.code.trim().is_empty() {
        return Err(Error::invalid("El nombre y el código son obligatorios"));
    }
    if !is_code_unique(db, &actor.tenant_id, &data.code, None).await? {
        return Err(Error::already_exists("Ya existe una asignatura con ese código"));
    }

    let subject = subject::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        tenant_id: Set(actor.tenant_id.clone()),
        name: Set(data.name.trim().to_string()),
        code: Set(normalize_code(&data.code)),
        description: Set(data.description),
        grade_level_ids: Set(StringList(data.grade_level_ids)),
        color: Set(data.color),
        is_active: Set(data.is_active),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    activity::log_create(db, actor, ActivityEntity::Subject, &subject.id, &subject.name, json!({ "code": subject.code })).await;
    Ok(subject)
}

/// Applies a partial update, re-checking code uniqueness.
pub async fn update_subject<C>(db: &C, actor: &Actor, id: &str, changes: SubjectUpdate) -> Result<subject::Model>
where
    C: ConnectionTrait,
{
    let existing = require_subject(db, &actor.tenant_id, id).await?;
    if let Some(code) = changes.code.as_deref() {
        if !is_code_unique(db, &actor.tenant_id, code, Some(id)).await? {
            return Err(Error::already_exists("Ya existe una asignatura con ese código"));
        }
    }

    let mut active: subject::ActiveModel = existing.into();
    if let Some(name) = changes.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(code) = changes.code {
        active.code = Set(normalize_code(&code));
    }
    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    if let Some(ids) = changes.grade_level_ids {
        active.grade_level_ids = Set(StringList(ids));
    }
    if let Some(color) = changes.color {
        active.color = Set(color);
    }
    if let Some(is_active) = changes.is_active {
        active.is_active = Set(is_active);
    }

    let subject = active.update(db).await?;
    activity::log_update(db, actor, ActivityEntity::Subject, &subject.id, &subject.name, Value::Null).await;
    Ok(subject)
}

/// Flips `is_active`.
pub async fn toggle_subject<C>(db: &C, actor: &Actor, id: &str) -> Result<subject::Model>
where
    C: ConnectionTrait,
{
    let existing = require_subject(db, &actor.tenant_id, id).await?;
    let now_active = !existing.is_active;
    let mut active: subject::ActiveModel = existing.into();
    active.is_active = Set(now_active);
    let subject = active.update(db).await?;

    let status = if now_active { "active" } else { "inactive" };
    activity::log_status_change(db, actor, ActivityEntity::Subject, &subject.id, &subject.name, status, Value::Null).await;
    Ok(subject)
}

/// Removes a subject.
pub async fn delete_subject<C>(db: &C, actor: &Actor, id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = require_subject(db, &actor.tenant_id, id).await?;
    Subject::delete_by_id(existing.id.as_str()).exec(db).await?;
    activity::log_delete(db, actor, ActivityEntity::Subject, &existing.id, &existing.name, Value::Null).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_code_uniqueness_per_tenant() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let math = create_test_subject(&db, &actor, "Matemáticas", "mat", &["gl-1"]).await?;
        assert_eq!(math.code, "MAT");

        let dup = create_test_subject(&db, &actor, "Matemática II", " MAT ", &[]).await;
        assert!(matches!(dup, Err(Error::AlreadyExists { .. })));

        // Another tenant may reuse the code.
        create_test_subject(&db, &test_actor("tenant-2"), "Matemáticas", "MAT", &[]).await?;

        assert!(is_code_unique(&db, "tenant-1", "mat", Some(&math.id)).await?);
        assert!(!is_code_unique(&db, "tenant-1", "mat", None).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_by_grade_level_and_toggle() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        let math = create_test_subject(&db, &actor, "Matemáticas", "MAT", &["gl-1", "gl-2"]).await?;
        create_test_subject(&db, &actor, "Biología", "BIO", &["gl-3"]).await?;

        let for_gl2 = subjects_by_grade_level(&db, "tenant-1", "gl-2").await?;
        assert_eq!(for_gl2.len(), 1);
        assert_eq!(for_gl2[0].id, math.id);

        toggle_subject(&db, &actor, &math.id).await?;
        let active = active_subjects(&db, "tenant-1").await?;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Biología");
        Ok(())
    }

    #[tokio::test]
    async fn test_update_rejects_taken_code() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = test_actor("tenant-1");
        create_test_subject(&db, &actor, "Matemáticas", "MAT", &[]).await?;
        let bio = create_test_subject(&db, &actor, "Biología", "BIO", &[]).await?;

        let changes = SubjectUpdate {
            code: Some("mat".to_string()),
            ..Default::default()
        };
        let result = update_subject(&db, &actor, &bio.id, changes).await;
        assert!(matches!(result, Err(Error::AlreadyExists { .. })));

        let changes = SubjectUpdate {
            code: Some("bio".to_string()),
            description: Some("Ciencias de la vida".to_string()),
            ..Default::default()
        };
        let updated = update_subject(&db, &actor, &bio.id, changes).await?;
        assert_eq!(updated.description, "Ciencias de la vida");
        Ok(())
    }
}
