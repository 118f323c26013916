//! School profile business logic.

use crate::{
    entities::{School, school},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use serde::Deserialize;
use tracing::info;

/// Postal address of a school.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Street name
    pub street: String,
    /// Street number
    pub number: String,
    /// Sector or neighbourhood
    pub sector: String,
    /// City
    pub city: String,
    /// Province
    pub province: String,
    /// Postal code, optional
    #[serde(default)]
    pub postal_code: Option<String>,
}

impl From<&school::Model> for Address {
    fn from(school: &school::Model) -> Self {
        Self {
            street: school.street.clone(),
            number: school.number.clone(),
            sector: school.sector.clone(),
            city: school.city.clone(),
            province: school.province.clone(),
            postal_code: school.postal_code.clone(),
        }
    }
}

/// School registration data.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSchool {
    /// Official name
    pub school_name: String,
    /// Government registration number
    pub registration_number: String,
    /// Address
    pub address: Address,
}

/// Formats an address as `Calle X, No. N, sector, city, province[, postal]`.
#[must_use]
pub fn format_address(address: &Address) -> String {
    let mut formatted = format!(
        "Calle {}, No. {}, {}, {}, {}",
        address.street, address.number, address.sector, address.city, address.province
    );
    if let Some(postal) = address.postal_code.as_deref().filter(|p| !p.trim().is_empty()) {
        formatted.push_str(", ");
        formatted.push_str(postal);
    }
    formatted
}

/// Whether a registration number is free across all tenants.
pub async fn is_registration_number_available<C>(db: &C, registration_number: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    let existing = School::find()
        .filter(school::Column::RegistrationNumber.eq(registration_number.trim()))
        .one(db)
        .await?;
    Ok(existing.is_none())
}

/// Registers the school profile of a tenant.
pub async fn create_school<C>(db: &C, tenant_id: &str, data: NewSchool) -> Result<school::Model>
where
    C: ConnectionTrait,
{
    if data.school_name.trim().is_empty() {
        return Err(Error::invalid("El nombre de la escuela es obligatorio"));
    }
    let registration_number = data.registration_number.trim().to_string();
    if registration_number.is_empty() {
        return Err(Error::invalid("El número de registro es obligatorio"));
    }
    if School::find_by_id(tenant_id).one(db).await?.is_some() {
        return Err(Error::already_exists("La escuela ya está registrada"));
    }
    if !is_registration_number_available(db, &registration_number).await? {
        return Err(Error::already_exists("Registration number is already in use"));
    }

    let address = data.address;
    let school = school::ActiveModel {
        tenant_id: Set(tenant_id.to_string()),
        school_name: Set(data.school_name.trim().to_string()),
        registration_number: Set(registration_number),
        street: Set(address.street),
        number: Set(address.number),
        sector: Set(address.sector),
        city: Set(address.city),
        province: Set(address.province),
        postal_code: Set(address.postal_code),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    info!(tenant = %tenant_id, "School registered");
    Ok(school)
}

/// Gets a tenant's school profile.
pub async fn get_school<C>(db: &C, tenant_id: &str) -> Result<Option<school::Model>>
where
    C: ConnectionTrait,
{
    School::find_by_id(tenant_id).one(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn new_school(registration: &str) -> NewSchool {
        NewSchool {
            school_name: "Colegio San Juan".to_string(),
            registration_number: registration.to_string(),
            address: Address {
                street: "Duarte".to_string(),
                number: "12".to_string(),
                sector: "Centro".to_string(),
                city: "Santiago".to_string(),
                province: "Santiago".to_string(),
                postal_code: None,
            },
        }
    }

    #[test]
    fn test_format_address() {
        let mut address = new_school("R1").address;
        assert_eq!(format_address(&address), "Calle Duarte, No. 12, Centro, Santiago, Santiago");
        address.postal_code = Some("51000".to_string());
        assert_eq!(
            format_address(&address),
            "Calle Duarte, No. 12, Centro, Santiago, Santiago, 51000"
        );
    }

    #[tokio::test]
    async fn test_registration_number_is_unique() -> Result<()> {
        let db = setup_test_db().await?;
        create_school(&db, "tenant-1", new_school("REG-001")).await?;

        let taken = create_school(&db, "tenant-2", new_school(" REG-001 ")).await;
        assert!(matches!(taken, Err(Error::AlreadyExists { .. })));

        let again = create_school(&db, "tenant-1", new_school("REG-002")).await;
        assert!(matches!(again, Err(Error::AlreadyExists { .. })));

        assert!(get_school(&db, "tenant-1").await?.is_some());
        assert!(get_school(&db, "tenant-2").await?.is_none());
        Ok(())
    }
}
