use crate::{
    entities::{contact, Contact, ContactModel},
    errors::ServiceError,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ContactInput {
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub street: String,
    #[serde(default)]
    pub house: String,
    #[serde(default)]
    pub structure: String,
    #[serde(default)]
    pub building: String,
    #[serde(default)]
    pub apartment: String,
    #[validate(length(min = 1))]
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct ContactUpdate {
    pub city: Option<String>,
    pub street: Option<String>,
    pub house: Option<String>,
    pub structure: Option<String>,
    pub building: Option<String>,
    pub apartment: Option<String>,
    pub phone: Option<String>,
}

/// Delivery-address CRUD, always scoped to the owning user. Placed orders
/// reference these rows.
#[derive(Clone)]
pub struct ContactService {
    db: Arc<DatabaseConnection>,
}

impl ContactService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<ContactModel>, ServiceError> {
        Ok(Contact::find()
            .filter(contact::Column::UserId.eq(user_id))
            .all(&*self.db)
            .await?)
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        input: ContactInput,
    ) -> Result<ContactModel, ServiceError> {
        let row = contact::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            city: Set(input.city),
            street: Set(input.street),
            house: Set(input.house),
            structure: Set(input.structure),
            building: Set(input.building),
            apartment: Set(input.apartment),
            phone: Set(input.phone),
        };
        Ok(row.insert(&*self.db).await?)
    }

    /// Partial update; foreign or missing contacts are 404.
    pub async fn update(
        &self,
        user_id: Uuid,
        contact_id: Uuid,
        input: ContactUpdate,
    ) -> Result<ContactModel, ServiceError> {
        let found = Contact::find_by_id(contact_id)
            .one(&*self.db)
            .await?
            .filter(|c| c.user_id == user_id)
            .ok_or_else(|| ServiceError::NotFound(format!("contact {contact_id} not found")))?;

        let mut active: contact::ActiveModel = found.into();
        if let Some(city) = input.city {
            active.city = Set(city);
        }
        if let Some(street) = input.street {
            active.street = Set(street);
        }
        if let Some(house) = input.house {
            active.house = Set(house);
        }
        if let Some(structure) = input.structure {
            active.structure = Set(structure);
        }
        if let Some(building) = input.building {
            active.building = Set(building);
        }
        if let Some(apartment) = input.apartment {
            active.apartment = Set(apartment);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(phone);
        }

        Ok(active.update(&*self.db).await?)
    }

    /// Deletes the comma-separated id list, scoped to the owner. Returns the
    /// count actually deleted; unparseable ids are skipped.
    pub async fn delete_many(&self, user_id: Uuid, ids: &str) -> Result<u64, ServiceError> {
        let contact_ids: Vec<Uuid> = ids
            .split(',')
            .filter_map(|raw| Uuid::parse_str(raw.trim()).ok())
            .collect();
        if contact_ids.is_empty() {
            return Ok(0);
        }

        let res = Contact::delete_many()
            .filter(contact::Column::Id.is_in(contact_ids))
            .filter(contact::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;

        Ok(res.rows_affected)
    }
}
