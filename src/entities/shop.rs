use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A vendor's shop. `user_id` is the owning vendor account in the external
/// identity service; it stays empty until the first vendor-initiated import
/// binds it. `active` controls buyer-facing visibility.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shops")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(nullable)]
    pub url: Option<String>,
    #[sea_orm(nullable)]
    pub user_id: Option<Uuid>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_info::Entity")]
    ProductInfos,
    #[sea_orm(has_many = "super::shop_category::Entity")]
    ShopCategories,
}

impl Related<super::product_info::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductInfos.def()
    }
}

impl Related<super::shop_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShopCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
