use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product category. The id is assigned by vendor feeds and shared across
/// shops, so it is the primary key rather than a generated one.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
    #[sea_orm(has_many = "super::shop_category::Entity")]
    ShopCategories,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::shop_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShopCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
