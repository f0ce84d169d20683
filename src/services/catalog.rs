use crate::{
    entities::{
        category, product, product_info, product_parameter, shop, Category, CategoryModel,
        Parameter, Product, ProductInfo, ProductInfoModel, ProductParameter, Shop, ShopModel,
    },
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

/// Read side of the catalog: categories, visible shops, and listing search.
/// Listings of inactive shops are invisible here no matter what the caller
/// filters on.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryModel>, ServiceError> {
        Ok(Category::find()
            .order_by_asc(category::Column::Id)
            .all(&*self.db)
            .await?)
    }

    /// Shops with `active = true` only.
    pub async fn list_shops(&self) -> Result<Vec<ShopModel>, ServiceError> {
        Ok(Shop::find()
            .filter(shop::Column::Active.eq(true))
            .order_by_asc(shop::Column::Name)
            .all(&*self.db)
            .await?)
    }

    /// Listing search. Both filters are AND-ed onto the active-shop
    /// restriction.
    pub async fn search_listings(
        &self,
        filter: ListingFilter,
    ) -> Result<Vec<ListingDetail>, ServiceError> {
        let mut query = ProductInfo::find()
            .join(JoinType::InnerJoin, product_info::Relation::Shop.def())
            .join(JoinType::InnerJoin, product_info::Relation::Product.def())
            .filter(shop::Column::Active.eq(true));

        if let Some(shop_id) = filter.shop_id {
            query = query.filter(product_info::Column::ShopId.eq(shop_id));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }

        let infos = query.all(&*self.db).await?;
        expand_listings(&*self.db, infos).await
    }
}

/// Optional filters for listing search.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ListingFilter {
    pub shop_id: Option<Uuid>,
    pub category_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShopRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductRef {
    pub id: Uuid,
    pub name: String,
    pub category: String,
}

/// A listing expanded with its product, category, shop, and parameter set —
/// the shape both the public catalog and the basket views return.
#[derive(Debug, Clone, Serialize)]
pub struct ListingDetail {
    pub id: Uuid,
    pub model: String,
    pub external_id: i64,
    pub quantity: i32,
    pub price: Decimal,
    pub retail_price: Decimal,
    pub shop: ShopRef,
    pub product: ProductRef,
    pub parameters: BTreeMap<String, String>,
}

/// Batch-expands listings with their joined detail. Shared by the catalog
/// search and the order views, so it takes any connection (pool or txn).
pub(crate) async fn expand_listings<C: ConnectionTrait>(
    conn: &C,
    infos: Vec<ProductInfoModel>,
) -> Result<Vec<ListingDetail>, ServiceError> {
    if infos.is_empty() {
        return Ok(Vec::new());
    }

    let info_ids: Vec<Uuid> = infos.iter().map(|i| i.id).collect();
    let product_ids: Vec<Uuid> = infos.iter().map(|i| i.product_id).collect();
    let shop_ids: Vec<Uuid> = infos.iter().map(|i| i.shop_id).collect();

    let products: HashMap<Uuid, _> = Product::find()
        .filter(product::Column::Id.is_in(product_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let category_ids: Vec<i32> = products.values().map(|p| p.category_id).collect();
    let categories: HashMap<i32, _> = Category::find()
        .filter(category::Column::Id.is_in(category_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let shops: HashMap<Uuid, _> = Shop::find()
        .filter(shop::Column::Id.is_in(shop_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    let mut parameters: HashMap<Uuid, BTreeMap<String, String>> = HashMap::new();
    let rows = ProductParameter::find()
        .filter(product_parameter::Column::ProductInfoId.is_in(info_ids))
        .find_also_related(Parameter)
        .all(conn)
        .await?;
    for (row, parameter) in rows {
        if let Some(parameter) = parameter {
            parameters
                .entry(row.product_info_id)
                .or_default()
                .insert(parameter.name, row.value);
        }
    }

    let mut details = Vec::with_capacity(infos.len());
    for info in infos {
        let product = products.get(&info.product_id).ok_or_else(|| {
            ServiceError::InternalError(format!("listing {} lost its product", info.id))
        })?;
        let category_name = categories
            .get(&product.category_id)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        let shop = shops.get(&info.shop_id).ok_or_else(|| {
            ServiceError::InternalError(format!("listing {} lost its shop", info.id))
        })?;

        details.push(ListingDetail {
            id: info.id,
            model: info.model,
            external_id: info.external_id,
            quantity: info.quantity,
            price: info.price,
            retail_price: info.retail_price,
            shop: ShopRef {
                id: shop.id,
                name: shop.name.clone(),
            },
            product: ProductRef {
                id: product.id,
                name: product.name.clone(),
                category: category_name,
            },
            parameters: parameters.remove(&info.id).unwrap_or_default(),
        });
    }

    Ok(details)
}
