use crate::{
    entities::{
        category, order_item, parameter, product, product_info, product_parameter, shop,
        shop_category, Category, OrderItem, Parameter, Product, ProductInfo, ProductParameter,
        Shop, ShopCategory, ShopModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// A vendor price feed, as shipped in the YAML document.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceFeed {
    pub shop: String,
    #[serde(default)]
    pub categories: Vec<FeedCategory>,
    #[serde(default)]
    pub goods: Vec<FeedGood>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedCategory {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedGood {
    /// The vendor's own SKU id.
    pub id: i64,
    pub category: i32,
    pub name: String,
    #[serde(default)]
    pub model: String,
    pub quantity: i32,
    pub price: Decimal,
    pub price_rrc: Decimal,
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_yaml::Value>,
}

/// Result of a committed import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub shop_id: Uuid,
    pub listings: u64,
}

/// Imports vendor price feeds, atomically replacing the shop's listings.
///
/// The whole replace (shop resolution, category attach, destructive listing
/// swap) runs in one transaction, so readers never observe a shop with a
/// half-replaced catalog.
#[derive(Clone)]
pub struct FeedImportService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    http: Client,
}

impl FeedImportService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        fetch_timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| ServiceError::InternalError(format!("failed to build http client: {e}")))?;
        Ok(Self {
            db,
            event_sender,
            http,
        })
    }

    /// Vendor-initiated import: validate the URL before any network I/O,
    /// fetch, parse, and apply bound to the calling vendor.
    #[instrument(skip(self))]
    pub async fn import_from_url(
        &self,
        vendor_id: Uuid,
        url: &str,
    ) -> Result<ImportSummary, ServiceError> {
        let url = validate_feed_url(url)?;

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ServiceError::FeedUnavailable(format!("failed to fetch {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::FeedUnavailable(format!(
                "feed host returned {status} for {url}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::FeedUnavailable(format!("failed to read feed body: {e}")))?;

        let feed = parse_feed(&body)?;
        self.import(feed, Some(vendor_id)).await
    }

    /// Operator-initiated import from a local file. Never touches the shop's
    /// vendor binding.
    pub async fn import_from_file(&self, path: &Path) -> Result<ImportSummary, ServiceError> {
        let body = tokio::fs::read_to_string(path).await.map_err(|e| {
            ServiceError::ValidationError(format!("cannot read feed file {}: {e}", path.display()))
        })?;
        let feed = parse_feed(&body)?;
        self.import(feed, None).await
    }

    /// Applies a parsed feed in a single transaction.
    #[instrument(skip(self, feed), fields(shop = %feed.shop, goods = feed.goods.len()))]
    pub async fn import(
        &self,
        feed: PriceFeed,
        vendor_id: Option<Uuid>,
    ) -> Result<ImportSummary, ServiceError> {
        let txn = self.db.begin().await?;

        let shop = resolve_shop(&txn, &feed.shop, vendor_id).await?;

        for feed_category in &feed.categories {
            upsert_category(&txn, feed_category).await?;
            attach_category(&txn, shop.id, feed_category.id).await?;
        }

        drop_shop_listings(&txn, shop.id).await?;

        let mut listings = 0u64;
        for good in &feed.goods {
            insert_listing(&txn, shop.id, good).await?;
            listings += 1;
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::FeedImported {
                shop_id: shop.id,
                listings,
            })
            .await;

        info!(shop_id = %shop.id, listings, "replaced shop listings from feed");
        Ok(ImportSummary {
            shop_id: shop.id,
            listings,
        })
    }
}

/// Well-formed-URL check applied before any fetch: absolute http(s) URL with
/// a host.
pub fn validate_feed_url(raw: &str) -> Result<Url, ServiceError> {
    let url = Url::parse(raw)
        .map_err(|e| ServiceError::ValidationError(format!("invalid feed url: {e}")))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ServiceError::ValidationError(format!(
            "invalid feed url: unsupported scheme '{}'",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(ServiceError::ValidationError(
            "invalid feed url: missing host".to_string(),
        ));
    }
    Ok(url)
}

/// Parses the YAML feed document.
pub fn parse_feed(body: &str) -> Result<PriceFeed, ServiceError> {
    serde_yaml::from_str(body)
        .map_err(|e| ServiceError::ValidationError(format!("malformed feed document: {e}")))
}

async fn resolve_shop(
    txn: &DatabaseTransaction,
    name: &str,
    vendor_id: Option<Uuid>,
) -> Result<ShopModel, ServiceError> {
    let existing = Shop::find()
        .filter(shop::Column::Name.eq(name))
        .one(txn)
        .await?;

    match existing {
        Some(found) => match (found.user_id, vendor_id) {
            // First successful bind wins.
            (None, Some(vendor)) => {
                let mut active: shop::ActiveModel = found.into();
                active.user_id = Set(Some(vendor));
                Ok(active.update(txn).await?)
            }
            (Some(owner), Some(vendor)) if owner != vendor => Err(ServiceError::Forbidden(
                format!("shop '{name}' is bound to another vendor"),
            )),
            _ => Ok(found),
        },
        None => {
            let created = shop::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(name.to_string()),
                url: Set(None),
                user_id: Set(vendor_id),
                active: Set(true),
                created_at: Set(Utc::now()),
            };
            Ok(created.insert(txn).await?)
        }
    }
}

/// Resolve a feed category by id, creating it or renaming it to the feed's
/// name. The feed is authoritative for its own category ids.
async fn upsert_category(
    txn: &DatabaseTransaction,
    feed_category: &FeedCategory,
) -> Result<(), ServiceError> {
    match Category::find_by_id(feed_category.id).one(txn).await? {
        Some(found) if found.name == feed_category.name => Ok(()),
        Some(found) => {
            let mut active: category::ActiveModel = found.into();
            active.name = Set(feed_category.name.clone());
            active.update(txn).await?;
            Ok(())
        }
        None => {
            let created = category::ActiveModel {
                id: Set(feed_category.id),
                name: Set(feed_category.name.clone()),
            };
            created.insert(txn).await?;
            Ok(())
        }
    }
}

/// Attach a category to the shop's set. Accumulates; never detaches.
async fn attach_category(
    txn: &DatabaseTransaction,
    shop_id: Uuid,
    category_id: i32,
) -> Result<(), ServiceError> {
    let existing = ShopCategory::find_by_id((shop_id, category_id))
        .one(txn)
        .await?;
    if existing.is_none() {
        let link = shop_category::ActiveModel {
            shop_id: Set(shop_id),
            category_id: Set(category_id),
        };
        link.insert(txn).await?;
    }
    Ok(())
}

/// Destructive replace, child rows first: parameter rows and order items
/// referencing the doomed listings, then the listings themselves.
async fn drop_shop_listings(txn: &DatabaseTransaction, shop_id: Uuid) -> Result<(), ServiceError> {
    let doomed: Vec<Uuid> = ProductInfo::find()
        .filter(product_info::Column::ShopId.eq(shop_id))
        .all(txn)
        .await?
        .into_iter()
        .map(|i| i.id)
        .collect();

    if doomed.is_empty() {
        return Ok(());
    }

    ProductParameter::delete_many()
        .filter(product_parameter::Column::ProductInfoId.is_in(doomed.clone()))
        .exec(txn)
        .await?;
    OrderItem::delete_many()
        .filter(order_item::Column::ProductInfoId.is_in(doomed))
        .exec(txn)
        .await?;
    ProductInfo::delete_many()
        .filter(product_info::Column::ShopId.eq(shop_id))
        .exec(txn)
        .await?;

    Ok(())
}

async fn insert_listing(
    txn: &DatabaseTransaction,
    shop_id: Uuid,
    good: &FeedGood,
) -> Result<(), ServiceError> {
    // A good referencing a category neither declared in this feed nor already
    // known is fatal to the import.
    Category::find_by_id(good.category)
        .one(txn)
        .await?
        .ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "good {} references unknown category {}",
                good.id, good.category
            ))
        })?;

    let product = resolve_product(txn, good.category, &good.name).await?;

    let info = product_info::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        shop_id: Set(shop_id),
        model: Set(good.model.clone()),
        external_id: Set(good.id),
        quantity: Set(good.quantity),
        price: Set(good.price),
        retail_price: Set(good.price_rrc),
    };
    let info = info.insert(txn).await?;

    for (name, value) in &good.parameters {
        let parameter = resolve_parameter(txn, name).await?;
        let row = product_parameter::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_info_id: Set(info.id),
            parameter_id: Set(parameter.id),
            value: Set(scalar_to_string(value)?),
        };
        row.insert(txn).await?;
    }

    Ok(())
}

async fn resolve_product(
    txn: &DatabaseTransaction,
    category_id: i32,
    name: &str,
) -> Result<product::Model, ServiceError> {
    let existing = Product::find()
        .filter(product::Column::CategoryId.eq(category_id))
        .filter(product::Column::Name.eq(name))
        .one(txn)
        .await?;

    match existing {
        Some(found) => Ok(found),
        None => {
            let created = product::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(name.to_string()),
                category_id: Set(category_id),
            };
            Ok(created.insert(txn).await?)
        }
    }
}

async fn resolve_parameter(
    txn: &DatabaseTransaction,
    name: &str,
) -> Result<parameter::Model, ServiceError> {
    let existing = Parameter::find()
        .filter(parameter::Column::Name.eq(name))
        .one(txn)
        .await?;

    match existing {
        Some(found) => Ok(found),
        None => {
            let created = parameter::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(name.to_string()),
            };
            Ok(created.insert(txn).await?)
        }
    }
}

/// Feed parameter values arrive as YAML scalars of mixed types; they are
/// stored as strings.
fn scalar_to_string(value: &serde_yaml::Value) -> Result<String, ServiceError> {
    match value {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok(String::new()),
        other => Err(ServiceError::ValidationError(format!(
            "parameter value must be a scalar, got {other:?}"
        ))),
    }
}
