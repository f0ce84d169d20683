use crate::{
    entities::{
        order, order_item, Order, OrderItem, OrderModel, OrderState, ProductInfo,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::orders::{expand_orders, OrderDetail},
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// One (listing, quantity) pair in a basket-add batch.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BasketItemInput {
    pub product_info: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

/// One (item, quantity) pair in a basket-update batch.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BasketItemUpdate {
    pub id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

/// The mutable-cart side of the basket/order engine. Every caller has at
/// most one basket order, created lazily on first add.
#[derive(Clone)]
pub struct BasketService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl BasketService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// The caller's basket (zero or one order), items expanded, total
    /// computed from current listing prices.
    pub async fn get_basket(&self, user_id: Uuid) -> Result<Vec<OrderDetail>, ServiceError> {
        let orders = Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .filter(order::Column::State.eq(OrderState::Basket))
            .all(&*self.db)
            .await?;

        expand_orders(&*self.db, orders, None).await
    }

    /// Adds a batch of items to the caller's basket, creating the basket if
    /// needed. One bad pair (unknown listing, listing already in the basket,
    /// quantity < 1) aborts the batch; the transaction guarantees nothing
    /// from the batch persists.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn add_items(
        &self,
        user_id: Uuid,
        items: Vec<BasketItemInput>,
    ) -> Result<u64, ServiceError> {
        if items.is_empty() {
            return Err(ServiceError::ValidationError(
                "items must not be empty".to_string(),
            ));
        }

        // Resolved outside the batch transaction: a failed insert inside an
        // open transaction would poison it on Postgres, breaking the
        // re-select after a lost create race.
        let basket = get_or_create_basket(&self.db, user_id).await?;

        let txn = self.db.begin().await?;
        let mut created = 0u64;
        for item in &items {
            if item.quantity < 1 {
                return Err(ServiceError::ValidationError(format!(
                    "quantity for listing {} must be at least 1",
                    item.product_info
                )));
            }

            ProductInfo::find_by_id(item.product_info)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "listing {} does not exist",
                        item.product_info
                    ))
                })?;

            let duplicate = OrderItem::find()
                .filter(order_item::Column::OrderId.eq(basket.id))
                .filter(order_item::Column::ProductInfoId.eq(item.product_info))
                .one(&txn)
                .await?;
            if duplicate.is_some() {
                return Err(ServiceError::InvalidOperation(format!(
                    "listing {} is already in the basket",
                    item.product_info
                )));
            }

            let row = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(basket.id),
                product_info_id: Set(item.product_info),
                quantity: Set(item.quantity),
            };
            row.insert(&txn).await?;
            created += 1;
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::BasketChanged {
                order_id: basket.id,
            })
            .await;

        info!(%user_id, created, "added items to basket");
        Ok(created)
    }

    /// Updates quantities in place, scoped to the caller's basket. Ids
    /// outside the basket are skipped, not errors. Returns the count
    /// actually updated.
    #[instrument(skip(self, updates), fields(updates = updates.len()))]
    pub async fn update_items(
        &self,
        user_id: Uuid,
        updates: Vec<BasketItemUpdate>,
    ) -> Result<u64, ServiceError> {
        for update in &updates {
            if update.quantity < 1 {
                return Err(ServiceError::ValidationError(format!(
                    "quantity for item {} must be at least 1",
                    update.id
                )));
            }
        }

        let Some(basket) = self.find_basket(user_id).await? else {
            return Ok(0);
        };

        let txn = self.db.begin().await?;
        let mut updated = 0u64;
        for update in &updates {
            let res = OrderItem::update_many()
                .col_expr(order_item::Column::Quantity, Expr::value(update.quantity))
                .filter(order_item::Column::Id.eq(update.id))
                .filter(order_item::Column::OrderId.eq(basket.id))
                .exec(&txn)
                .await?;
            updated += res.rows_affected;
        }
        txn.commit().await?;

        if updated > 0 {
            self.event_sender
                .send_or_log(Event::BasketChanged {
                    order_id: basket.id,
                })
                .await;
        }

        Ok(updated)
    }

    /// Deletes the listed items from the caller's basket; `ids` is the
    /// comma-separated form the API accepts. Unparseable ids are skipped.
    /// The basket order itself survives at zero items.
    #[instrument(skip(self))]
    pub async fn remove_items(&self, user_id: Uuid, ids: &str) -> Result<u64, ServiceError> {
        let item_ids: Vec<Uuid> = ids
            .split(',')
            .filter_map(|raw| Uuid::parse_str(raw.trim()).ok())
            .collect();
        if item_ids.is_empty() {
            return Ok(0);
        }

        let Some(basket) = self.find_basket(user_id).await? else {
            return Ok(0);
        };

        let res = OrderItem::delete_many()
            .filter(order_item::Column::Id.is_in(item_ids))
            .filter(order_item::Column::OrderId.eq(basket.id))
            .exec(&*self.db)
            .await?;

        if res.rows_affected > 0 {
            self.event_sender
                .send_or_log(Event::BasketChanged {
                    order_id: basket.id,
                })
                .await;
        }

        Ok(res.rows_affected)
    }

    async fn find_basket(&self, user_id: Uuid) -> Result<Option<OrderModel>, ServiceError> {
        Ok(Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .filter(order::Column::State.eq(OrderState::Basket))
            .one(&*self.db)
            .await?)
    }
}

/// Resolve-or-create the single basket order for a user. The partial unique
/// index on orders(user_id) where state='basket' closes the create race: a
/// losing insert re-reads and surfaces the winner's row.
async fn get_or_create_basket(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<OrderModel, ServiceError> {
    let existing = Order::find()
        .filter(order::Column::UserId.eq(user_id))
        .filter(order::Column::State.eq(OrderState::Basket))
        .one(db)
        .await?;
    if let Some(basket) = existing {
        return Ok(basket);
    }

    let fresh = order::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        state: Set(OrderState::Basket),
        contact_id: Set(None),
        created_at: Set(Utc::now()),
    };

    match fresh.insert(db).await {
        Ok(created) => Ok(created),
        Err(insert_err) => {
            let winner = Order::find()
                .filter(order::Column::UserId.eq(user_id))
                .filter(order::Column::State.eq(OrderState::Basket))
                .one(db)
                .await?;
            winner.ok_or_else(|| ServiceError::DatabaseError(insert_err))
        }
    }
}
