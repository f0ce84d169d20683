use crate::{
    entities::{
        order, order_item, product_info, shop, Contact, Order, OrderItem, OrderModel, OrderState,
        ProductInfo, Shop,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::catalog::{expand_listings, ListingDetail},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, TransactionTrait,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// An order expanded for API responses: items with full listing detail and
/// the derived total, computed from current listing prices at read time.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub id: Uuid,
    pub state: OrderState,
    pub created_at: DateTime<Utc>,
    pub contact_id: Option<Uuid>,
    pub total_sum: Decimal,
    pub items: Vec<OrderItemDetail>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemDetail {
    pub id: Uuid,
    pub quantity: i32,
    pub listing: ListingDetail,
}

/// Placed-order side of the basket/order engine: the basket -> new
/// transition and the buyer/vendor order views.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// The caller's placed orders (everything past the basket state).
    pub async fn list_orders(&self, user_id: Uuid) -> Result<Vec<OrderDetail>, ServiceError> {
        let orders = Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .filter(order::Column::State.ne(OrderState::Basket))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        expand_orders(&*self.db, orders, None).await
    }

    /// Finalizes a basket: sets the delivery contact and moves the state to
    /// `new` in one conditional update, so a second placement of the same
    /// order can never succeed. The notification event is published only
    /// after the transaction commits and never affects the outcome.
    #[instrument(skip(self))]
    pub async fn place_order(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        contact_id: Uuid,
    ) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let contact = Contact::find_by_id(contact_id)
            .one(&txn)
            .await?
            .filter(|c| c.user_id == user_id)
            .ok_or_else(|| ServiceError::NotFound(format!("contact {contact_id} not found")))?;

        let item_count = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .count(&txn)
            .await?;

        let updated = Order::update_many()
            .col_expr(order::Column::State, Expr::value(OrderState::New))
            .col_expr(order::Column::ContactId, Expr::value(contact.id))
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::UserId.eq(user_id))
            .filter(order::Column::State.eq(OrderState::Basket))
            .exec(&txn)
            .await?;

        if updated.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("order {order_id} not found")));
        }
        if item_count == 0 {
            // Dropping the transaction rolls the state change back.
            return Err(ServiceError::InvalidOperation(
                "cannot place an empty basket".to_string(),
            ));
        }

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::OrderPlaced { order_id, user_id })
            .await;

        info!(%order_id, %user_id, "order placed");
        Ok(())
    }

    /// Vendor view: placed orders containing the vendor's shop's listings,
    /// with items and totals restricted to that shop's own lines.
    pub async fn list_partner_orders(
        &self,
        vendor_user_id: Uuid,
    ) -> Result<Vec<OrderDetail>, ServiceError> {
        let own_shop = Shop::find()
            .filter(shop::Column::UserId.eq(vendor_user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound("no shop is bound to this vendor".to_string())
            })?;

        let shop_items = OrderItem::find()
            .join(JoinType::InnerJoin, order_item::Relation::ProductInfo.def())
            .filter(product_info::Column::ShopId.eq(own_shop.id))
            .all(&*self.db)
            .await?;

        let order_ids: HashSet<Uuid> = shop_items.iter().map(|i| i.order_id).collect();
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let orders = Order::find()
            .filter(order::Column::Id.is_in(order_ids))
            .filter(order::Column::State.ne(OrderState::Basket))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        expand_orders(&*self.db, orders, Some(own_shop.id)).await
    }
}

/// Expands orders with their items, listing detail, and live-price totals.
/// With `shop_scope`, items and totals are restricted to that shop's
/// listings (the vendor view).
pub(crate) async fn expand_orders<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<OrderModel>,
    shop_scope: Option<Uuid>,
) -> Result<Vec<OrderDetail>, ServiceError> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();

    let mut items_query = OrderItem::find().filter(order_item::Column::OrderId.is_in(order_ids));
    if let Some(shop_id) = shop_scope {
        items_query = items_query
            .join(JoinType::InnerJoin, order_item::Relation::ProductInfo.def())
            .filter(product_info::Column::ShopId.eq(shop_id));
    }
    let items = items_query.all(conn).await?;

    let info_ids: HashSet<Uuid> = items.iter().map(|i| i.product_info_id).collect();
    let infos = ProductInfo::find()
        .filter(product_info::Column::Id.is_in(info_ids))
        .all(conn)
        .await?;
    let listings: HashMap<Uuid, ListingDetail> = expand_listings(conn, infos)
        .await?
        .into_iter()
        .map(|d| (d.id, d))
        .collect();

    let mut grouped: HashMap<Uuid, Vec<OrderItemDetail>> = HashMap::new();
    for item in items {
        // Items whose listing vanished mid-read are skipped rather than
        // failing the whole view.
        if let Some(listing) = listings.get(&item.product_info_id) {
            grouped.entry(item.order_id).or_default().push(OrderItemDetail {
                id: item.id,
                quantity: item.quantity,
                listing: listing.clone(),
            });
        }
    }

    let mut details = Vec::with_capacity(orders.len());
    for order in orders {
        let items = grouped.remove(&order.id).unwrap_or_default();
        let total_sum: Decimal = items
            .iter()
            .map(|i| i.listing.price * Decimal::from(i.quantity))
            .sum();
        details.push(OrderDetail {
            id: order.id,
            state: order.state,
            created_at: order.created_at,
            contact_id: order.contact_id,
            total_sum,
            items,
        });
    }

    Ok(details)
}
