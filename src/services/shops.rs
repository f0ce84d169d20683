use crate::{
    entities::{shop, Shop, ShopModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Vendor-facing shop state: reading and toggling the `active` flag that
/// gates buyer visibility. Only the bound vendor may write.
#[derive(Clone)]
pub struct ShopService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ShopService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// The shop bound to this vendor, if any.
    pub async fn get_own_shop(&self, vendor_user_id: Uuid) -> Result<ShopModel, ServiceError> {
        Shop::find()
            .filter(shop::Column::UserId.eq(vendor_user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("no shop is bound to this vendor".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn set_state(
        &self,
        vendor_user_id: Uuid,
        active: bool,
    ) -> Result<ShopModel, ServiceError> {
        let found = self.get_own_shop(vendor_user_id).await?;

        let mut update: shop::ActiveModel = found.into();
        update.active = Set(active);
        let updated = update.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ShopStateChanged {
                shop_id: updated.id,
                active,
            })
            .await;

        info!(shop_id = %updated.id, active, "shop state updated");
        Ok(updated)
    }
}
