pub mod basket;
pub mod catalog;
pub mod common;
pub mod contacts;
pub mod orders;
pub mod partner;

use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::events::EventSender;
use crate::services::{
    BasketService, CatalogService, ContactService, FeedImportService, OrderService, ShopService,
};
use std::sync::Arc;
use std::time::Duration;

/// Service container handed to the HTTP handlers through `AppState`.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub importer: Arc<FeedImportService>,
    pub basket: Arc<BasketService>,
    pub orders: Arc<OrderService>,
    pub shops: Arc<ShopService>,
    pub contacts: Arc<ContactService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        feed_fetch_timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let importer = Arc::new(FeedImportService::new(
            db.clone(),
            event_sender.clone(),
            feed_fetch_timeout,
        )?);

        Ok(Self {
            catalog: Arc::new(CatalogService::new(db.clone())),
            importer,
            basket: Arc::new(BasketService::new(db.clone(), event_sender.clone())),
            orders: Arc::new(OrderService::new(db.clone(), event_sender.clone())),
            shops: Arc::new(ShopService::new(db.clone(), event_sender)),
            contacts: Arc::new(ContactService::new(db)),
        })
    }
}
