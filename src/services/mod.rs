pub mod basket;
pub mod catalog;
pub mod contacts;
pub mod import;
pub mod orders;
pub mod shops;

pub use basket::{BasketItemInput, BasketItemUpdate, BasketService};
pub use catalog::{CatalogService, ListingDetail, ListingFilter};
pub use contacts::{ContactInput, ContactService, ContactUpdate};
pub use import::{FeedImportService, ImportSummary, PriceFeed};
pub use orders::{OrderDetail, OrderService};
pub use shops::ShopService;
