mod common;

use common::{TestApp, SHOP1_FEED};

use async_trait::async_trait;
use bazaar_api::{
    entities::{product_info, Order, OrderState, ProductInfo},
    errors::ServiceError,
    events::{process_events, EventSender, Notifier},
    services::{BasketItemInput, ContactInput, OrderService},
};
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, QueryOrder};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

fn contact_input() -> ContactInput {
    ContactInput {
        city: "Riga".to_string(),
        street: "Brivibas".to_string(),
        house: "1".to_string(),
        structure: String::new(),
        building: String::new(),
        apartment: "12".to_string(),
        phone: "+371000000".to_string(),
    }
}

/// Seeds a basket with the first listing and returns (basket order id,
/// contact id).
async fn seed_basket_and_contact(app: &TestApp, buyer: Uuid) -> (Uuid, Uuid) {
    let listing = ProductInfo::find()
        .order_by_asc(product_info::Column::Price)
        .one(&*app.state.db)
        .await
        .unwrap()
        .expect("a listing should exist");

    app.state
        .services
        .basket
        .add_items(
            buyer,
            vec![BasketItemInput {
                product_info: listing.id,
                quantity: 2,
            }],
        )
        .await
        .expect("seeding the basket should succeed");

    let basket_id = app.state.services.basket.get_basket(buyer).await.unwrap()[0].id;
    let contact = app
        .state
        .services
        .contacts
        .create(buyer, contact_input())
        .await
        .expect("contact creation should succeed");

    (basket_id, contact.id)
}

#[tokio::test]
async fn placing_an_order_transitions_basket_to_new_exactly_once() {
    let app = TestApp::new().await;
    app.import_feed(SHOP1_FEED, None).await;
    let buyer = Uuid::new_v4();
    let (order_id, contact_id) = seed_basket_and_contact(&app, buyer).await;

    app.state
        .services
        .orders
        .place_order(buyer, order_id, contact_id)
        .await
        .expect("first placement should succeed");

    let placed = Order::find_by_id(order_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(placed.state, OrderState::New);
    assert_eq!(placed.contact_id, Some(contact_id));

    // The second attempt finds no basket-state order and must not
    // double-place.
    let err = app
        .state
        .services
        .orders
        .place_order(buyer, order_id, contact_id)
        .await
        .expect_err("second placement must be rejected");
    assert!(matches!(err, ServiceError::NotFound(_)));

    let orders = app.state.services.orders.list_orders(buyer).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].state, OrderState::New);
    assert_eq!(orders[0].total_sum, dec!(40));
}

#[tokio::test]
async fn a_foreign_contact_blocks_placement() {
    let app = TestApp::new().await;
    app.import_feed(SHOP1_FEED, None).await;
    let buyer = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let (order_id, _) = seed_basket_and_contact(&app, buyer).await;

    let foreign_contact = app
        .state
        .services
        .contacts
        .create(stranger, contact_input())
        .await
        .unwrap();

    let err = app
        .state
        .services
        .orders
        .place_order(buyer, order_id, foreign_contact.id)
        .await
        .expect_err("foreign contact must not be usable");
    assert!(matches!(err, ServiceError::NotFound(_)));

    let still_basket = Order::find_by_id(order_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(still_basket.state, OrderState::Basket);
}

#[tokio::test]
async fn an_order_of_someone_else_cannot_be_placed() {
    let app = TestApp::new().await;
    app.import_feed(SHOP1_FEED, None).await;
    let buyer = Uuid::new_v4();
    let attacker = Uuid::new_v4();
    let (order_id, _) = seed_basket_and_contact(&app, buyer).await;

    let attacker_contact = app
        .state
        .services
        .contacts
        .create(attacker, contact_input())
        .await
        .unwrap();

    let err = app
        .state
        .services
        .orders
        .place_order(attacker, order_id, attacker_contact.id)
        .await
        .expect_err("placement is scoped to the owner");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn an_empty_basket_cannot_be_placed() {
    let app = TestApp::new().await;
    app.import_feed(SHOP1_FEED, None).await;
    let buyer = Uuid::new_v4();
    let (order_id, contact_id) = seed_basket_and_contact(&app, buyer).await;

    // Empty the basket, keeping the order row.
    let items = app.state.services.basket.get_basket(buyer).await.unwrap()[0]
        .items
        .iter()
        .map(|i| i.id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    app.state
        .services
        .basket
        .remove_items(buyer, &items)
        .await
        .unwrap();

    let err = app
        .state
        .services
        .orders
        .place_order(buyer, order_id, contact_id)
        .await
        .expect_err("an empty basket must not become an order");
    assert!(matches!(err, ServiceError::InvalidOperation(_)));

    let untouched = Order::find_by_id(order_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.state, OrderState::Basket, "rolled back");
}

struct RecordingNotifier {
    seen: Arc<Mutex<Vec<(Uuid, Uuid)>>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn order_placed(&self, order_id: Uuid, user_id: Uuid) -> Result<(), String> {
        self.seen.lock().await.push((order_id, user_id));
        Ok(())
    }
}

#[tokio::test]
async fn placement_emits_exactly_one_notification_event() {
    let app = TestApp::new().await;
    app.import_feed(SHOP1_FEED, None).await;
    let buyer = Uuid::new_v4();
    let (order_id, contact_id) = seed_basket_and_contact(&app, buyer).await;

    // Wire an order service to a channel we can observe.
    let (tx, rx) = mpsc::channel(8);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let loop_handle = tokio::spawn(process_events(
        rx,
        Arc::new(RecordingNotifier { seen: seen.clone() }),
    ));
    let orders = OrderService::new(app.state.db.clone(), Arc::new(EventSender::new(tx)));

    orders
        .place_order(buyer, order_id, contact_id)
        .await
        .expect("placement should succeed");

    drop(orders);
    loop_handle.await.expect("event loop should drain");

    assert_eq!(seen.lock().await.as_slice(), &[(order_id, buyer)]);
}

#[tokio::test]
async fn vendors_see_only_their_own_lines() {
    let app = TestApp::new().await;
    let vendor_one = Uuid::new_v4();
    let vendor_two = Uuid::new_v4();

    let feed_one = bazaar_api::services::import::parse_feed(SHOP1_FEED).unwrap();
    app.state
        .services
        .importer
        .import(feed_one, Some(vendor_one))
        .await
        .unwrap();
    app.state
        .services
        .importer
        .import(
            bazaar_api::services::import::parse_feed(
                r#"
shop: Shop2
categories:
  - id: 1
    name: Phones
goods:
  - id: 900
    category: 1
    name: Phone Z
    model: z
    quantity: 5
    price: 300
    price_rrc: 320
    parameters: {}
"#,
            )
            .unwrap(),
            Some(vendor_two),
        )
        .await
        .unwrap();

    // One basket spanning both shops.
    let buyer = Uuid::new_v4();
    let listings = ProductInfo::find()
        .order_by_asc(product_info::Column::Price)
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(listings.len(), 3);
    app.state
        .services
        .basket
        .add_items(
            buyer,
            listings
                .iter()
                .map(|l| BasketItemInput {
                    product_info: l.id,
                    quantity: 1,
                })
                .collect(),
        )
        .await
        .unwrap();

    let basket_id = app.state.services.basket.get_basket(buyer).await.unwrap()[0].id;
    let contact = app
        .state
        .services
        .contacts
        .create(buyer, contact_input())
        .await
        .unwrap();
    app.state
        .services
        .orders
        .place_order(buyer, basket_id, contact.id)
        .await
        .unwrap();

    let vendor_two_view = app
        .state
        .services
        .orders
        .list_partner_orders(vendor_two)
        .await
        .unwrap();
    assert_eq!(vendor_two_view.len(), 1);
    assert_eq!(vendor_two_view[0].items.len(), 1);
    assert_eq!(vendor_two_view[0].items[0].listing.external_id, 900);
    assert_eq!(vendor_two_view[0].total_sum, dec!(300));

    let vendor_one_view = app
        .state
        .services
        .orders
        .list_partner_orders(vendor_one)
        .await
        .unwrap();
    assert_eq!(vendor_one_view.len(), 1);
    assert_eq!(vendor_one_view[0].items.len(), 2);
    assert_eq!(vendor_one_view[0].total_sum, dec!(520));

    // Baskets never show up in the vendor view.
    let window_shopper = Uuid::new_v4();
    app.state
        .services
        .basket
        .add_items(
            window_shopper,
            vec![BasketItemInput {
                product_info: listings[0].id,
                quantity: 1,
            }],
        )
        .await
        .unwrap();
    let view_again = app
        .state
        .services
        .orders
        .list_partner_orders(vendor_one)
        .await
        .unwrap();
    assert_eq!(view_again.len(), 1, "baskets are excluded");
}
