mod common;

use common::{TestApp, SHOP1_FEED};

use bazaar_api::{
    entities::{category, product_info, Category, OrderItem, ProductInfo, Shop},
    errors::ServiceError,
    services::{import::parse_feed, BasketItemInput},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

const SHOP1_SECOND_FEED: &str = r#"
shop: Shop1
categories:
  - id: 1
    name: Phones
goods:
  - id: 300
    category: 1
    name: Phone C
    model: c/256gb
    quantity: 3
    price: 700
    price_rrc: 740
    parameters:
      "Color": "silver"
"#;

async fn shop_listings(app: &TestApp, shop_id: Uuid) -> Vec<product_info::Model> {
    ProductInfo::find()
        .filter(product_info::Column::ShopId.eq(shop_id))
        .all(&*app.state.db)
        .await
        .expect("listings should load")
}

#[tokio::test]
async fn importing_twice_leaves_exactly_the_second_feed() {
    let app = TestApp::new().await;

    let shop_id = app.import_feed(SHOP1_FEED, None).await;
    assert_eq!(shop_listings(&app, shop_id).await.len(), 2);

    let second_shop_id = app.import_feed(SHOP1_SECOND_FEED, None).await;
    assert_eq!(shop_id, second_shop_id, "same shop resolved by name");

    let listings = shop_listings(&app, shop_id).await;
    assert_eq!(listings.len(), 1, "no leftovers from the first feed");
    assert_eq!(listings[0].external_id, 300);
    assert_eq!(listings[0].model, "c/256gb");
}

#[tokio::test]
async fn reimporting_the_same_feed_does_not_duplicate() {
    let app = TestApp::new().await;

    let shop_id = app.import_feed(SHOP1_FEED, None).await;
    let shop_id2 = app.import_feed(SHOP1_FEED, None).await;
    assert_eq!(shop_id, shop_id2);

    assert_eq!(shop_listings(&app, shop_id).await.len(), 2);
    let categories = Category::find()
        .all(&*app.state.db)
        .await
        .expect("categories should load");
    assert_eq!(categories.len(), 2);
}

#[tokio::test]
async fn first_vendor_bind_wins() {
    let app = TestApp::new().await;
    let vendor_one = Uuid::new_v4();
    let vendor_two = Uuid::new_v4();

    let feed = parse_feed(SHOP1_FEED).unwrap();
    let summary = app
        .state
        .services
        .importer
        .import(feed.clone(), Some(vendor_one))
        .await
        .expect("first vendor import should succeed");

    let shop = Shop::find_by_id(summary.shop_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(shop.user_id, Some(vendor_one));

    // A different vendor may not import into the bound shop.
    let err = app
        .state
        .services
        .importer
        .import(feed.clone(), Some(vendor_two))
        .await
        .expect_err("foreign vendor import must be refused");
    assert!(matches!(err, ServiceError::Forbidden(_)));

    // Operator imports never change the binding.
    app.state
        .services
        .importer
        .import(feed, None)
        .await
        .expect("operator import should succeed");
    let shop = Shop::find_by_id(summary.shop_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(shop.user_id, Some(vendor_one));
}

#[tokio::test]
async fn unknown_category_aborts_the_import_and_rolls_back() {
    let app = TestApp::new().await;
    let shop_id = app.import_feed(SHOP1_FEED, None).await;

    let bad_feed = parse_feed(
        r#"
shop: Shop1
categories:
  - id: 1
    name: Phones
goods:
  - id: 400
    category: 1
    name: Phone D
    model: d
    quantity: 1
    price: 100
    price_rrc: 110
    parameters: {}
  - id: 500
    category: 99
    name: Ghost
    model: g
    quantity: 1
    price: 1
    price_rrc: 1
    parameters: {}
"#,
    )
    .unwrap();

    let err = app
        .state
        .services
        .importer
        .import(bad_feed, None)
        .await
        .expect_err("good referencing an undeclared category must fail");
    assert!(matches!(err, ServiceError::ValidationError(_)));

    // The failed import must not leave the shop half-replaced or empty.
    let listings = shop_listings(&app, shop_id).await;
    assert_eq!(listings.len(), 2, "previous listings survive the rollback");
}

#[tokio::test]
async fn feed_renames_its_own_category_in_place() {
    let app = TestApp::new().await;
    app.import_feed(SHOP1_FEED, None).await;

    app.import_feed(
        r#"
shop: Shop1
categories:
  - id: 1
    name: Smartphones
goods: []
"#,
        None,
    )
    .await;

    let renamed = Category::find_by_id(1)
        .one(&*app.state.db)
        .await
        .unwrap()
        .expect("category 1 should still exist");
    assert_eq!(renamed.name, "Smartphones");

    let with_old_name = Category::find()
        .filter(category::Column::Name.eq("Phones"))
        .one(&*app.state.db)
        .await
        .unwrap();
    assert!(with_old_name.is_none());
}

#[tokio::test]
async fn reimport_drops_basket_items_for_replaced_listings() {
    let app = TestApp::new().await;
    let shop_id = app.import_feed(SHOP1_FEED, None).await;
    let listing = shop_listings(&app, shop_id).await.remove(0);

    let buyer = Uuid::new_v4();
    app.state
        .services
        .basket
        .add_items(
            buyer,
            vec![BasketItemInput {
                product_info: listing.id,
                quantity: 1,
            }],
        )
        .await
        .expect("add to basket should succeed");

    app.import_feed(SHOP1_SECOND_FEED, None).await;

    let orphaned = OrderItem::find()
        .all(&*app.state.db)
        .await
        .expect("order items should load");
    assert!(
        orphaned.is_empty(),
        "items referencing replaced listings are deleted with them"
    );

    // The basket order itself survives, just empty.
    let basket = app
        .state
        .services
        .basket
        .get_basket(buyer)
        .await
        .expect("basket should load");
    assert_eq!(basket.len(), 1);
    assert!(basket[0].items.is_empty());
}
