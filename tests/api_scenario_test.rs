mod common;

use common::{TestApp, SHOP1_FEED};

use axum::http::{Method, StatusCode};
use bazaar_api::auth::UserRole;
use serde_json::json;
use uuid::Uuid;

/// The full buyer journey over HTTP: import -> browse -> basket -> checkout.
#[tokio::test]
async fn shop_with_two_goods_is_browsed_basketed_and_ordered() {
    let app = TestApp::new().await;
    app.import_feed(SHOP1_FEED, None).await;

    let buyer = Uuid::new_v4();
    let token = app.token_for(buyer, UserRole::Buyer);

    let (status, products) = app
        .request(Method::GET, "/api/v1/products", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let products = products.as_array().expect("products is an array");
    assert_eq!(products.len(), 2);

    let (first, second) = (&products[0], &products[1]);
    let body = json!({
        "items": [
            { "product_info": first["id"], "quantity": 2 },
            { "product_info": second["id"], "quantity": 1 },
        ]
    });
    let (status, created) = app
        .request(Method::POST, "/api/v1/basket", Some(&token), Some(body))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["created"], 2);

    let (status, basket) = app
        .request(Method::GET, "/api/v1/basket", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let basket = basket.as_array().unwrap();
    assert_eq!(basket.len(), 1);
    assert_eq!(basket[0]["items"].as_array().unwrap().len(), 2);

    let p1 = first["price"].as_str().map(str::to_owned).unwrap_or_else(|| first["price"].to_string());
    let p2 = second["price"].as_str().map(str::to_owned).unwrap_or_else(|| second["price"].to_string());
    let expected: f64 = p1.parse::<f64>().unwrap() * 2.0 + p2.parse::<f64>().unwrap();
    let total: f64 = match &basket[0]["total_sum"] {
        v if v.is_string() => v.as_str().unwrap().parse().unwrap(),
        v => v.as_f64().unwrap(),
    };
    assert!((total - expected).abs() < f64::EPSILON);

    let (status, contact) = app
        .request(
            Method::POST,
            "/api/v1/user/contact",
            Some(&token),
            Some(json!({
                "city": "Riga",
                "street": "Brivibas",
                "house": "1",
                "phone": "+371000000"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, placed) = app
        .request(
            Method::POST,
            "/api/v1/order",
            Some(&token),
            Some(json!({
                "id": basket[0]["id"],
                "contact": contact["id"],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(placed["placed"], true);

    let (status, orders) = app
        .request(Method::GET, "/api/v1/order", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["state"], "new");

    let (_, basket_after) = app
        .request(Method::GET, "/api/v1/basket", Some(&token), None)
        .await;
    assert!(
        basket_after.as_array().unwrap().is_empty(),
        "the placed order is no longer a basket"
    );
}

#[tokio::test]
async fn basket_requires_authentication() {
    let app = TestApp::new().await;

    let (status, _) = app.request(Method::GET, "/api/v1/basket", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(Method::GET, "/api/v1/basket", Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn partner_endpoints_reject_buyers() {
    let app = TestApp::new().await;
    let buyer_token = app.token_for(Uuid::new_v4(), UserRole::Buyer);

    let (status, _) = app
        .request(
            Method::GET,
            "/api/v1/partner/state",
            Some(&buyer_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/partner/update",
            Some(&buyer_token),
            Some(json!({"url": "https://supplier.example/feed.yaml"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_feed_url_is_a_validation_error_before_any_fetch() {
    let app = TestApp::new().await;
    let vendor = Uuid::new_v4();
    let token = app.token_for(vendor, UserRole::Shop);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/partner/update",
            Some(&token),
            Some(json!({"url": "nonsense"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .contains("invalid feed url"));
}

#[tokio::test]
async fn vendor_toggles_its_shop_over_http() {
    let app = TestApp::new().await;
    let vendor = Uuid::new_v4();
    let feed = bazaar_api::services::import::parse_feed(SHOP1_FEED).unwrap();
    app.state
        .services
        .importer
        .import(feed, Some(vendor))
        .await
        .unwrap();

    let token = app.token_for(vendor, UserRole::Shop);

    let (status, shop) = app
        .request(Method::GET, "/api/v1/partner/state", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shop["active"], true);
    assert_eq!(shop["name"], "Shop1");

    let (status, shop) = app
        .request(
            Method::POST,
            "/api/v1/partner/state",
            Some(&token),
            Some(json!({"state": false})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shop["active"], false);

    let (_, shops) = app.request(Method::GET, "/api/v1/shops", None, None).await;
    assert!(shops.as_array().unwrap().is_empty());

    let (_, products) = app
        .request(Method::GET, "/api/v1/products", None, None)
        .await;
    assert!(products.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn products_category_filter_matches_direct_store_query() {
    let app = TestApp::new().await;
    app.import_feed(SHOP1_FEED, None).await;

    let (status, filtered) = app
        .request(Method::GET, "/api/v1/products?category_id=1", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let direct = app
        .state
        .services
        .catalog
        .search_listings(bazaar_api::services::ListingFilter {
            shop_id: None,
            category_id: Some(1),
        })
        .await
        .unwrap();

    assert_eq!(filtered.as_array().unwrap().len(), direct.len());
}

#[tokio::test]
async fn bad_basket_quantity_is_rejected_at_the_schema() {
    let app = TestApp::new().await;
    app.import_feed(SHOP1_FEED, None).await;
    let token = app.token_for(Uuid::new_v4(), UserRole::Buyer);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/basket",
            Some(&token),
            Some(json!({"items": [{"product_info": Uuid::new_v4(), "quantity": 0}]})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
