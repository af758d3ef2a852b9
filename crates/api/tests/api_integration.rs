//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::InMemoryStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> Router {
    let state = api::create_default_state(InMemoryStore::new());
    api::create_app(state, get_metrics_handle())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, None).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Some(body)).await
}

async fn join(app: &Router, name: &str, city: &str) -> i64 {
    let (status, json) = post(
        app,
        "/members",
        json!({ "name": name, "city": city, "street": "1", "zipcode": "1111" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_i64().unwrap()
}

async fn book(app: &Router, name: &str, price: i64, stock: u32) -> i64 {
    let (status, json) = post(
        app,
        "/items",
        json!({
            "name": name,
            "price": price,
            "stock_quantity": stock,
            "dtype": "B",
            "author": "kim",
            "isbn": "978-0",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_i64().unwrap()
}

async fn place(app: &Router, member_id: i64, lines: &[(i64, u32)]) -> (StatusCode, Value) {
    let items: Vec<Value> = lines
        .iter()
        .map(|(item_id, count)| json!({ "item_id": item_id, "count": count }))
        .collect();
    post(app, "/orders", json!({ "member_id": member_id, "items": items })).await
}

/// userA orders JPA1 x1 + JPA2 x2, userB orders SPRING1 x3 + SPRING2 x4.
async fn seed_shop(app: &Router) -> Vec<i64> {
    let user_a = join(app, "userA", "Seoul").await;
    let user_b = join(app, "userB", "Busan").await;
    let jpa1 = book(app, "JPA1 BOOK", 10_000, 100).await;
    let jpa2 = book(app, "JPA2 BOOK", 20_000, 100).await;
    let spring1 = book(app, "SPRING1 BOOK", 20_000, 200).await;
    let spring2 = book(app, "SPRING2 BOOK", 40_000, 300).await;

    let mut ids = Vec::new();
    for (member, lines) in [
        (user_a, vec![(jpa1, 1), (jpa2, 2)]),
        (user_b, vec![(spring1, 3), (spring2, 4)]),
    ] {
        let (status, json) = place(app, member, &lines).await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(json["order_id"].as_i64().unwrap());
    }
    ids
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, json) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    seed_shop(&app).await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_member_join_and_lookup() {
    let app = setup();
    let id = join(&app, "kim", "Seoul").await;

    let (status, json) = get(&app, &format!("/members/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "kim");
    assert_eq!(json["address"]["city"], "Seoul");

    let (status, json) = get(&app, "/members").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_member_is_conflict() {
    let app = setup();
    join(&app, "kim", "Seoul").await;

    let (status, json) = post(&app, "/members", json!({ "name": "kim" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("kim"));
}

#[tokio::test]
async fn test_blank_member_name_is_bad_request() {
    let app = setup();
    let (status, _) = post(&app, "/members", json!({ "name": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rename_member() {
    let app = setup();
    let id = join(&app, "kim", "Seoul").await;
    join(&app, "lee", "Busan").await;

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/members/{id}"),
        Some(json!({ "name": "park" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "park");

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/members/{id}"),
        Some(json!({ "name": "lee" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, "PUT", "/members/999", Some(json!({ "name": "x" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_item_create_and_update() {
    let app = setup();
    let (status, json) = post(
        &app,
        "/items",
        json!({
            "name": "Kind of Blue",
            "price": 15_000,
            "stock_quantity": 5,
            "dtype": "A",
            "artist": "Miles Davis",
            "etc": "LP",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["dtype"], "A");
    assert_eq!(json["artist"], "Miles Davis");
    let id = json["id"].as_i64().unwrap();

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/items/{id}"),
        Some(json!({ "name": "Kind of Blue", "price": 12_000, "stock_quantity": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["price"], 12_000);
    assert_eq!(json["stock_quantity"], 9);
    assert_eq!(json["dtype"], "A");

    let (status, _) = get(&app, "/items/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_item_price_out_of_range_is_bad_request() {
    let app = setup();
    for price in [-1, i64::MAX] {
        let (status, json) = post(
            &app,
            "/items",
            json!({
                "name": "JPA1 BOOK",
                "price": price,
                "stock_quantity": 1,
                "dtype": "B",
                "author": "kim",
                "isbn": "978-0",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "price {price}");
        assert!(json["error"].is_string());
    }

    let id = book(&app, "JPA1 BOOK", 10_000, 5).await;
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/items/{id}"),
        Some(json!({ "name": "JPA1 BOOK", "price": i64::MAX, "stock_quantity": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, json) = get(&app, &format!("/items/{id}")).await;
    assert_eq!(json["price"], 10_000);
}

#[tokio::test]
async fn test_category_tree() {
    let app = setup();
    let item = book(&app, "JPA1 BOOK", 10_000, 10).await;

    let (status, json) = post(&app, "/categories", json!({ "name": "books" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let root = json["id"].as_i64().unwrap();

    let (status, _) = post(
        &app,
        "/categories",
        json!({ "name": "programming", "parent_id": root }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = post(&app, &format!("/categories/{root}/items/{item}"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["item_ids"], json!([item]));

    let (status, json) = get(&app, &format!("/categories/{root}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["children"][0]["name"], "programming");

    let (status, _) = post(&app, "/categories", json!({ "name": "x", "parent_id": 999 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_lifecycle() {
    let app = setup();
    let member = join(&app, "kim", "Seoul").await;
    let item = book(&app, "JPA1 BOOK", 10_000, 10).await;

    let (status, json) = place(&app, member, &[(item, 2)]).await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = json["order_id"].as_i64().unwrap();

    let (status, json) = get(&app, &format!("/orders/{order_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ORDERED");
    assert_eq!(json["total_price"], 20_000);
    assert_eq!(json["delivery"]["status"], "READY");
    assert_eq!(json["delivery"]["address"]["city"], "Seoul");

    let (_, json) = get(&app, &format!("/items/{item}")).await;
    assert_eq!(json["stock_quantity"], 8);

    let (status, json) = post(&app, &format!("/orders/{order_id}/cancel"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "CANCELLED");

    let (_, json) = get(&app, &format!("/items/{item}")).await;
    assert_eq!(json["stock_quantity"], 10);

    let (status, _) = post(&app, &format!("/orders/{order_id}/cancel"), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_completed_delivery_cannot_be_cancelled() {
    let app = setup();
    let member = join(&app, "kim", "Seoul").await;
    let item = book(&app, "JPA1 BOOK", 10_000, 10).await;
    let (_, json) = place(&app, member, &[(item, 1)]).await;
    let order_id = json["order_id"].as_i64().unwrap();

    let (status, json) = post(
        &app,
        &format!("/orders/{order_id}/delivery/complete"),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["delivery"]["status"], "COMP");

    let (status, _) = post(&app, &format!("/orders/{order_id}/cancel"), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, json) = get(&app, &format!("/items/{item}")).await;
    assert_eq!(json["stock_quantity"], 9);
}

#[tokio::test]
async fn test_order_rejections() {
    let app = setup();
    let member = join(&app, "kim", "Seoul").await;
    let item = book(&app, "JPA1 BOOK", 10_000, 1).await;

    let (status, json) = place(&app, member, &[(item, 2)]).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("stock"));

    let (status, _) = place(&app, 999, &[(item, 1)]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = place(&app, member, &[(999, 1)]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = place(&app, member, &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = place(&app, member, &[(item, 0)]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, json) = get(&app, &format!("/items/{item}")).await;
    assert_eq!(json["stock_quantity"], 1);

    let (status, _) = get(&app, "/orders/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = post(&app, "/orders/999/cancel", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_search() {
    let app = setup();
    let ids = seed_shop(&app).await;
    post(&app, &format!("/orders/{}/cancel", ids[1]), json!({})).await;

    let (status, json) = get(&app, "/orders?status=CANCELLED").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["id"], ids[1]);

    let (_, json) = get(&app, "/orders?member_name=userA").await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["id"], ids[0]);

    let (status, _) = get(&app, "/orders?status=SHIPPED").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_member_orders() {
    let app = setup();
    let ids = seed_shop(&app).await;

    let (status, json) = get(&app, "/members/1/orders").await;
    assert_eq!(status, StatusCode::OK);
    let orders = json.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], ids[0]);
    assert_eq!(orders[0]["total_price"], 50_000);

    let (status, _) = get(&app, "/members/999/orders").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_every_order_version_returns_the_same_orders() {
    let app = setup();
    let ids = seed_shop(&app).await;

    for version in ["v2", "v3", "v3.1", "v4", "v5", "v6"] {
        let (status, json) = get(&app, &format!("/api/{version}/orders")).await;
        assert_eq!(status, StatusCode::OK, "version {version}");

        let orders = json.as_array().unwrap();
        assert_eq!(orders.len(), 2, "version {version}");
        assert_eq!(orders[0]["order_id"], ids[0], "version {version}");
        assert_eq!(orders[0]["name"], "userA", "version {version}");
        assert_eq!(orders[0]["order_status"], "ORDERED", "version {version}");
        assert_eq!(orders[1]["address"]["city"], "Busan", "version {version}");

        let lines = orders[1]["order_items"].as_array().unwrap();
        assert_eq!(lines.len(), 2, "version {version}");
        assert_eq!(lines[1]["item_name"], "SPRING2 BOOK", "version {version}");
        assert_eq!(lines[1]["order_price"], 40_000, "version {version}");
        assert_eq!(lines[1]["count"], 4, "version {version}");
        assert!(lines[1].get("order_id").is_none(), "version {version}");
    }
}

#[tokio::test]
async fn test_v1_exposes_the_entity_graph() {
    let app = setup();
    seed_shop(&app).await;

    let (status, json) = get(&app, "/api/v1/orders").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["member"]["name"], "userA");
    assert_eq!(json[0]["delivery"]["status"], "READY");
    assert_eq!(json[0]["order_items"][1]["item"]["name"], "JPA2 BOOK");
    assert_eq!(json[0]["order_items"][1]["item"]["dtype"], "B");
}

#[tokio::test]
async fn test_paging() {
    let app = setup();
    let ids = seed_shop(&app).await;

    let (status, json) = get(&app, "/api/v3.1/orders?offset=1&limit=1").await;
    assert_eq!(status, StatusCode::OK);
    let orders = json.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["order_id"], ids[1]);
    assert_eq!(orders[0]["order_items"].as_array().unwrap().len(), 2);

    for version in ["v1", "v2", "v4", "v5"] {
        let (status, json) = get(&app, &format!("/api/{version}/orders?offset=1&limit=1")).await;
        assert_eq!(status, StatusCode::OK, "version {version}");
        assert_eq!(json.as_array().unwrap().len(), 2, "version {version}");
    }

    let (status, json) = get(&app, &format!("/api/v3.1/orders?offset={}", u64::MAX)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json.as_array().unwrap().is_empty());

    for version in ["v3", "v6"] {
        let (status, json) = get(&app, &format!("/api/{version}/orders?limit=1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "version {version}");
        assert!(json["error"].is_string());
    }
}

#[tokio::test]
async fn test_order_versions_filter() {
    let app = setup();
    seed_shop(&app).await;

    for version in ["v1", "v2", "v3", "v3.1", "v4", "v5", "v6"] {
        let (status, json) = get(&app, &format!("/api/{version}/orders?member_name=userB")).await;
        assert_eq!(status, StatusCode::OK, "version {version}");
        assert_eq!(json.as_array().unwrap().len(), 1, "version {version}");

        let (status, json) = get(&app, &format!("/api/{version}/orders?status=cancelled")).await;
        assert_eq!(status, StatusCode::OK, "version {version}");
        assert!(json.as_array().unwrap().is_empty(), "version {version}");
    }
}

#[tokio::test]
async fn test_simple_orders() {
    let app = setup();
    let ids = seed_shop(&app).await;

    let (status, json) = get(&app, "/api/v1/simple-orders").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[1]["member"]["name"], "userB");

    for version in ["v2", "v3", "v4"] {
        let (status, json) = get(&app, &format!("/api/{version}/simple-orders")).await;
        assert_eq!(status, StatusCode::OK, "version {version}");
        let orders = json.as_array().unwrap();
        assert_eq!(orders.len(), 2, "version {version}");
        assert_eq!(orders[0]["order_id"], ids[0], "version {version}");
        assert_eq!(orders[0]["address"]["city"], "Seoul", "version {version}");
        assert!(orders[0].get("order_items").is_none(), "version {version}");
    }
}
