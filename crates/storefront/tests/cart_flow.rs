//! Session cart behavior over HTTP.

mod common;

use common::spawn_app;

#[tokio::test]
async fn adding_twice_bumps_quantity() {
    let app = spawn_app().await;

    app.add_router_to_cart().await;
    app.add_router_to_cart().await;

    let drawer = app.get_text("/cart").await;
    assert!(drawer.contains("Gigabit Router"), "got: {drawer}");
    assert!(drawer.contains("&times; 2"));
    assert!(drawer.contains("Ksh 9,000"));

    let count = app.get_text("/cart/count").await;
    assert!(count.contains('2'));
}

#[tokio::test]
async fn distinct_products_keep_insertion_order() {
    let app = spawn_app().await;

    app.add_router_to_cart().await;
    app.post_form(
        "/cart/add",
        &[
            ("product_id", "p2"),
            ("name", "CCTV Camera"),
            ("price", "7800"),
        ],
    )
    .await;

    let drawer = app.get_text("/cart").await;
    let router_pos = drawer.find("Gigabit Router").expect("router in drawer");
    let camera_pos = drawer.find("CCTV Camera").expect("camera in drawer");
    assert!(router_pos < camera_pos);
    assert!(drawer.contains("Ksh 12,300"));
}

#[tokio::test]
async fn decrease_drops_the_line_at_zero() {
    let app = spawn_app().await;

    app.add_router_to_cart().await;
    app.add_router_to_cart().await;

    let drawer = app
        .post_form("/cart/decrease", &[("product_id", "p1")])
        .await
        .text()
        .await
        .unwrap();
    assert!(drawer.contains("&times; 1"), "got: {drawer}");

    let drawer = app
        .post_form("/cart/decrease", &[("product_id", "p1")])
        .await
        .text()
        .await
        .unwrap();
    assert!(drawer.contains("Your cart is empty."), "got: {drawer}");
}

#[tokio::test]
async fn remove_deletes_the_whole_line() {
    let app = spawn_app().await;

    app.add_router_to_cart().await;
    app.add_router_to_cart().await;

    let drawer = app
        .post_form("/cart/remove", &[("product_id", "p1")])
        .await
        .text()
        .await
        .unwrap();
    assert!(drawer.contains("Your cart is empty."), "got: {drawer}");
}

#[tokio::test]
async fn cart_persists_across_requests_in_one_session() {
    let app = spawn_app().await;

    app.add_router_to_cart().await;

    // A fresh request on the same cookie jar still sees the cart.
    let count = app.get_text("/cart/count").await;
    assert!(count.contains('1'), "got: {count}");

    // A different visitor (no cookies shared) sees nothing.
    let other = reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap();
    let drawer = other
        .get(app.url("/cart"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(drawer.contains("Your cart is empty."));
}

#[tokio::test]
async fn mutations_fire_the_cart_updated_trigger() {
    let app = spawn_app().await;

    let response = app
        .post_form(
            "/cart/add",
            &[
                ("product_id", "p1"),
                ("name", "Gigabit Router"),
                ("price", "4500"),
            ],
        )
        .await;
    let trigger = response
        .headers()
        .get("HX-Trigger")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert_eq!(trigger, "cart-updated");
}
