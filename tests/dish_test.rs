mod common;

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use common::{TestApp, spawn_app};

async fn create_dish(app: &TestApp, token: &str, menu_id: i64, body: Value) -> i64 {
    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/menus/{}/dishes", menu_id),
            Some(token),
            Some(body),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create dish failed: {}", body);
    assert_eq!(body["message"], "Dish created");
    body["id"].as_i64().unwrap()
}

fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn dish_is_created_with_attributes() {
    let app = spawn_app().await;
    let (_, token) = app.signup("alice", "secret123").await;
    let menu_id = app.create_menu(&token, "Dinner").await;

    create_dish(
        &app,
        &token,
        menu_id,
        json!({
            "name": "Tiramisu",
            "section": "Dessert",
            "sweet": 8,
            "bitter": 3,
            "color1": "brown",
            "color2": "",
            "color3": "white",
            "emotion_ids": [1, 2, 999],
            "texture_ids": [2],
        }),
    )
    .await;

    let (status, dishes) = app
        .request(
            Method::GET,
            &format!("/api/menus/{}/dishes", menu_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let dish = &dishes[0];
    assert_eq!(dish["name"], "Tiramisu");
    assert_eq!(dish["description"], "");
    assert_eq!(dish["section"], "Dessert");
    assert_eq!(dish["sweet"], 8);
    assert_eq!(dish["umami"], Value::Null);
    assert_eq!(dish["colors"], json!(["brown", "white"]));
    assert_eq!(ids(&dish["emotions"]), vec![1, 2]);
    assert_eq!(dish["emotions"][0]["description"], "happy");
    assert_eq!(ids(&dish["textures"]), vec![2]);
    assert!(dish["shapes"].as_array().unwrap().is_empty());

    let (_, menus) = app.request(Method::GET, "/api/menus", Some(&token), None).await;
    assert_eq!(menus[0]["dish_count"], 1);
}

#[tokio::test]
async fn update_touches_only_present_keys() {
    let app = spawn_app().await;
    let (_, token) = app.signup("alice", "secret123").await;
    let menu_id = app.create_menu(&token, "Dinner").await;
    let dish_id = create_dish(
        &app,
        &token,
        menu_id,
        json!({
            "name": "Soup",
            "salty": 4,
            "sweet": 2,
            "color1": "red",
            "emotion_ids": [1, 2],
            "shape_ids": [1],
        }),
    )
    .await;

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/dishes/{}", dish_id),
            Some(&token),
            Some(json!({ "name": "Broth", "sweet": null, "emotion_ids": [3] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Dish updated");

    let (_, menu) = app
        .request(Method::GET, &format!("/api/menus/{}", menu_id), Some(&token), None)
        .await;
    let dish = &menu["dishes"][0];
    assert_eq!(dish["name"], "Broth");
    assert_eq!(dish["salty"], 4);
    assert_eq!(dish["sweet"], Value::Null);
    assert_eq!(dish["colors"], json!(["red"]));
    assert_eq!(ids(&dish["emotions"]), vec![3]);
    assert_eq!(ids(&dish["shapes"]), vec![1]);
}

#[tokio::test]
async fn negative_intensities_are_rejected() {
    let app = spawn_app().await;
    let (_, token) = app.signup("alice", "secret123").await;
    let menu_id = app.create_menu(&token, "Dinner").await;

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/menus/{}/dishes", menu_id),
            Some(&token),
            Some(json!({ "name": "Ice", "temperature": -5 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 1000);

    let (status, _) = app
        .request(
            Method::POST,
            &format!("/api/menus/{}/dishes", menu_id),
            Some(&token),
            Some(json!({ "name": "Hot pot", "piquant": 250 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn dishes_follow_menu_ownership() {
    let app = spawn_app().await;
    let (_, alice) = app.signup("alice", "secret123").await;
    let (_, bob) = app.signup("bob", "secret456").await;
    let menu_id = app.create_menu(&alice, "Dinner").await;
    let dish_id = create_dish(&app, &alice, menu_id, json!({ "name": "Soup" })).await;
    let uri = format!("/api/dishes/{}", dish_id);

    let (status, _) = app
        .request(Method::PUT, &uri, Some(&bob), Some(json!({ "name": "Mine" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.request(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request(Method::DELETE, "/api/dishes/999", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Dish not found");

    let (status, body) = app.request(Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Dish deleted");
    assert_eq!(app.count("dishes").await, 0);
}

#[tokio::test]
async fn deleting_a_menu_removes_dishes_and_associations() {
    let app = spawn_app().await;
    let (_, token) = app.signup("alice", "secret123").await;
    let menu_id = app.create_menu(&token, "Dinner").await;
    for name in ["Soup", "Steak"] {
        create_dish(
            &app,
            &token,
            menu_id,
            json!({ "name": name, "emotion_ids": [1], "texture_ids": [1, 2], "shape_ids": [3] }),
        )
        .await;
    }
    assert_eq!(app.count("texture_dish").await, 4);

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/menus/{}", menu_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    for table in ["dishes", "emotion_dish", "texture_dish", "shape_dish"] {
        assert_eq!(app.count(table).await, 0, "{} not empty", table);
    }
    assert_eq!(app.count("emotions").await, 9);
}

#[tokio::test]
async fn attribute_vocabularies_are_listed() {
    let app = spawn_app().await;
    let (_, token) = app.signup("alice", "secret123").await;

    for (uri, expected) in [
        ("/api/emotions", 9),
        ("/api/textures", 10),
        ("/api/shapes", 9),
    ] {
        let (status, list) = app.request(Method::GET, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), expected);
    }

    let (_, emotions) = app
        .request(Method::GET, "/api/emotions", Some(&token), None)
        .await;
    assert_eq!(emotions[0], json!({ "id": 1, "description": "happy" }));

    let (status, _) = app.request(Method::GET, "/api/shapes", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
