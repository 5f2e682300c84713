use std::sync::Arc;

use bytes::Bytes;
use roster::{users, Method, Router, StatusCode, Store};
use serde_json::{json, Value};

struct App {
    _dir: tempfile::TempDir,
    store: Arc<Store>,
    router: Router,
}

async fn app() -> App {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(Store::open(dir.path().join("db.json")).await);
    let router = users::routes(Arc::clone(&store));
    App { _dir: dir, store, router }
}

impl App {
    async fn call(&self, method: Method, url: &str, body: Value) -> (StatusCode, Vec<u8>) {
        let body = if body.is_null() { Bytes::new() } else { Bytes::from(body.to_string()) };
        let res = self.router.handle(method, url, Vec::new(), body).await;
        (res.status_code(), res.body().to_vec())
    }

    async fn list(&self, url: &str) -> Vec<Value> {
        let (status, body) = self.call(Method::Get, url, Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&body).unwrap()
    }
}

#[tokio::test]
async fn create_then_search() {
    let app = app().await;

    let (status, body) = app.call(Method::Post, "/users", json!({"name": "Ana", "email": "ana@x.com"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.is_empty());
    app.call(Method::Post, "/users", json!({"name": "Bob", "email": "bob@y.org"})).await;

    let all = app.list("/users").await;
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|u| u["id"].as_str().is_some_and(|id| !id.is_empty())));

    let hits = app.list("/users?search=AN").await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["name"], "Ana");
    assert_eq!(hits[0]["email"], "ana@x.com");

    let by_email = app.list("/users?search=y.org").await;
    assert_eq!(by_email.len(), 1);
    assert_eq!(by_email[0]["name"], "Bob");

    assert_eq!(app.list("/users?search=").await.len(), 2);
}

#[tokio::test]
async fn update_replaces_user() {
    let app = app().await;
    app.call(Method::Post, "/users", json!({"name": "Ana", "email": "a@x"})).await;
    let id = app.list("/users").await[0]["id"].as_str().unwrap().to_owned();

    let (status, _) = app.call(Method::Put, &format!("/users/{id}"), json!({"name": "Bia", "email": "b@x"})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert_eq!(app.list("/users").await, vec![json!({"id": id, "name": "Bia", "email": "b@x"})]);
}

#[tokio::test]
async fn update_unknown_user_is_still_no_content() {
    let app = app().await;
    let (status, _) = app.call(Method::Put, "/users/nope", json!({"name": "X", "email": "x"})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(app.list("/users").await.is_empty());
}

#[tokio::test]
async fn delete_twice() {
    let app = app().await;
    app.call(Method::Post, "/users", json!({"name": "Ana", "email": "a@x"})).await;
    let id = app.list("/users").await[0]["id"].as_str().unwrap().to_owned();

    for _ in 0..2 {
        let (status, _) = app.call(Method::Delete, &format!("/users/{id}"), Value::Null).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(app.list("/users").await.is_empty());
    }
}

#[tokio::test]
async fn bad_bodies_are_rejected() {
    let app = app().await;

    let (status, _) = app.call(Method::Post, "/users", Value::Null).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.call(Method::Post, "/users", json!({"name": "Ana"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.call(Method::Put, "/users/1", json!(["Ana"])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.store.select("users", None).is_empty());
}

#[tokio::test]
async fn unknown_routes_are_empty_404() {
    let app = app().await;
    for (method, url) in [
        (Method::Get, "/unknown"),
        (Method::Get, "/users/1"),
        (Method::Patch, "/users/1"),
        (Method::Delete, "/users"),
        (Method::Get, "/users/"),
    ] {
        let (status, body) = app.call(method, url, Value::Null).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {url}");
        assert!(body.is_empty());
    }
}

#[tokio::test]
async fn data_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    {
        let router = users::routes(Arc::new(Store::open(&path).await));
        let body = Bytes::from(json!({"name": "Ana", "email": "a@x"}).to_string());
        router.handle(Method::Post, "/users", Vec::new(), body).await;
    }

    let on_disk: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(on_disk["users"][0]["name"], "Ana");

    let store = Store::open(&path).await;
    assert_eq!(store.select("users", None).len(), 1);
}

#[tokio::test]
async fn users_keep_field_order() {
    let app = app().await;
    app.call(Method::Post, "/users", json!({"name": "Ana", "email": "a@x"})).await;

    let (_, body) = app.call(Method::Get, "/users", Value::Null).await;
    let body = String::from_utf8(body).unwrap();
    assert!(body.starts_with(r#"[{"id":""#), "{body}");
    assert!(body.ends_with(r#"","name":"Ana","email":"a@x"}]"#), "{body}");
}
