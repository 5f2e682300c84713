//! Users CRUD endpoints backed by the [`Store`].
//!
//! | Method | Path         | Result |
//! |--------|--------------|--------|
//! | GET    | `/users`     | `200` JSON array; `?search=` filters by name or email |
//! | POST   | `/users`     | `201`, body `{"name", "email"}` |
//! | PUT    | `/users/:id` | `204`, body `{"name", "email"}`, replaces the user |
//! | DELETE | `/users/:id` | `204` |
//!
//! Bodies that are not a JSON object with string `name` and `email` are
//! rejected with `400`.

use std::future::Future;
use std::sync::Arc;

use http::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::Error;
use crate::method::Method;
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};
use crate::router::Router;
use crate::store::{Filter, Record, Store};

const TABLE: &str = "users";

#[derive(Deserialize)]
struct UserInput {
    name: String,
    email: String,
}

impl UserInput {
    fn into_record(self, id: Option<String>) -> Record {
        let mut record = Record::new();
        if let Some(id) = id {
            record.insert("id".to_owned(), Value::String(id));
        }
        record.insert("name".to_owned(), Value::String(self.name));
        record.insert("email".to_owned(), Value::String(self.email));
        record
    }
}

/// Builds the users router over `store`.
pub fn routes(store: Arc<Store>) -> Router {
    Router::new()
        .on(Method::Get,    "/users",     with_store(Arc::clone(&store), list))
        .on(Method::Post,   "/users",     with_store(Arc::clone(&store), create))
        .on(Method::Put,    "/users/:id", with_store(Arc::clone(&store), update))
        .on(Method::Delete, "/users/:id", with_store(Arc::clone(&store), remove))
}

/// Adapts a handler that takes the store into a plain `Fn(Request)` handler.
fn with_store<F, Fut>(store: Arc<Store>, f: F) -> impl Fn(Request) -> Fut + Send + Sync + 'static
where
    F: Fn(Arc<Store>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    move |req| f(Arc::clone(&store), req)
}

async fn list(store: Arc<Store>, req: Request) -> Response {
    let filter: Option<Filter> = req.query("search")
        .filter(|s| !s.is_empty())
        .map(|s| [("name".to_owned(), s.to_owned()), ("email".to_owned(), s.to_owned())].into());

    Json(store.select(TABLE, filter.as_ref())).into_response()
}

async fn create(store: Arc<Store>, req: Request) -> Response {
    let result: Result<StatusCode, Error> = async {
        let input: UserInput = req.json()?;
        let record = input.into_record(Some(Uuid::new_v4().to_string()));
        store.insert(TABLE, record).await?;
        Ok(StatusCode::CREATED)
    }
    .await;
    result.into_response()
}

async fn update(store: Arc<Store>, req: Request) -> Response {
    let Some(id) = req.param("id") else {
        return Response::status(StatusCode::NOT_FOUND);
    };
    let result: Result<StatusCode, Error> = async {
        let input: UserInput = req.json()?;
        store.update(TABLE, id, input.into_record(None)).await?;
        Ok(StatusCode::NO_CONTENT)
    }
    .await;
    result.into_response()
}

async fn remove(store: Arc<Store>, req: Request) -> Response {
    let Some(id) = req.param("id") else {
        return Response::status(StatusCode::NOT_FOUND);
    };
    store.delete(TABLE, id)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .into_response()
}
