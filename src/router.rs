//! Ordered-rule request dispatcher.
//!
//! Rules are tried in the order they were registered and the first rule whose
//! method and pattern both match wins. There is no specificity ranking, so
//! registration order matters: a literal `/users/summary` must be registered
//! before `/users/:id` or it will never be reached.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use tracing::debug;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::pattern::Pattern;
use crate::query;
use crate::request::Request;
use crate::response::Response;

struct Route {
    method: Method,
    pattern: Pattern,
    handler: BoxedHandler,
}

/// The result of a successful [`Router::dispatch`].
pub struct RouteMatch {
    handler: BoxedHandler,
    template: String,
    params: HashMap<String, String>,
    query: HashMap<String, String>,
}

impl RouteMatch {
    /// Template of the rule that matched, e.g. `/users/:id`.
    pub fn template(&self) -> &str { &self.template }
    pub fn params(&self) -> &HashMap<String, String> { &self.params }
    pub fn query(&self) -> &HashMap<String, String> { &self.query }
}

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve);
/// it is never modified afterwards. Each [`Router::on`] call returns `self`
/// so registrations chain naturally.
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Appends a rule. Returns `self` for chaining.
    ///
    /// Path parameters use `:name` syntax and are read back with
    /// `req.param("name")`:
    ///
    /// ```rust
    /// # use roster::{Method, Request, Response, Router, StatusCode};
    /// # async fn list(_: Request) -> Response { Response::text("") }
    /// # async fn remove(_: Request) -> StatusCode { StatusCode::NO_CONTENT }
    /// Router::new()
    ///     .on(Method::Get,    "/users",     list)
    ///     .on(Method::Delete, "/users/:id", remove);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `template` is not a valid route template.
    pub fn on(mut self, method: Method, template: &str, handler: impl Handler) -> Self {
        let pattern = Pattern::compile(template).unwrap_or_else(|e| panic!("{e}"));
        self.routes.push(Route { method, pattern, handler: handler.into_boxed_handler() });
        self
    }

    /// Finds the first rule matching `method` and `url` (path plus optional
    /// `?query`). `None` means no rule matched.
    pub fn dispatch(&self, method: Method, url: &str) -> Option<RouteMatch> {
        self.routes.iter()
            .filter(|route| route.method == method)
            .find_map(|route| {
                let caps = route.pattern.captures(url)?;
                Some(RouteMatch {
                    handler: Arc::clone(&route.handler),
                    template: route.pattern.template().to_owned(),
                    params: caps.params,
                    query: caps.query.as_deref().map(query::parse).unwrap_or_default(),
                })
            })
    }

    /// Routes one request and runs its handler. A routing miss yields
    /// `404 Not Found` with an empty body.
    pub async fn handle(
        &self,
        method: Method,
        url: &str,
        headers: Vec<(String, String)>,
        body: Bytes,
    ) -> Response {
        let Some(matched) = self.dispatch(method, url) else {
            debug!(%method, url, "no route matched");
            return Response::status(StatusCode::NOT_FOUND);
        };

        let req = Request::new(method, url.to_owned(), headers, body, matched.params, matched.query);
        matched.handler.call(req).await
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn named(req: Request) -> String {
        format!("{} {}", req.param("id").unwrap_or("-"), req.query("search").unwrap_or("-"))
    }

    async fn ok(_req: Request) -> &'static str { "ok" }

    fn users() -> Router {
        Router::new()
            .on(Method::Get, "/users", ok)
            .on(Method::Post, "/users", ok)
            .on(Method::Put, "/users/:id", named)
            .on(Method::Delete, "/users/:id", named)
    }

    #[test]
    fn unknown_path_is_no_match() {
        assert!(users().dispatch(Method::Get, "/unknown").is_none());
    }

    #[test]
    fn method_must_match_exactly() {
        let router = users();
        assert!(router.dispatch(Method::Get, "/users/1").is_none());
        assert!(router.dispatch(Method::Patch, "/users").is_none());
        assert_eq!(router.dispatch(Method::Put, "/users/1").unwrap().template(), "/users/:id");
    }

    #[test]
    fn extracts_params_and_query() {
        let m = users().dispatch(Method::Delete, "/users/abc-123?search=x").unwrap();
        assert_eq!(m.params()["id"], "abc-123");
        assert_eq!(m.query()["search"], "x");
    }

    #[test]
    fn query_less_url_has_empty_query() {
        let m = users().dispatch(Method::Get, "/users").unwrap();
        assert!(m.query().is_empty());
        assert!(m.params().is_empty());
    }

    #[test]
    fn first_registered_rule_wins() {
        let router = Router::new()
            .on(Method::Get, "/users/:id", ok)
            .on(Method::Get, "/users/summary", named);
        assert_eq!(router.dispatch(Method::Get, "/users/summary").unwrap().template(), "/users/:id");

        let router = Router::new()
            .on(Method::Get, "/users/summary", named)
            .on(Method::Get, "/users/:id", ok);
        assert_eq!(router.dispatch(Method::Get, "/users/summary").unwrap().template(), "/users/summary");
        assert_eq!(router.dispatch(Method::Get, "/users/7").unwrap().template(), "/users/:id");
    }

    #[test]
    #[should_panic(expected = "invalid route template")]
    fn invalid_template_panics() {
        let _ = Router::new().on(Method::Get, "users", ok);
    }

    #[tokio::test]
    async fn handle_invokes_handler_with_params() {
        let res = users().handle(Method::Put, "/users/42?search=an", Vec::new(), Bytes::new()).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"42 an");
    }

    #[tokio::test]
    async fn handle_miss_is_empty_404() {
        let res = users().handle(Method::Get, "/unknown", Vec::new(), Bytes::new()).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert!(res.body().is_empty());
    }
}
