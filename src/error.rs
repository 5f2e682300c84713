//! Unified error type.

/// The error type returned by roster's fallible operations.
///
/// Routing misses are not errors: they become a `404` [`Response`](crate::Response)
/// inside [`Router::handle`](crate::Router::handle). This type surfaces
/// infrastructure failures (binding, accepting, writing the store file) and
/// the request-level failures a handler may want to bubble up with `?`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// A route template could not be compiled.
    #[error("invalid route template `{template}`: {reason}")]
    Template { template: String, reason: String },

    /// The request body was not the JSON the handler expected.
    #[error("invalid request body: {0}")]
    Body(#[source] serde_json::Error),

    /// The store snapshot could not be serialized.
    #[error("store encode: {0}")]
    Encode(#[source] serde_json::Error),
}

impl Error {
    pub(crate) fn template(template: &str, reason: impl Into<String>) -> Self {
        Self::Template { template: template.to_owned(), reason: reason.into() }
    }
}
