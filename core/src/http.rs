//! Requests and responses exchanged between `TodoClient` and its caller.
//!
//! `TodoClient::build_*` returns an `HttpRequest` with an absolute URL and,
//! for create and update, a JSON body. The caller sends it with whatever
//! HTTP stack it has and hands the status and body back as an
//! `HttpResponse` for `TodoClient::parse_*` to unwrap from the envelope.

/// Verbs used by the todo routes. `Patch` is only used by toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Base URL, `/api/v1` prefix, route and encoded query string.
    pub path: String,
    /// `Content-Type: application/json` when `body` is set, otherwise empty.
    pub headers: Vec<(String, String)>,
    /// Serialized `CreateTodo` or `UpdateTodo`.
    pub body: Option<String>,
}

/// What the caller received. Headers are not inspected by the parsers.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Raw JSON envelope.
    pub body: String,
}
