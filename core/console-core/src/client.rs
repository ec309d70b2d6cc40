//! API client with the response interceptor.
//!
//! Every outgoing request gets the stored bearer token (read at send time,
//! never cached). A 401 on a request that carried a token clears the session
//! and hard-redirects to the login route, at most once per redirect-guard
//! lifetime, no matter how many requests fail concurrently.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use blog_console_protocol::ApiErrorBody;

use crate::error::{ConsoleError, Result};
use crate::navigation::{Navigator, Route};
use crate::session::SessionPort;
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

const UNAUTHORIZED: u16 = 401;

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionPort>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionPort>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            transport,
            session,
            navigator,
        }
    }

    /// Sends a request and returns the successful response.
    ///
    /// Non-2xx statuses become errors: `Unauthorized` for 401, `Http` with
    /// the server's message otherwise.
    pub fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.dispatch(request, true)
    }

    /// Like [`send`](Self::send), but a 401 is only reported: the session is
    /// left alone and no redirect happens. Used by explicit logout.
    pub fn send_without_expiry(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.dispatch(request, false)
    }

    fn dispatch(&self, mut request: HttpRequest, expire_on_401: bool) -> Result<HttpResponse> {
        let token = self.session.current_token();
        if let Some(token) = token.as_deref() {
            request.set_header("Authorization", format!("Bearer {}", token));
        }
        debug!(
            method = %request.method,
            path = %request.path,
            token_present = token.is_some(),
            "Sending API request"
        );

        let response = self.transport.execute(&request)?;
        if response.is_success() {
            return Ok(response);
        }

        if response.status == UNAUTHORIZED {
            if token.is_none() {
                debug!(path = %request.path, "401 on a request without credentials");
            } else if expire_on_401 {
                self.handle_unauthorized(&request.path);
            } else {
                debug!(path = %request.path, "401 ignored by caller");
            }
            return Err(ConsoleError::Unauthorized { path: request.path });
        }

        let message = ApiErrorBody::parse_message(&response.body)
            .unwrap_or_else(|| format!("HTTP {}", response.status));
        warn!(
            method = %request.method,
            path = %request.path,
            status = response.status,
            "API request failed"
        );
        Err(ConsoleError::Http {
            path: request.path,
            status: response.status,
            message,
        })
    }

    fn handle_unauthorized(&self, path: &str) {
        if !self.session.begin_redirect() {
            debug!(path, "Redirect to login already in progress");
            return;
        }
        info!(path, "Credentials rejected; clearing session");
        self.session.clear_session();
        self.navigator.hard_redirect(&Route::Login);
    }

    pub fn request_json<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T> {
        let path = request.path.clone();
        let response = self.send(request)?;
        decode(&path, &response.body)
    }

    pub fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request_json(HttpRequest::new(Method::Get, path))
    }

    pub fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.request_json(HttpRequest::new(Method::Post, path).with_json(to_value(path, body)?))
    }

    pub fn put_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        self.request_json(HttpRequest::new(Method::Put, path).with_json(to_value(path, body)?))
    }

    pub fn delete(&self, path: &str) -> Result<()> {
        self.send(HttpRequest::new(Method::Delete, path)).map(|_| ())
    }
}

fn to_value<B: Serialize>(path: &str, body: &B) -> Result<serde_json::Value> {
    serde_json::to_value(body).map_err(|source| ConsoleError::Decode {
        context: format!("encoding request body for {}", path),
        source,
    })
}

fn decode<T: DeserializeOwned>(path: &str, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|source| ConsoleError::Decode {
        context: format!("response from {}", path),
        source,
    })
}
