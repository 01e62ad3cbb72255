// Service HTTP client
//
// Wraps `reqwest::Client` with ZeroTier-specific URL construction, auth
// header injection, and response classification. Endpoint modules
// (status, networks, peers) are implemented as inherent methods in
// separate files to keep this module focused on transport mechanics.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Loopback host the service binds to.
pub const SERVICE_HOST: &str = "127.0.0.1";
/// Default control port of the service.
pub const SERVICE_PORT: u16 = 9993;
/// Auth header the service expects on every authenticated request.
pub const AUTH_HEADER: &str = "X-ZT1-Auth";

/// Whether a 200 response with an empty JSON object body counts as an error.
///
/// A wrong-but-accepted credential makes some routes authenticate yet
/// return a blank record; routes where a blank record is impossible opt
/// into `Reject` to surface that pathology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyBody {
    Accept,
    Reject,
}

/// Raw HTTP client for the ZeroTier One local service API.
///
/// Issues exactly one request per call and classifies the raw response
/// into a single outcome (see [`Error`]). No retries -- retry policy
/// belongs to the caller, and the query layer deliberately has none
/// because polling already provides eventual consistency.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ServiceClient {
    /// Create a client against the default loopback service address.
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        let base_url = Url::parse(&format!("http://{SERVICE_HOST}:{SERVICE_PORT}"))?;
        Self::with_base_url(base_url, transport)
    }

    /// Create a client against an explicit base URL (tests, nonstandard ports).
    pub fn with_base_url(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The service base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL from route segments, e.g. `["network", id]`.
    pub(crate) fn route_url(&self, route: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
            segments.pop_if_empty();
            for segment in route {
                segments.push(segment);
            }
        }
        Ok(url)
    }

    // ── Request classification ───────────────────────────────────────

    /// Issue a single authenticated request and classify the outcome.
    ///
    /// The contract of spec'd behavior, in order:
    /// transport failure -> `ConnectionFailed`; 401 -> `Unauthorized`;
    /// 404 -> `NotFound`; other non-200 -> `UnexpectedStatus`; 200 with
    /// an empty object body -> `EmptyBody` (when `Reject`); otherwise the
    /// typed payload, with shape mismatches rejected as `Deserialization`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        route: &[&str],
        method: Method,
        token: Option<&SecretString>,
        empty_body: EmptyBody,
    ) -> Result<T, Error> {
        let route_str = route.join("/");
        let Some(token) = token else {
            return Err(Error::CredentialMissing {
                method: method.to_string(),
                route: route_str,
            });
        };

        let url = self.route_url(route)?;
        debug!("{method} {url}");

        let response = self
            .http
            .request(method.clone(), url)
            .header(AUTH_HEADER, token.expose_secret())
            .send()
            .await
            .map_err(|e| Error::ConnectionFailed {
                method: method.to_string(),
                route: route_str.clone(),
                reason: e.to_string(),
            })?;

        match response.status().as_u16() {
            200 => {}
            401 => {
                return Err(Error::Unauthorized {
                    method: method.to_string(),
                    route: route_str,
                });
            }
            404 => {
                return Err(Error::NotFound {
                    method: method.to_string(),
                    route: route_str,
                });
            }
            status => {
                return Err(Error::UnexpectedStatus {
                    status,
                    method: method.to_string(),
                    route: route_str,
                });
            }
        }

        // Parse to a generic value first so an empty `{}` can be detected
        // before the typed deserialization rejects it with a confusing
        // missing-field message.
        let value: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| Error::Deserialization {
                    method: method.to_string(),
                    route: route_str.clone(),
                    message: e.to_string(),
                })?;

        if empty_body == EmptyBody::Reject
            && value.as_object().is_some_and(serde_json::Map::is_empty)
        {
            return Err(Error::EmptyBody {
                method: method.to_string(),
                route: route_str,
            });
        }

        serde_json::from_value(value).map_err(|e| Error::Deserialization {
            method: method.to_string(),
            route: route_str,
            message: e.to_string(),
        })
    }
}
