//! HTTP execution of compiled requests.
//!
//! A [`Connector`] owns the transport for one API host: base URL, default
//! headers, credentials and timeout. It turns a
//! [`RequestDescriptor`](crate::RequestDescriptor) into an HTTP call and
//! hands back the raw [`HttpResponse`]; status interpretation is left to the
//! [`Connection`](crate::Connection).

mod auth;
mod parse;

pub use auth::{Auth, AuthKind};
pub use parse::{parse_body, parse_xml, XML_ATTRIBUTE_PREFIX, XML_TEXT_KEY};

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};
use tracing::{instrument, Span};
use url::Url;

use crate::error::{ClientError, ConfigError, ElicitError, ParseError, ProviderError};
use crate::query::{is_empty_body, value_text, RequestDescriptor};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Body field holding a provider's error message unless configured.
pub const DEFAULT_RESPONSE_ERROR: &str = "error";

/// How write bodies are encoded on the wire.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    /// `application/json`.
    #[default]
    Json,
    /// `application/x-www-form-urlencoded`.
    Form,
}

/// A delivered HTTP response, before status interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub status: u16,
    /// The `Content-Type` header, when present.
    pub content_type: Option<String>,
    /// The raw response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parses the body according to its content type.
    pub fn parse(&self) -> Result<Value, ParseError> {
        parse_body(self.content_type.as_deref(), &self.body)
    }
}

/// Builder for configuring a [`Connector`].
#[derive(Debug)]
pub struct ConnectorBuilder {
    base_url: Url,
    timeout: Duration,
    default_headers: HeaderMap,
    auth: Auth,
    body_format: BodyFormat,
    response_error: String,
    response_code: Option<String>,
}

impl ConnectorBuilder {
    fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_headers: HeaderMap::new(),
            auth: Auth::None,
            body_format: BodyFormat::default(),
            response_error: DEFAULT_RESPONSE_ERROR.to_string(),
            response_code: None,
        }
    }

    /// Sets the connect and read timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a header sent with every request.
    ///
    /// ## Examples
    ///
    /// ```rust,ignore
    /// let connector = Connector::builder(base_url)
    ///     .default_header("Accept", "application/json")?
    ///     .build()?;
    /// ```
    ///
    /// ## Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidHeader {
            name: name.as_ref().to_string(),
            message,
        };
        let header_name = HeaderName::try_from(name.as_ref())
            .map_err(|e| invalid(format!("invalid header name: {e}")))?;
        let header_value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| invalid(format!("invalid header value: {e}")))?;
        self.default_headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Sets the credentials attached to every request.
    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    /// Sets the encoding of write bodies.
    pub fn body_format(mut self, format: BodyFormat) -> Self {
        self.body_format = format;
        self
    }

    /// Sets the body field that carries a provider error message.
    pub fn response_error(mut self, field: impl Into<String>) -> Self {
        self.response_error = field.into();
        self
    }

    /// Sets the body field that carries a provider error code.
    pub fn response_code(mut self, field: impl Into<String>) -> Self {
        self.response_code = Some(field.into());
        self
    }

    /// Builds the [`Connector`].
    ///
    /// ## Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<Connector, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .default_headers(self.default_headers)
            .build()?;

        Ok(Connector {
            client,
            base_url: self.base_url,
            timeout: self.timeout,
            auth: self.auth,
            body_format: self.body_format,
            response_error: self.response_error,
            response_code: self.response_code,
        })
    }
}

/// Async HTTP transport for one API host.
///
/// ## Examples
///
/// ```rust,ignore
/// use elicit::{Auth, Connector};
/// use url::Url;
///
/// let connector = Connector::builder(Url::parse("https://api.example.com")?)
///     .auth(Auth::bearer("sk-xxx"))
///     .build()?;
///
/// let response = connector.send(&request).await?;
/// println!("{} {}", response.status, response.text());
/// ```
#[derive(Debug, Clone)]
pub struct Connector {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    auth: Auth,
    body_format: BodyFormat,
    response_error: String,
    response_code: Option<String>,
}

impl Connector {
    /// Creates a new builder for a connector.
    pub fn builder(base_url: Url) -> ConnectorBuilder {
        ConnectorBuilder::new(base_url)
    }

    /// Creates a connector with default settings and no credentials.
    ///
    /// ## Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: Url) -> Result<Self, ConfigError> {
        Self::builder(base_url).build()
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the configured credentials.
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Returns the token of the configured credentials, if any.
    pub fn access_token(&self) -> Option<String> {
        self.auth.access_token()
    }

    /// Returns the write body encoding.
    pub fn body_format(&self) -> BodyFormat {
        self.body_format
    }

    /// Builds the absolute URL for a request.
    ///
    /// The base URL's trailing `/` and the path's leading `/` are trimmed
    /// and joined by a single `/`; the query-string follows a `?` when it
    /// is not empty.
    pub fn url_for(&self, request: &RequestDescriptor) -> Result<Url, ClientError> {
        let mut url = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            request.path.trim_start_matches('/')
        );
        if !request.query.is_empty() {
            url.push('?');
            url.push_str(&request.query);
        }

        Url::parse(&url).map_err(|source| ClientError::InvalidUrl { url, source })
    }

    /// Sends a request and returns the raw response.
    ///
    /// Failing HTTP statuses are returned, not raised; only transport
    /// failures and unusable credentials are errors here.
    ///
    /// ## Errors
    ///
    /// - [`ElicitError::Query`] when the URL is invalid or the transport fails
    /// - [`ElicitError::Auth`] when credentials cannot be put in a header
    #[instrument(
        name = "elicit_request",
        skip(self, request),
        fields(
            http.method = tracing::field::Empty,
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
            otel.kind = "client",
            otel.status_code = tracing::field::Empty,
        )
    )]
    pub async fn send(&self, request: &RequestDescriptor) -> Result<HttpResponse, ElicitError> {
        Span::current().record("http.method", request.method.to_string().as_str());
        let url = self
            .url_for(request)
            .map_err(|e| ElicitError::query(request, e))?;
        Span::current().record("http.url", url.as_str());

        let mut builder = self
            .client
            .request(request.method.to_reqwest(), url)
            .headers(self.auth.headers()?);

        if request.method.has_body() && !request.body.is_empty() {
            builder = match self.body_format {
                BodyFormat::Json => builder.json(&request.body),
                BodyFormat::Form => builder.form(&form_pairs(&request.body)),
            };
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ElicitError::query(request, ClientError::Request(e)))?;

        let status = response.status();
        Span::current().record("http.status_code", status.as_u16());
        let otel_status = if status.is_server_error() {
            "ERROR"
        } else if status.is_success() {
            "OK"
        } else {
            "UNSET"
        };
        Span::current().record("otel.status_code", otel_status);

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| ElicitError::query(request, ClientError::Request(e)))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }

    /// Checks a parsed body for an error reported by the provider.
    ///
    /// An object body whose error field holds a non-empty value is a
    /// provider error. The code is read from the code field when one is
    /// configured, and is `0` otherwise.
    pub fn check_response(&self, body: &Value) -> Result<(), ProviderError> {
        let Value::Object(fields) = body else {
            return Ok(());
        };
        let Some(error) = fields.get(&self.response_error) else {
            return Ok(());
        };
        if !reports_error(error) {
            return Ok(());
        }

        let message = match error {
            Value::Object(details) => details
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string()),
            other => value_text(other),
        };
        let code = self
            .response_code
            .as_deref()
            .and_then(|field| fields.get(field))
            .and_then(error_code)
            .unwrap_or(0);

        Err(ProviderError {
            message,
            code,
            body: body.clone(),
        })
    }
}

/// `false`, `0` and empty values do not report an error.
fn reports_error(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        other => !is_empty_body(other),
    }
}

fn error_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn form_pairs(body: &Map<String, Value>) -> Vec<(&str, String)> {
    body.iter()
        .map(|(key, value)| (key.as_str(), value_text(value)))
        .collect()
}
