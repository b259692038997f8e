//! Named connections: one connector plus its grammar and processor.

mod listener;

pub use listener::{ListenerError, QueryEvent, QueryListener};

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Driver;
use crate::connector::{AuthKind, Connector};
use crate::error::{AuthError, ClientError, ElicitError};
use crate::query::{Builder, Grammar, Processor, RequestDescriptor};

/// A named API connection.
///
/// A connection runs compiled requests through its [`Connector`] and maps
/// HTTP statuses onto results:
///
/// | Status | Result |
/// |---|---|
/// | 401 | [`AuthError::InvalidCredentials`] naming this connection |
/// | 404 | an empty list |
/// | other 4xx, 5xx | [`ElicitError::Provider`] when the body reports one, else [`ElicitError::Query`] |
/// | anything else | the parsed body, after the provider error check |
///
/// Every request is reported as a [`QueryEvent`] to the tracing log, to the
/// optional [`QueryListener`] and, when enabled, to the in-memory query log.
///
/// ## Examples
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use elicit::{Connection, Connector, RestMethod, Target};
///
/// let connector = Connector::new(url::Url::parse("https://api.example.com")?)?;
/// let connection = Arc::new(Connection::new("shop", connector));
///
/// let widgets = connection
///     .query()
///     .from(Target::new(RestMethod::Get, "/widgets"))
///     .get()
///     .await?;
/// ```
pub struct Connection {
    name: String,
    driver: Driver,
    connector: Connector,
    grammar: Grammar,
    processor: Processor,
    listener: Option<Arc<dyn QueryListener>>,
    logging_queries: AtomicBool,
    query_log: Mutex<Vec<QueryEvent>>,
}

impl Connection {
    /// Creates a connection speaking the generic dialect.
    pub fn new(name: impl Into<String>, connector: Connector) -> Self {
        let driver = Driver::default();
        Self {
            name: name.into(),
            driver,
            connector,
            grammar: Grammar,
            processor: Processor::new(driver.dialect()),
            listener: None,
            logging_queries: AtomicBool::new(false),
            query_log: Mutex::new(Vec::new()),
        }
    }

    /// Sets the driver and the matching default processor.
    pub fn with_driver(mut self, driver: Driver) -> Self {
        self.driver = driver;
        self.processor = Processor::new(driver.dialect());
        self
    }

    /// Replaces the response processor.
    pub fn with_processor(mut self, processor: Processor) -> Self {
        self.processor = processor;
        self
    }

    /// Sets the listener notified after every request.
    pub fn with_listener(mut self, listener: Arc<dyn QueryListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Returns the connection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the driver.
    pub fn driver(&self) -> Driver {
        self.driver
    }

    /// Returns the authentication scheme of the connector.
    pub fn auth_kind(&self) -> AuthKind {
        self.connector.auth().kind()
    }

    /// Returns the connector.
    pub fn connector(&self) -> &Connector {
        &self.connector
    }

    /// Returns the query grammar.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Returns the response processor.
    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    /// Starts a new query on this connection.
    pub fn query(self: &Arc<Self>) -> Builder {
        Builder::new(Arc::clone(self))
    }

    /// Runs a compiled request and returns the parsed body.
    ///
    /// A 404 yields an empty list so lookups can report absence instead of
    /// failing.
    ///
    /// ## Errors
    ///
    /// - [`ElicitError::Auth`] for a 401
    /// - [`ElicitError::Provider`] when the body reports an error, whatever
    ///   the status
    /// - [`ElicitError::Query`] for other failing statuses and transport errors
    /// - [`ElicitError::Parse`] when a declared JSON or XML success body is
    ///   malformed
    pub async fn request(&self, request: &RequestDescriptor) -> Result<Value, ElicitError> {
        let start = Instant::now();
        let outcome = self.connector.send(request).await;

        self.log_query(QueryEvent {
            connection: self.name.clone(),
            request: request.clone(),
            elapsed_ms: elapsed_ms(start),
            status: outcome.as_ref().ok().map(|response| response.status),
        });

        let response = outcome?;
        match response.status {
            401 => Err(AuthError::InvalidCredentials {
                connection: self.name.clone(),
            }
            .into()),
            404 => Ok(Value::Array(Vec::new())),
            status if status >= 400 => {
                if let Ok(body) = response.parse() {
                    self.connector.check_response(&body)?;
                }

                let text = response.text();
                let message = if text.trim().is_empty() {
                    reqwest::StatusCode::from_u16(status)
                        .map(|code| code.to_string())
                        .unwrap_or_else(|_| status.to_string())
                } else {
                    text
                };
                Err(ElicitError::query(
                    request,
                    ClientError::HttpStatus { status, message },
                ))
            }
            _ => {
                let body = response.parse()?;
                self.connector.check_response(&body)?;
                Ok(body)
            }
        }
    }

    /// Starts recording executed requests in memory.
    pub fn enable_query_log(&self) {
        self.logging_queries.store(true, Ordering::Relaxed);
    }

    /// Stops recording executed requests.
    pub fn disable_query_log(&self) {
        self.logging_queries.store(false, Ordering::Relaxed);
    }

    /// Returns `true` while requests are being recorded.
    pub fn logging_queries(&self) -> bool {
        self.logging_queries.load(Ordering::Relaxed)
    }

    /// Returns the recorded requests, oldest first.
    pub fn query_log(&self) -> Vec<QueryEvent> {
        self.query_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Clears the recorded requests.
    pub fn flush_query_log(&self) {
        self.query_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn log_query(&self, event: QueryEvent) {
        debug!(
            connection = %event.connection,
            method = %event.request.method,
            path = %event.request.path,
            elapsed_ms = event.elapsed_ms,
            status = ?event.status,
            "query executed"
        );

        if let Some(listener) = &self.listener {
            match panic::catch_unwind(AssertUnwindSafe(|| listener.on_query(&event))) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    warn!(connection = %self.name, %error, "query listener failed");
                }
                Err(payload) => {
                    let reason = if let Some(s) = payload.downcast_ref::<String>() {
                        s.clone()
                    } else if let Some(s) = payload.downcast_ref::<&str>() {
                        s.to_string()
                    } else {
                        "unknown panic".to_string()
                    };
                    warn!(connection = %self.name, %reason, "query listener panicked");
                }
            }
        }

        if self.logging_queries() {
            self.query_log
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event);
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("driver", &self.driver)
            .field("connector", &self.connector)
            .field("processor", &self.processor)
            .field("listener", &self.listener.is_some())
            .field("logging_queries", &self.logging_queries())
            .finish_non_exhaustive()
    }
}

/// Milliseconds since `start`, rounded to two decimals.
fn elapsed_ms(start: Instant) -> f64 {
    (start.elapsed().as_secs_f64() * 100_000.0).round() / 100.0
}
