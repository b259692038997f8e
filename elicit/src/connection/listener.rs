//! Query events and listeners.

use std::error::Error;

use crate::query::RequestDescriptor;

/// Boxed error a listener may return.
pub type ListenerError = Box<dyn Error + Send + Sync>;

/// A record of one executed request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryEvent {
    /// Name of the connection that ran the request.
    pub connection: String,
    /// The compiled request.
    pub request: RequestDescriptor,
    /// Wall time of the HTTP round trip in milliseconds.
    pub elapsed_ms: f64,
    /// The HTTP status, `None` when the transport failed.
    pub status: Option<u16>,
}

/// Observer notified after every request a connection runs.
///
/// A failing listener never fails the request; the error is logged and
/// dropped. Closures with the right signature are listeners too.
///
/// ## Examples
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use elicit::connection::ListenerError;
/// use elicit::{QueryEvent, QueryListener};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// let listener = move |event: &QueryEvent| -> Result<(), ListenerError> {
///     sink.lock().unwrap().push(event.request.path.clone());
///     Ok(())
/// };
/// let listener: Arc<dyn QueryListener> = Arc::new(listener);
/// ```
pub trait QueryListener: Send + Sync {
    /// Called once per executed request.
    fn on_query(&self, event: &QueryEvent) -> Result<(), ListenerError>;
}

impl<F> QueryListener for F
where
    F: Fn(&QueryEvent) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_query(&self, event: &QueryEvent) -> Result<(), ListenerError> {
        self(event)
    }
}
