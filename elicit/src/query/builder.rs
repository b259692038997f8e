//! Fluent query accumulation and terminal operations.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::dynamic::parse_dynamic_filter;
use super::grammar::RequestDescriptor;
use super::state::{QueryState, Target};
use crate::connection::Connection;
use crate::error::{CompileError, ElicitError, ParseError};

/// Primary key used by [`Builder::find`] unless overridden.
const DEFAULT_KEY_NAME: &str = "id";

/// A fluent query bound to one [`Connection`].
///
/// Every accumulating call consumes the builder and returns it, so queries
/// read as a chain. Terminal operations compile the accumulated
/// [`QueryState`] with the connection's [`Grammar`](super::Grammar), run it
/// and normalize the result with the connection's
/// [`Processor`](super::Processor).
///
/// ## Examples
///
/// ```rust,ignore
/// use elicit::{RestMethod, Target};
///
/// let widgets = connection
///     .query()
///     .from(Target::new(RestMethod::Get, "/shops/{shop}/widgets"))
///     .filter("shop", "north")
///     .filter("color", "red")
///     .get()
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    connection: Arc<Connection>,
    state: QueryState,
    key_name: String,
}

impl Builder {
    /// Creates an empty builder for a connection.
    pub fn new(connection: Arc<Connection>) -> Self {
        Self {
            connection,
            state: QueryState::new(),
            key_name: DEFAULT_KEY_NAME.to_string(),
        }
    }

    /// Creates a fresh builder on the same connection with an empty state.
    pub fn new_query(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
            state: QueryState::new(),
            key_name: self.key_name.clone(),
        }
    }

    /// Sets the method and path template the query runs against.
    pub fn from(mut self, target: Target) -> Self {
        self.state.target = Some(target);
        self
    }

    /// Adds a filter.
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.state.push_filter(key, value);
        self
    }

    /// Adds every pair as its own filter, in order.
    pub fn filters<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.filter_nested(|query| {
            pairs
                .into_iter()
                .fold(query, |query, (key, value)| query.filter(key, value))
        })
    }

    /// Builds filters on a disposable child query and merges them in.
    ///
    /// Only the child's filters are merged; its target and body are dropped.
    ///
    /// ## Examples
    ///
    /// ```rust,ignore
    /// let query = connection
    ///     .query()
    ///     .filter("a", 1)
    ///     .filter_nested(|q| q.filter("b", 2).filter("c", 3));
    /// ```
    pub fn filter_nested<F>(mut self, build: F) -> Self
    where
        F: FnOnce(Builder) -> Builder,
    {
        let child = build(self.new_query());
        self.state.merge_filters(child.state);
        self
    }

    /// Adds filters named by a dynamic `where<Field>[And<Field>...]` method.
    ///
    /// `dynamic_filter("whereShopIdAndStatus", ["north", "active"])` adds the
    /// filters `shop_id=north` and `status=active`.
    ///
    /// ## Errors
    ///
    /// - [`CompileError::UnsupportedMethod`] when `method` is not a `where`
    ///   pattern
    /// - [`CompileError::DynamicArity`] when the number of values differs
    ///   from the number of fields
    pub fn dynamic_filter<I, V>(mut self, method: &str, values: I) -> Result<Self, CompileError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let fields = parse_dynamic_filter(std::any::type_name::<Self>(), method)?;
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();

        if values.len() != fields.len() {
            return Err(CompileError::DynamicArity {
                method: method.to_string(),
                expected: fields.len(),
                given: values.len(),
            });
        }

        for (field, value) in fields.into_iter().zip(values) {
            self.state.push_filter(field, value);
        }
        Ok(self)
    }

    /// Adds a body field for write requests.
    pub fn post_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.state.push_body(key, value);
        self
    }

    /// Adds every pair as its own body field, in order.
    pub fn post_fields<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.post_field_nested(|query| {
            pairs
                .into_iter()
                .fold(query, |query, (key, value)| query.post_field(key, value))
        })
    }

    /// Builds body fields on a disposable child query and merges them in.
    pub fn post_field_nested<F>(mut self, build: F) -> Self
    where
        F: FnOnce(Builder) -> Builder,
    {
        let child = build(self.new_query());
        self.state.merge_body(child.state);
        self
    }

    /// Sets the primary key field used by [`find`](Self::find).
    pub fn with_key_name(mut self, key_name: impl Into<String>) -> Self {
        self.key_name = key_name.into();
        self
    }

    /// Returns the primary key field name.
    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// Returns the accumulated state.
    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Returns the connection this query runs on.
    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Compiles the query without running it.
    pub fn to_request(&self) -> Result<RequestDescriptor, CompileError> {
        self.connection.grammar().compile_request(&self.state)
    }

    /// Runs the query and returns every record.
    ///
    /// A 404 response yields an empty list.
    pub async fn get(self) -> Result<Vec<Value>, ElicitError> {
        let body = self.run().await?;
        Ok(self.connection.processor().process_index(body))
    }

    /// Runs the query and returns the first record, if any.
    pub async fn first(self) -> Result<Option<Value>, ElicitError> {
        let body = self.run().await?;
        Ok(self
            .connection
            .processor()
            .process_show(body)
            .into_iter()
            .next())
    }

    /// Filters on the primary key and returns the matching record, if any.
    pub async fn find(self, id: impl Into<Value>) -> Result<Option<Value>, ElicitError> {
        let key_name = self.key_name.clone();
        self.filter(key_name, id).first().await
    }

    /// Runs a create request and returns the created record.
    pub async fn create(self) -> Result<Value, ElicitError> {
        let body = self.run().await?;
        Ok(self.connection.processor().process_create(body))
    }

    /// Runs an update request and returns the updated record.
    pub async fn update(self) -> Result<Value, ElicitError> {
        let body = self.run().await?;
        Ok(self.connection.processor().process_update(body))
    }

    /// Runs a delete request and reports whether it succeeded.
    pub async fn delete(self) -> Result<bool, ElicitError> {
        let body = self.run().await?;
        Ok(self.connection.processor().process_delete(&body))
    }

    /// Like [`get`](Self::get), deserializing each record into `T`.
    pub async fn get_as<T: DeserializeOwned>(self) -> Result<Vec<T>, ElicitError> {
        self.get()
            .await?
            .into_iter()
            .map(hydrate::<T>)
            .collect::<Result<_, _>>()
            .map_err(ElicitError::from)
    }

    /// Like [`first`](Self::first), deserializing the record into `T`.
    pub async fn first_as<T: DeserializeOwned>(self) -> Result<Option<T>, ElicitError> {
        match self.first().await? {
            Some(record) => Ok(Some(hydrate(record)?)),
            None => Ok(None),
        }
    }

    async fn run(&self) -> Result<Value, ElicitError> {
        let request = self.to_request()?;
        self.connection.request(&request).await
    }
}

fn hydrate<T: DeserializeOwned>(record: Value) -> Result<T, ParseError> {
    serde_json::from_value(record).map_err(|source| ParseError::Hydrate {
        target: std::any::type_name::<T>(),
        source,
    })
}
