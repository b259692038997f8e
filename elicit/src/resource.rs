//! Resources: named remote collections with a path per action.
//!
//! A [`Resource`] plays the role a model class plays in a database ORM. It
//! knows which connection serves it, which field is its primary key and
//! which [`Target`] each [`Action`] runs against.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::connection::Connection;
use crate::error::{CompileError, ElicitError};
use crate::method::RestMethod;
use crate::query::{value_text, Builder, Target};
use crate::registry::ConnectionRegistry;

/// The operations a resource exposes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Action {
    /// List records.
    Index,
    /// Fetch one record.
    Show,
    /// Create a record.
    Store,
    /// Update a record.
    Update,
    /// Delete a record.
    Destroy,
    /// Ask which methods are supported.
    Options,
}

impl Action {
    /// Returns the method an action uses unless configured otherwise.
    pub fn default_method(&self) -> RestMethod {
        match self {
            Self::Index | Self::Show => RestMethod::Get,
            Self::Store => RestMethod::Post,
            Self::Update => RestMethod::Put,
            Self::Destroy => RestMethod::Delete,
            Self::Options => RestMethod::Options,
        }
    }
}

/// A partial target: either half may be left to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionPath {
    /// Path template.
    pub path: Option<String>,
    /// HTTP method.
    pub method: Option<RestMethod>,
}

impl ActionPath {
    /// An entry that sets only the path.
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            method: None,
        }
    }

    /// An entry that sets path and method.
    pub fn new(path: impl Into<String>, method: RestMethod) -> Self {
        Self {
            path: Some(path.into()),
            method: Some(method),
        }
    }

    /// Overlays `other` on `self`; fields set in `other` win.
    fn merge(&self, other: &ActionPath) -> ActionPath {
        ActionPath {
            path: other.path.clone().or_else(|| self.path.clone()),
            method: other.method.or(self.method),
        }
    }
}

/// Per-action targets of a resource.
///
/// The target for an action is merged from three layers, later layers
/// winning field by field:
///
/// 1. the catch-all entry (`*`), typically the shared path
/// 2. the built-in default, which sets the method
/// 3. the override for that action
///
/// An action has a target only when both a path and a method result.
///
/// ## Examples
///
/// ```rust
/// use elicit::{Action, PathMap, RestMethod};
/// use elicit::resource::ActionPath;
///
/// let paths = PathMap::new()
///     .catch_all(ActionPath::path("/widgets/{id?}"))
///     .set(Action::Update, ActionPath::new("/widgets/{id}", RestMethod::Patch));
///
/// let show = paths.target(Action::Show).unwrap();
/// assert_eq!(show.method, RestMethod::Get);
/// assert_eq!(show.path, "/widgets/{id?}");
///
/// let update = paths.target(Action::Update).unwrap();
/// assert_eq!(update.method, RestMethod::Patch);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMap {
    defaults: HashMap<Action, ActionPath>,
    catch_all: Option<ActionPath>,
    paths: HashMap<Action, ActionPath>,
}

impl Default for PathMap {
    fn default() -> Self {
        Self::new()
    }
}

impl PathMap {
    /// Creates a map holding only the built-in method defaults.
    pub fn new() -> Self {
        let defaults = Action::iter()
            .map(|action| {
                let entry = ActionPath {
                    path: None,
                    method: Some(action.default_method()),
                };
                (action, entry)
            })
            .collect();

        Self {
            defaults,
            catch_all: None,
            paths: HashMap::new(),
        }
    }

    /// Sets the catch-all entry.
    pub fn catch_all(mut self, entry: ActionPath) -> Self {
        self.catch_all = Some(entry);
        self
    }

    /// Sets the override for an action.
    pub fn set(mut self, action: Action, entry: ActionPath) -> Self {
        self.paths.insert(action, entry);
        self
    }

    /// Sets the override for an action in place.
    pub fn set_path(&mut self, action: Action, path: Option<String>, method: Option<RestMethod>) {
        self.paths.insert(action, ActionPath { path, method });
    }

    /// Returns the merged entry for an action.
    pub fn merged(&self, action: Action) -> ActionPath {
        let base = match (&self.catch_all, self.defaults.get(&action)) {
            (Some(all), Some(default)) => all.merge(default),
            (Some(all), None) => all.clone(),
            (None, Some(default)) => default.clone(),
            (None, None) => ActionPath::default(),
        };

        match self.paths.get(&action) {
            Some(entry) => base.merge(entry),
            None => base,
        }
    }

    /// Returns `true` if the action resolves to a full target.
    pub fn has_path(&self, action: Action) -> bool {
        self.target(action).is_some()
    }

    /// Returns the target for an action, if it has both path and method.
    pub fn target(&self, action: Action) -> Option<Target> {
        let ActionPath { path, method } = self.merged(action);
        Some(Target::new(method?, path?))
    }
}

/// A remote collection bound to a connection of a registry.
///
/// ## Examples
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use elicit::{PathMap, Resource};
/// use elicit::resource::ActionPath;
///
/// let widgets = Resource::new("widgets", Arc::clone(&registry))
///     .with_paths(PathMap::new().catch_all(ActionPath::path("/widgets/{id?}")));
///
/// let all = widgets.all().await?;
/// let one = widgets.find_or_fail(42).await?;
/// let created = widgets.create([("name", "Bolt")]).await?;
/// let deleted = widgets.destroy(42).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Resource {
    name: String,
    connection: Option<String>,
    key_name: String,
    paths: PathMap,
    registry: Arc<ConnectionRegistry>,
}

impl Resource {
    /// Creates a resource on the registry's default connection, keyed by `id`.
    pub fn new(name: impl Into<String>, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            name: name.into(),
            connection: None,
            key_name: "id".to_string(),
            paths: PathMap::new(),
            registry,
        }
    }

    /// Uses a named connection instead of the default one.
    pub fn with_connection(mut self, name: impl Into<String>) -> Self {
        self.connection = Some(name.into());
        self
    }

    /// Sets the primary key field.
    pub fn with_key_name(mut self, key_name: impl Into<String>) -> Self {
        self.key_name = key_name.into();
        self
    }

    /// Sets the per-action targets.
    pub fn with_paths(mut self, paths: PathMap) -> Self {
        self.paths = paths;
        self
    }

    /// Returns the resource name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the primary key field.
    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// Returns the per-action targets.
    pub fn paths(&self) -> &PathMap {
        &self.paths
    }

    /// Resolves the connection serving this resource.
    pub fn connection(&self) -> Result<Arc<Connection>, ElicitError> {
        let connection = match &self.connection {
            Some(name) => self.registry.connection(name)?,
            None => self.registry.default_connection()?,
        };
        Ok(connection)
    }

    /// Returns the target for an action.
    ///
    /// ## Errors
    ///
    /// Returns [`CompileError::MissingTarget`] when the action has no path.
    pub fn target(&self, action: Action) -> Result<Target, CompileError> {
        self.paths.target(action).ok_or(CompileError::MissingTarget)
    }

    /// Starts a query on this resource's connection.
    pub fn query(&self) -> Result<Builder, ElicitError> {
        Ok(self.connection()?.query().with_key_name(self.key_name.as_str()))
    }

    /// Starts a query targeting an action.
    pub fn query_for(&self, action: Action) -> Result<Builder, ElicitError> {
        let target = self.target(action)?;
        Ok(self.query()?.from(target))
    }

    /// Lists every record.
    pub async fn all(&self) -> Result<Vec<Value>, ElicitError> {
        self.query_for(Action::Index)?.get().await
    }

    /// Fetches a record by primary key.
    pub async fn find(&self, id: impl Into<Value>) -> Result<Option<Value>, ElicitError> {
        self.query_for(Action::Show)?.find(id).await
    }

    /// Fetches a record by primary key, failing when it does not exist.
    ///
    /// ## Errors
    ///
    /// Returns [`ElicitError::NotFound`] when no record matches.
    pub async fn find_or_fail(&self, id: impl Into<Value>) -> Result<Value, ElicitError> {
        let id = id.into();
        let key = value_text(&id);
        self.find(id).await?.ok_or_else(|| ElicitError::NotFound {
            resource: self.name.clone(),
            key,
        })
    }

    /// Creates a record from attributes.
    pub async fn create<I, K, V>(&self, attributes: I) -> Result<Value, ElicitError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.query_for(Action::Store)?
            .post_fields(attributes)
            .create()
            .await
    }

    /// Updates the record with the given primary key.
    pub async fn update<I, K, V>(&self, id: impl Into<Value>, attributes: I) -> Result<Value, ElicitError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.query_for(Action::Update)?
            .filter(self.key_name.as_str(), id)
            .post_fields(attributes)
            .update()
            .await
    }

    /// Deletes the record with the given primary key.
    pub async fn destroy(&self, id: impl Into<Value>) -> Result<bool, ElicitError> {
        self.query_for(Action::Destroy)?
            .filter(self.key_name.as_str(), id)
            .delete()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConnectionConfig, ElicitConfig};

    #[test]
    fn test_default_methods() {
        let paths = PathMap::new();
        for action in Action::iter() {
            assert_eq!(paths.merged(action).method, Some(action.default_method()));
            assert!(!paths.has_path(action));
        }
    }

    #[test]
    fn test_catch_all_supplies_path() {
        let paths = PathMap::new().catch_all(ActionPath::path("/widgets/{id?}"));

        assert_eq!(
            paths.target(Action::Store),
            Some(Target::new(RestMethod::Post, "/widgets/{id?}"))
        );
        assert_eq!(
            paths.target(Action::Destroy),
            Some(Target::new(RestMethod::Delete, "/widgets/{id?}"))
        );
    }

    #[test]
    fn test_override_wins_field_by_field() {
        let paths = PathMap::new()
            .catch_all(ActionPath::path("/widgets"))
            .set(Action::Show, ActionPath::path("/widgets/{id}"))
            .set(
                Action::Update,
                ActionPath {
                    path: None,
                    method: Some(RestMethod::Patch),
                },
            );

        assert_eq!(
            paths.target(Action::Show),
            Some(Target::new(RestMethod::Get, "/widgets/{id}"))
        );
        assert_eq!(
            paths.target(Action::Update),
            Some(Target::new(RestMethod::Patch, "/widgets"))
        );
    }

    #[test]
    fn test_catch_all_method_loses_to_default() {
        let paths = PathMap::new().catch_all(ActionPath::new("/widgets", RestMethod::Post));
        assert_eq!(paths.merged(Action::Index).method, Some(RestMethod::Get));
    }

    #[test]
    fn test_set_path_in_place() {
        let mut paths = PathMap::new();
        paths.set_path(Action::Index, Some("/v2/widgets".to_string()), None);
        assert_eq!(
            paths.target(Action::Index),
            Some(Target::get("/v2/widgets"))
        );
    }

    #[test]
    fn test_action_names() {
        assert_eq!(Action::Destroy.to_string(), "destroy");
        assert_eq!("STORE".parse::<Action>().unwrap(), Action::Store);
        assert_eq!(Action::Options.as_ref(), "options");
    }

    #[test]
    fn test_missing_target() {
        let mut config = ElicitConfig {
            default: Some("shop".to_string()),
            ..ElicitConfig::default()
        };
        config.connections.insert(
            "shop".to_string(),
            ConnectionConfig::new("https://shop.example.com"),
        );
        let resource = Resource::new("widgets", Arc::new(ConnectionRegistry::new(config)));

        assert_eq!(resource.target(Action::Index), Err(CompileError::MissingTarget));
        assert!(matches!(
            resource.query_for(Action::Index),
            Err(ElicitError::Compile(CompileError::MissingTarget))
        ));
        assert_eq!(resource.query().unwrap().key_name(), "id");
    }

    #[test]
    fn test_unknown_connection() {
        let resource = Resource::new("widgets", Arc::new(ConnectionRegistry::new(ElicitConfig::default())))
            .with_connection("missing");
        assert!(matches!(
            resource.connection(),
            Err(ElicitError::Config(crate::error::ConfigError::UnknownConnection { .. }))
        ));
    }
}
