//! Lazy, memoized resolution of connections by name.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::config::{create_connection, create_connector, ElicitConfig};
use crate::connection::{Connection, QueryListener};
use crate::error::ConfigError;

/// Resolves connection names to shared [`Connection`]s.
///
/// A connection is built from configuration on its first request and the
/// same `Arc` is returned for every later request of that name, also when
/// several tasks race for the first one.
///
/// ## Examples
///
/// ```rust
/// use std::sync::Arc;
/// use elicit::{ConnectionRegistry, ElicitConfig};
///
/// let config = ElicitConfig::from_yaml_str(r#"
/// default: shop
/// connections:
///   shop:
///     host: https://api.example.com
/// "#).unwrap();
///
/// let registry = ConnectionRegistry::new(config);
/// let first = registry.default_connection().unwrap();
/// let second = registry.connection("shop").unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
pub struct ConnectionRegistry {
    config: ElicitConfig,
    listener: Option<Arc<dyn QueryListener>>,
    connections: RwLock<HashMap<String, Arc<Connection>>>,
}

impl ConnectionRegistry {
    /// Creates a registry over a configuration.
    pub fn new(config: ElicitConfig) -> Self {
        Self {
            config,
            listener: None,
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Sets the listener attached to every connection built from configuration.
    pub fn with_listener(mut self, listener: Arc<dyn QueryListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ElicitConfig {
        &self.config
    }

    /// Returns the connection for a name, building it on first use.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::UnknownConnection`] for names that are neither
    /// configured nor registered, and any factory error for the first
    /// resolution of a misconfigured name.
    pub fn connection(&self, name: &str) -> Result<Arc<Connection>, ConfigError> {
        if let Some(connection) = self.cached(name) {
            return Ok(connection);
        }

        let mut connections = self
            .connections
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        // Another caller may have won the race for the write lock.
        if let Some(connection) = connections.get(name) {
            return Ok(Arc::clone(connection));
        }

        let connection = Arc::new(self.make_connection(name)?);
        connections.insert(name.to_string(), Arc::clone(&connection));
        debug!(connection = name, driver = %connection.driver(), "connection resolved");

        Ok(connection)
    }

    /// Returns the default connection.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::NoDefaultConnection`] when no default is
    /// configured.
    pub fn default_connection(&self) -> Result<Arc<Connection>, ConfigError> {
        let name = self.config.default_name()?;
        self.connection(name)
    }

    /// Returns the default connection name.
    pub fn default_connection_name(&self) -> Option<&str> {
        self.config.default.as_deref()
    }

    /// Registers a prebuilt connection under its name, replacing any
    /// connection resolved earlier for that name.
    pub fn add_connection(&self, connection: Connection) -> Arc<Connection> {
        let connection = Arc::new(connection);
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(connection.name().to_string(), Arc::clone(&connection));
        connection
    }

    /// Returns `true` if a connection for the name has been resolved or
    /// registered.
    pub fn has_connection(&self, name: &str) -> bool {
        self.cached(name).is_some()
    }

    fn cached(&self, name: &str) -> Option<Arc<Connection>> {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn make_connection(&self, name: &str) -> Result<Connection, ConfigError> {
        let config = self
            .config
            .connection(name)
            .ok_or_else(|| ConfigError::unknown_connection(name))?;

        let connector = create_connector(config)?;
        let connection = create_connection(name, &config.driver, connector, config)?;

        Ok(match &self.listener {
            Some(listener) => connection.with_listener(Arc::clone(listener)),
            None => connection,
        })
    }
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let resolved: Vec<String> = self
            .connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        f.debug_struct("ConnectionRegistry")
            .field("config", &self.config)
            .field("resolved", &resolved)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfig;
    use crate::connector::Connector;
    use std::thread;

    fn registry() -> ConnectionRegistry {
        let mut config = ElicitConfig {
            default: Some("shop".to_string()),
            ..ElicitConfig::default()
        };
        config.connections.insert(
            "shop".to_string(),
            ConnectionConfig::new("https://shop.example.com"),
        );
        config.connections.insert(
            "crm".to_string(),
            ConnectionConfig {
                driver: "fractal".to_string(),
                ..ConnectionConfig::new("https://crm.example.com")
            },
        );
        config.connections.insert(
            "broken".to_string(),
            ConnectionConfig {
                driver: "soap".to_string(),
                ..ConnectionConfig::new("https://broken.example.com")
            },
        );
        ConnectionRegistry::new(config)
    }

    #[test]
    fn test_same_name_yields_same_connection() {
        let registry = registry();

        let first = registry.connection("shop").unwrap();
        let second = registry.connection("shop").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_different_names_yield_different_connections() {
        let registry = registry();

        let shop = registry.connection("shop").unwrap();
        let crm = registry.connection("crm").unwrap();

        assert!(!Arc::ptr_eq(&shop, &crm));
        assert_eq!(crm.name(), "crm");
    }

    #[test]
    fn test_default_connection() {
        let registry = registry();
        let default = registry.default_connection().unwrap();

        assert_eq!(registry.default_connection_name(), Some("shop"));
        assert!(Arc::ptr_eq(&default, &registry.connection("shop").unwrap()));
    }

    #[test]
    fn test_missing_default() {
        let registry = ConnectionRegistry::new(ElicitConfig::default());
        assert!(matches!(
            registry.default_connection(),
            Err(ConfigError::NoDefaultConnection)
        ));
    }

    #[test]
    fn test_unknown_name() {
        let err = registry().connection("nope").unwrap_err();
        assert_eq!(err.to_string(), "Connection [nope] is not configured");
    }

    #[test]
    fn test_factory_errors_are_not_cached() {
        let registry = registry();

        assert!(registry.connection("broken").is_err());
        assert!(!registry.has_connection("broken"));
        assert!(registry.connection("broken").is_err());
    }

    #[test]
    fn test_concurrent_first_access_has_one_winner() {
        let registry = Arc::new(registry());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.connection("crm").unwrap())
            })
            .collect();
        let connections: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for connection in &connections[1..] {
            assert!(Arc::ptr_eq(&connections[0], connection));
        }
    }

    #[test]
    fn test_add_connection() {
        let registry = registry();
        assert!(!registry.has_connection("manual"));

        let connector = Connector::new(url::Url::parse("https://manual.example.com").unwrap()).unwrap();
        let added = registry.add_connection(Connection::new("manual", connector));

        assert!(registry.has_connection("manual"));
        assert!(Arc::ptr_eq(&added, &registry.connection("manual").unwrap()));
    }
}
