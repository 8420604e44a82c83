//! Core QueryHaus functionality
//!
//! This module contains the QueryHaus coordinator, which wires the signal
//! manager, the cache, the query client and the transport together and keeps
//! a registry of named repositories.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use cache_system::{CacheManager, CacheParams};
use config::AppConfig;
use query_system::{QueryClient, QueryOptions};
use signal_system::SignalManager;
use store_object::traits::{Model, StoreObject, Transport};
use store_object::{HttpTransport, Repository};

use crate::errors::QueryHausError;

/// Main QueryHaus coordinator that owns the shared cache and transport
pub struct QueryHaus {
    config: AppConfig,
    signals: Arc<SignalManager>,
    cache: CacheManager,
    client: QueryClient,
    transport: Arc<dyn Transport>,
    repositories: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for QueryHaus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.repositories.keys().collect();
        names.sort();
        f.debug_struct("QueryHaus")
            .field("transport", &self.transport)
            .field("cache_entries", &self.cache.len())
            .field("repositories", &names)
            .finish()
    }
}

impl QueryHaus {
    /// Create a coordinator talking HTTP to `config.transport.base_url`
    pub fn new(config: AppConfig) -> Result<Self, QueryHausError> {
        config.validate()?;
        let transport = HttpTransport::new(&config.transport)?;
        Ok(Self::assemble(config, Arc::new(transport)))
    }

    /// Create a coordinator over a custom transport, e.g. [`store_object::MockTransport`]
    pub fn with_transport(
        config: AppConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, QueryHausError> {
        config.validate()?;
        Ok(Self::assemble(config, transport))
    }

    fn assemble(config: AppConfig, transport: Arc<dyn Transport>) -> Self {
        let signals = Arc::new(SignalManager::with_config(config.signal.clone()));
        let cache = CacheManager::with_signals(
            CacheParams::from(&config.cache),
            Arc::clone(&signals),
        );
        let client = QueryClient::with_defaults(
            cache.clone(),
            QueryOptions::from_config(&config.cache),
        );

        crate::debug_log!(
            base_url = %config.transport.base_url,
            stale_time_ms = config.cache.stale_time_ms,
            gc_time_ms = config.cache.gc_time_ms,
            "QueryHaus initialized"
        );

        Self {
            config,
            signals,
            cache,
            client,
            transport,
            repositories: HashMap::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn signals(&self) -> &Arc<SignalManager> {
        &self.signals
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Build a repository for `entity` sharing this coordinator's cache and transport
    pub fn repository<T: Model>(&self, entity: &str) -> Result<Repository<T>, QueryHausError> {
        let repository = Repository::new(entity, self.client.clone(), Arc::clone(&self.transport))?
            .with_total_count_header(self.config.transport.total_count_header.clone());
        Ok(repository)
    }

    /// Register a repository under a given name
    pub fn register_repository<R>(&mut self, name: String, repository: R) -> Result<(), QueryHausError>
    where
        R: StoreObject + Send + Sync + 'static,
    {
        if self.repositories.contains_key(&name) {
            return Err(QueryHausError::RepositoryAlreadyRegistered(name));
        }

        crate::trace_log!(name = %name, "repository registered");
        self.repositories.insert(name, Box::new(repository));
        Ok(())
    }

    /// Get a registered repository by name
    pub fn get_repository<R>(&self, name: &str) -> Result<&R, QueryHausError>
    where
        R: StoreObject + Send + Sync + 'static,
    {
        self.repositories
            .get(name)
            .and_then(|repository| repository.downcast_ref::<R>())
            .ok_or_else(|| QueryHausError::RepositoryNotFound(name.to_string()))
    }

    /// List all registered repository names, sorted
    pub fn list_repositories(&self) -> Vec<&String> {
        let mut names: Vec<&String> = self.repositories.keys().collect();
        names.sort();
        names
    }

    /// Remove a repository by name; its cached data stays until invalidated or collected
    pub fn unregister_repository(&mut self, name: &str) -> Result<(), QueryHausError> {
        self.repositories
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| QueryHausError::RepositoryNotFound(name.to_string()))
    }
}
