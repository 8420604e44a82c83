use crate::errors::RepositoryError;
use crate::traits::transport::Transport;
use crate::validation::ValidatedEntityName;
use cache_system::QueryKeys;
use query_system::{QueryClient, QueryOptions};
use std::marker::PhantomData;
use std::sync::Arc;

/// CRUD access to one entity through the shared query client
pub struct Repository<T> {
    pub(crate) entity: ValidatedEntityName,
    pub(crate) keys: QueryKeys,
    pub(crate) client: QueryClient,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) total_count_header: String,
    pub(crate) options: QueryOptions,
    pub(crate) _phantom: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            entity: self.entity.clone(),
            keys: self.keys.clone(),
            client: self.client.clone(),
            transport: Arc::clone(&self.transport),
            total_count_header: self.total_count_header.clone(),
            options: self.options,
            _phantom: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &self.entity)
            .field("transport", &self.transport)
            .field("total_count_header", &self.total_count_header)
            .field("options", &self.options)
            .finish()
    }
}

impl<T> Repository<T> {
    pub fn new(
        entity: &str,
        client: QueryClient,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, RepositoryError> {
        let entity = ValidatedEntityName::new(entity)?;
        let options = client.default_options();
        Ok(Self {
            keys: QueryKeys::new(entity.as_str()),
            entity,
            client,
            transport,
            total_count_header: "X-Total-Count".to_string(),
            options,
            _phantom: PhantomData,
        })
    }

    /// Header that carries the total item count of list responses
    pub fn with_total_count_header(mut self, header: impl Into<String>) -> Self {
        self.total_count_header = header.into();
        self
    }

    /// Options applied to every query of this repository
    pub fn with_query_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn entity(&self) -> &str {
        self.entity.as_str()
    }

    pub fn keys(&self) -> &QueryKeys {
        &self.keys
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn query_options(&self) -> QueryOptions {
        self.options
    }

    pub(crate) fn collection_path(&self) -> String {
        format!("/{}", self.entity)
    }

    pub(crate) fn item_path(&self, id: &str) -> String {
        format!("/{}/{}", self.entity, id)
    }
}
