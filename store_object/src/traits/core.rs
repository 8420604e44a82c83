//! Trait definitions
//!
//! This module defines the awaitable CRUD surface shared by all repositories.

use crate::errors::RepositoryError;
use crate::query_builder::{ListResponse, RequestOptions};
use crate::traits::model::Model;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

/// Common entity operations, resolved through the shared cache
#[async_trait]
pub trait StoreObject: Clone + Send + Sync + Debug {
    /// The model type that this object represents
    type Model: Model;

    /// The ID type used for this object
    type Id: Clone + Send + Sync + Debug;

    /// Get one page, served from the cache when fresh
    async fn get_page(
        &self,
        options: RequestOptions,
    ) -> Result<ListResponse<Self::Model>, RepositoryError>;

    /// Get an object by its ID, served from the cache when fresh
    async fn get_by_id(&self, id: &Self::Id) -> Result<Self::Model, RepositoryError>;

    /// Create an object from a partial body
    async fn create_one(&self, data: Value) -> Result<Option<Self::Model>, RepositoryError>;

    /// Update an object by its ID
    async fn update_one(&self, id: &Self::Id, data: Value) -> Result<Self::Model, RepositoryError>;

    /// Delete an object by its ID
    async fn delete_one(&self, id: &Self::Id) -> Result<(), RepositoryError>;
}
