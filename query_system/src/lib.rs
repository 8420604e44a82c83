//! Query system built on the shared cache
//!
//! This crate provides typed query handles with stale-while-revalidate
//! semantics, mutations with success and error hooks, and queries that
//! follow reactive inputs.

pub mod client;
pub mod errors;
pub mod mutation;
pub mod options;
pub mod prelude;
pub mod query;
pub mod reactive;

pub use client::QueryClient;
pub use errors::QueryError;
pub use mutation::{Mutation, MutationState, MutationStatus};
pub use options::QueryOptions;
pub use query::{Query, QueryResult, QueryStatus};
pub use reactive::ReactiveQuery;
