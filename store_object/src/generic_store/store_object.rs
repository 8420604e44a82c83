//! Generic repository operations
//!
//! Reads hand out cached queries, writes hand out mutations whose success
//! hooks keep the cache in line with the backend: every write invalidates the
//! entity's keys, a delete also drops the deleted entity's detail entry.

use super::core::Repository;
use crate::errors::{RepositoryError, TransportError};
use crate::query_builder::{ListResponse, Pagination, RequestOptions};
use crate::traits::StoreObject;
use crate::traits::model::Model;
use crate::traits::transport::{Transport, TransportRequest};
use async_trait::async_trait;
use query_system::{Mutation, Query, QueryOptions, ReactiveQuery};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use signal_system::Reactive;
use std::sync::Arc;

/// Input of an update mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateInput<P> {
    pub id: String,
    pub data: P,
}

impl<P> UpdateInput<P> {
    pub fn new(id: impl Into<String>, data: P) -> Self {
        Self { id: id.into(), data }
    }
}

fn decode<T: DeserializeOwned>(body: Value) -> Result<T, TransportError> {
    serde_json::from_value(body).map_err(|e| TransportError::Decode(e.to_string()))
}

pub(crate) async fn fetch_list<T: Model>(
    transport: &dyn Transport,
    request: TransportRequest,
    total_count_header: &str,
    pagination: Option<Pagination>,
) -> Result<ListResponse<T>, TransportError> {
    let response = transport.request(request).await?;
    let total = response.total_count(total_count_header);
    let items = decode::<Vec<T>>(response.body)?;
    Ok(ListResponse::new(items, total, pagination))
}

async fn fetch_one<T: Model>(
    transport: &dyn Transport,
    request: TransportRequest,
) -> Result<T, TransportError> {
    let response = transport.request(request).await?;
    decode(response.body)
}

impl<T: Model> Repository<T> {
    /// Query options for a list request
    pub(crate) fn page_options(&self, options: &RequestOptions) -> QueryOptions {
        let mut query_options = self.options.with_placeholder(true);
        if let Some(stale_time) = options.stale_time() {
            query_options = query_options.with_stale_time(stale_time);
        }
        query_options
    }

    /// Fetch function for one page; every call issues a new request
    pub(crate) fn page_fetcher(
        &self,
        options: &RequestOptions,
    ) -> impl Fn() -> futures::future::BoxFuture<'static, Result<ListResponse<T>, TransportError>>
    + Send
    + Sync
    + 'static {
        use futures::FutureExt;

        let transport = Arc::clone(&self.transport);
        let request = TransportRequest::get(self.collection_path()).with_params(options.to_params());
        let header = self.total_count_header.clone();
        let pagination = options.pagination;

        move || {
            let transport = Arc::clone(&transport);
            let request = request.clone();
            let header = header.clone();
            async move { fetch_list::<T>(transport.as_ref(), request, &header, pagination).await }
                .boxed()
        }
    }

    /// Page of entities; cached under the list key of `options`
    pub fn fetch_page(&self, options: &RequestOptions) -> Query<ListResponse<T>> {
        self.client.query(
            self.keys.list(Some(options)),
            self.page_fetcher(options),
            self.page_options(options),
        )
    }

    /// Single entity; an empty id yields a disabled query
    pub fn fetch_by_id(&self, id: &str) -> Query<T> {
        let transport = Arc::clone(&self.transport);
        let path = self.item_path(id);
        let options = self.options.enabled(!id.is_empty());

        self.client.query(
            self.keys.details(id),
            move || {
                let transport = Arc::clone(&transport);
                let request = TransportRequest::get(path.clone());
                async move { fetch_one::<T>(transport.as_ref(), request).await }
            },
            options,
        )
    }

    /// Page query that follows `options`, re-keyed on every change
    pub fn watch_page(&self, options: &Reactive<RequestOptions>) -> ReactiveQuery<ListResponse<T>> {
        let repository = self.clone();
        self.client
            .watch(options, move |_, options: &RequestOptions| repository.fetch_page(options))
    }

    /// Entity query that follows `id`, re-keyed on every change
    pub fn watch_by_id(&self, id: &Reactive<String>) -> ReactiveQuery<T> {
        let repository = self.clone();
        self.client
            .watch(id, move |_, id: &String| repository.fetch_by_id(id))
    }

    /// POST a partial entity; the created entity is returned when the backend echoes it
    pub fn create<P>(&self) -> Mutation<P, Option<T>>
    where
        P: Serialize + Clone + Send + Sync + 'static,
    {
        let transport = Arc::clone(&self.transport);
        let path = self.collection_path();
        let client = self.client.clone();
        let scope = self.keys.all();

        self.client
            .mutation(move |data: P| {
                let transport = Arc::clone(&transport);
                let path = path.clone();
                async move {
                    let body = serde_json::to_value(&data)?;
                    let response = transport.request(TransportRequest::post(path, body)).await?;
                    Ok::<_, RepositoryError>(decode::<Option<T>>(response.body)?)
                }
            })
            .on_success(move |_, _| {
                client.invalidate(&scope);
            })
    }

    /// PUT changes to an existing entity
    pub fn update<P>(&self) -> Mutation<UpdateInput<P>, T>
    where
        P: Serialize + Clone + Send + Sync + 'static,
    {
        let transport = Arc::clone(&self.transport);
        let entity = self.entity.clone();
        let client = self.client.clone();
        let scope = self.keys.all();

        self.client
            .mutation(move |input: UpdateInput<P>| {
                let transport = Arc::clone(&transport);
                let path = format!("/{}/{}", entity, input.id);
                async move {
                    let body = serde_json::to_value(&input.data)?;
                    let response = transport.request(TransportRequest::put(path, body)).await?;
                    Ok::<_, RepositoryError>(decode::<T>(response.body)?)
                }
            })
            .on_success(move |_, _| {
                client.invalidate(&scope);
            })
    }

    /// DELETE an entity by id; resolves to the raw response body
    pub fn delete(&self) -> Mutation<String, Value> {
        let transport = Arc::clone(&self.transport);
        let entity = self.entity.clone();
        let client = self.client.clone();
        let keys = self.keys.clone();

        self.client
            .mutation(move |id: String| {
                let transport = Arc::clone(&transport);
                let path = format!("/{}/{}", entity, id);
                async move {
                    let response = transport.request(TransportRequest::delete(path)).await?;
                    Ok::<_, TransportError>(response.body)
                }
            })
            .on_success(move |_, id| {
                client.remove(&keys.details(id.as_str()));
                client.invalidate(&keys.all());
            })
    }
}

#[async_trait]
impl<T: Model> StoreObject for Repository<T> {
    type Model = T;
    type Id = String;

    async fn get_page(&self, options: RequestOptions) -> Result<ListResponse<T>, RepositoryError> {
        let page = self
            .client
            .fetch_query(
                self.keys.list(Some(&options)),
                self.page_fetcher(&options),
                self.page_options(&options),
            )
            .await?;
        Ok(page)
    }

    async fn get_by_id(&self, id: &String) -> Result<T, RepositoryError> {
        let transport = Arc::clone(&self.transport);
        let path = self.item_path(id);
        let entity = self
            .client
            .fetch_query(
                self.keys.details(id.as_str()),
                move || {
                    let transport = Arc::clone(&transport);
                    let request = TransportRequest::get(path.clone());
                    async move { fetch_one::<T>(transport.as_ref(), request).await }
                },
                self.options,
            )
            .await?;
        Ok(entity)
    }

    async fn create_one(&self, data: Value) -> Result<Option<T>, RepositoryError> {
        Ok(self.create::<Value>().mutate_async(data).await?)
    }

    async fn update_one(&self, id: &String, data: Value) -> Result<T, RepositoryError> {
        Ok(self
            .update::<Value>()
            .mutate_async(UpdateInput::new(id.clone(), data))
            .await?)
    }

    async fn delete_one(&self, id: &String) -> Result<(), RepositoryError> {
        self.delete().mutate_async(id.clone()).await?;
        Ok(())
    }
}
