//! Content CRUD over the admin API.
//!
//! Admin tabs (slides, testimonials, blogs, careers, applicants, contacts,
//! settings) all share the same list/get/create/update/delete shape, so one
//! trait covers them. The HTTP implementation rides the guarded client and
//! inherits its session handling.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;

use super::client::GuardedClient;
use super::types::{ApiError, Fields, Record, Resource};

#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn list(&self, resource: Resource) -> Result<Vec<Record>, ApiError>;

    async fn get(&self, resource: Resource, id: &str) -> Result<Record, ApiError>;

    async fn create(&self, resource: Resource, fields: Fields) -> Result<Record, ApiError>;

    async fn update(&self, resource: Resource, id: &str, fields: Fields) -> Result<Record, ApiError>;

    async fn delete(&self, resource: Resource, id: &str) -> Result<(), ApiError>;
}

pub struct HttpRecordSource {
    client: Arc<GuardedClient>,
}

impl HttpRecordSource {
    #[must_use]
    pub fn new(client: Arc<GuardedClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    async fn list(&self, resource: Resource) -> Result<Vec<Record>, ApiError> {
        self.client
            .get_json(&resource.collection_path())
            .await
    }

    async fn get(&self, resource: Resource, id: &str) -> Result<Record, ApiError> {
        self.client.get_json(&resource.item_path(id)).await
    }

    async fn create(&self, resource: Resource, fields: Fields) -> Result<Record, ApiError> {
        self.client
            .send_json(Method::POST, &resource.collection_path(), &fields)
            .await?
            .into_success()?
            .json()
    }

    async fn update(&self, resource: Resource, id: &str, fields: Fields) -> Result<Record, ApiError> {
        self.client
            .send_json(Method::PUT, &resource.item_path(id), &fields)
            .await?
            .into_success()?
            .json()
    }

    async fn delete(&self, resource: Resource, id: &str) -> Result<(), ApiError> {
        self.client
            .send(Method::DELETE, &resource.item_path(id))
            .await?
            .into_success()?;
        Ok(())
    }
}
