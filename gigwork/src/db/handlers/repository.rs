//! The CRUD surface shared by the table repositories.

use crate::db::errors::Result;

/// Data access for one postgres table.
///
/// Create requests, update requests and responses are separate associated types so that callers
/// can never write columns the table owns (ids, timestamps, verification state).
#[async_trait::async_trait]
pub trait Repository {
    type CreateRequest;
    type UpdateRequest;
    type Response;
    type Id: Send + Sync;
    type Filter: Send + Sync;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// `Ok(None)` when no row has this id
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    /// Rows matching the filter, newest first, paged by the filter's skip and limit
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Returns whether a row was deleted
    async fn delete(&mut self, id: Self::Id) -> Result<bool>;

    /// Fails with [`DbError::NotFound`](crate::db::errors::DbError::NotFound) when no row has this id
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response>;
}
