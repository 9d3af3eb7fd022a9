use crate::framework::{ActorEntity, FrameworkError, ResourceClient};
use async_trait::async_trait;

/// Trait for resource-specific clients to inherit the standard read operations.
///
/// Implementors provide access to the generic client and a mapping from
/// [`FrameworkError`] to their own error type; `get` and `list` come for free.
#[async_trait]
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// The resource-specific error type.
    type Error: Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map framework errors to the specific resource error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch an entity by ID.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }

    /// Up to `limit` entities after the `after` cursor, in ID order.
    #[tracing::instrument(skip(self))]
    async fn list(&self, after: Option<T::Id>, limit: usize) -> Result<Vec<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().list(after, limit).await.map_err(Self::map_error)
    }
}
