use crate::clients::actor_client::ActorClient;
use crate::clients::store::{CustomerEnumerator, CustomerStore};
use crate::customer_actor::{CustomerAction, CustomerActionResult, CustomerError};
use crate::framework::{FrameworkError, ResourceClient};
use crate::model::{Customer, CustomerCreate, CustomerId, CustomerUpdate};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for interacting with the Customer actor.
#[derive(Clone)]
pub struct CustomerClient {
    inner: ResourceClient<Customer>,
}

impl CustomerClient {
    pub fn new(inner: ResourceClient<Customer>) -> Self {
        Self { inner }
    }

    /// Like [`ActorClient::map_error`], but turns a framework `NotFound` into
    /// [`CustomerError::NotFound`] for the id the caller asked about.
    fn map_error_for(id: CustomerId, e: FrameworkError) -> CustomerError {
        match e {
            FrameworkError::NotFound(_) => CustomerError::NotFound(id),
            other => Self::map_error(other),
        }
    }
}

#[async_trait]
impl ActorClient<Customer> for CustomerClient {
    type Error = CustomerError;

    fn inner(&self) -> &ResourceClient<Customer> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e {
            FrameworkError::ActorClosed | FrameworkError::ActorDropped => {
                CustomerError::StoreUnavailable(e.to_string())
            }
            FrameworkError::EntityError(inner) => match inner.downcast_ref::<CustomerError>() {
                Some(customer_error) => customer_error.clone(),
                None => CustomerError::Unexpected(inner.to_string()),
            },
            FrameworkError::NotFound(id) => {
                CustomerError::Unexpected(format!("store lost track of {id}"))
            }
        }
    }
}

impl CustomerClient {
    #[instrument(skip(self))]
    pub async fn create_customer(
        &self,
        params: CustomerCreate,
    ) -> Result<CustomerId, CustomerError> {
        debug!("Sending request");
        self.inner.create(params).await.map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn update_customer(
        &self,
        id: CustomerId,
        update: CustomerUpdate,
    ) -> Result<Customer, CustomerError> {
        debug!("Sending request");
        self.inner
            .update(id, update)
            .await
            .map_err(|e| Self::map_error_for(id, e))
    }

    /// Returns whether the flag changed.
    #[instrument(skip(self))]
    pub async fn set_active(&self, id: CustomerId, active: bool) -> Result<bool, CustomerError> {
        debug!("Sending request");
        let result = self
            .inner
            .perform_action(id, CustomerAction::SetActive(active))
            .await
            .map_err(|e| Self::map_error_for(id, e))?;
        match result {
            CustomerActionResult::SetActive { changed } => Ok(changed),
        }
    }
}

#[async_trait]
impl CustomerStore for CustomerClient {
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, CustomerError> {
        self.get(id).await
    }

    async fn save(&self, customer: Customer) -> Result<Customer, CustomerError> {
        self.update_customer(customer.id, CustomerUpdate::from(&customer))
            .await
    }

    async fn set_active(&self, id: CustomerId, active: bool) -> Result<bool, CustomerError> {
        CustomerClient::set_active(self, id, active).await
    }
}

#[async_trait]
impl CustomerEnumerator for CustomerClient {
    async fn page(
        &self,
        after: Option<CustomerId>,
        limit: usize,
    ) -> Result<Vec<Customer>, CustomerError> {
        self.list(after, limit).await
    }
}
