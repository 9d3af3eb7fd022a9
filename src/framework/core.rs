//! # Core Actor Framework
//!
//! This module defines the generic building blocks the Customer Store is built on.
//!
//! ## Key Types
//!
//! - [`ActorEntity`]: The trait a stored resource must implement.
//! - [`ResourceActor`]: The generic actor that owns a keyed collection of entities.
//! - [`ResourceClient`]: The generic client for communicating with an actor.
//! - [`FrameworkError`]: Plumbing errors (actor gone, item missing, entity rejection).

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::ops::Bound;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// Trait that any resource entity must implement to be managed by [`ResourceActor`].
///
/// # Architecture Note
/// The actor loop is written once against this contract. Associated types keep the
/// payloads apart: a `Customer` actor only accepts `CustomerCreate`, and the compiler
/// rejects anything else.
///
/// # Async & Context
/// Hooks are `#[async_trait]` so they may await other actors. The `Context` type is
/// injected into every hook when the actor is started ("late binding").
#[async_trait]
pub trait ActorEntity: Clone + Debug + Send + Sync + 'static {
    /// The unique identifier. Must be ordered so the actor can hand out stable pages,
    /// and convertible from `u32` for automatic ID generation.
    type Id: Eq + Ord + Hash + Clone + Send + Sync + Display + Debug + From<u32>;

    /// The data required to create a new instance.
    type Create: Send + Sync + Debug;

    /// The data required to update an existing instance.
    type Update: Send + Sync + Debug;

    /// Enum representing resource-specific operations.
    type Action: Send + Sync + Debug;

    /// The result type returned by custom actions.
    type ActionResult: Send + Sync + Debug;

    /// The runtime context (dependencies) injected into the actor.
    /// Use `()` if no dependencies are needed.
    type Context: Send + Sync;

    /// One error enum for the whole entity.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the full entity from the ID and payload.
    /// This is called synchronously before `on_create`.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    /// Called immediately after the entity is constructed, before it is stored.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called when an update request is received.
    async fn on_update(&mut self, update: Self::Update, _ctx: &Self::Context)
        -> Result<(), Self::Error>;

    /// Handle a custom resource-specific action.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        _ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;
}

// =============================================================================
// 2. THE GENERIC MESSAGES & ERRORS
// =============================================================================

/// Errors that can occur within the actor framework itself.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Entity error: {0}")]
    EntityError(Box<dyn std::error::Error + Send + Sync>),
}

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Message sent to the actor to request an operation.
///
/// The variants are the store operations every resource supports: create, read,
/// update, a custom `Action`, and `List` for cursor-based enumeration. There is no
/// physical delete; resources that need one model it as an action.
#[derive(Debug)]
pub enum ResourceRequest<T: ActorEntity> {
    Create {
        params: T::Create,
        respond_to: Response<T::Id>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Update {
        id: T::Id,
        update: T::Update,
        respond_to: Response<T>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
    /// Up to `limit` entities with IDs strictly greater than `after`, in ID order.
    List {
        after: Option<T::Id>,
        limit: usize,
        respond_to: Response<Vec<T>>,
    },
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

/// The generic actor that manages a collection of entities.
///
/// # Architecture Note
/// This is the "Server" half. It owns the `store` and the receiving end of the
/// channel, and processes one request at a time, so every single-entity update is
/// atomic without a `Mutex`. Two clients racing on the same entity still see
/// last-write-wins: the actor serialises requests, it does not version them.
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: BTreeMap<T::Id, T>,
    next_id: u32,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates a new `ResourceActor` and its associated `ResourceClient`.
    ///
    /// `buffer_size` is the capacity of the request channel. When it is full,
    /// client calls wait for space.
    pub fn new(buffer_size: usize) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: BTreeMap::new(),
            next_id: 1,
        };
        let client = ResourceClient::new(sender);
        (actor, client)
    }

    /// Runs the actor's event loop until every client has been dropped.
    pub async fn run(mut self, context: T::Context) {
        // Just the type name ("Customer"), not the module path
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    debug!(entity_type, ?params, "Create");
                    let id = T::Id::from(self.next_id);
                    self.next_id += 1;

                    match T::from_create_params(id.clone(), params) {
                        Ok(mut item) => {
                            if let Err(e) = item.on_create(&context).await {
                                warn!(entity_type, error = %e, "on_create failed");
                                let _ =
                                    respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                                continue;
                            }
                            self.store.insert(id.clone(), item);
                            info!(entity_type, %id, size = self.store.len(), "Created");
                            let _ = respond_to.send(Ok(id));
                        }
                        Err(e) => {
                            warn!(entity_type, error = %e, "Create failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        }
                    }
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    debug!(entity_type, %id, found = item.is_some(), "Get");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::Update {
                    id,
                    update,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?update, "Update");
                    let Some(item) = self.store.get_mut(&id) else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    // Work on a copy so a rejected update leaves the stored entity intact
                    let mut staged = item.clone();
                    match staged.on_update(update, &context).await {
                        Ok(()) => {
                            *item = staged.clone();
                            info!(entity_type, %id, "Updated");
                            let _ = respond_to.send(Ok(staged));
                        }
                        Err(e) => {
                            warn!(entity_type, %id, error = %e, "Update failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        }
                    }
                }
                ResourceRequest::Action {
                    id,
                    action,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?action, "Action");
                    let Some(item) = self.store.get_mut(&id) else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    let result = item
                        .handle_action(action, &context)
                        .await
                        .map_err(|e| FrameworkError::EntityError(Box::new(e)));
                    match &result {
                        Ok(_) => info!(entity_type, %id, "Action ok"),
                        Err(e) => warn!(entity_type, %id, error = %e, "Action failed"),
                    }
                    let _ = respond_to.send(result);
                }
                ResourceRequest::List {
                    after,
                    limit,
                    respond_to,
                } => {
                    let lower = match &after {
                        Some(id) => Bound::Excluded(id),
                        None => Bound::Unbounded,
                    };
                    let page: Vec<T> = self
                        .store
                        .range((lower, Bound::Unbounded))
                        .take(limit)
                        .map(|(_, item)| item.clone())
                        .collect();
                    debug!(entity_type, ?after, limit, returned = page.len(), "List");
                    let _ = respond_to.send(Ok(page));
                }
            }
        }

        info!(entity_type, size = self.store.len(), "Shutdown");
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

/// A type-safe client for interacting with a [`ResourceActor`].
///
/// Holds only a sender, so cloning is cheap. When the last clone is dropped the
/// actor's loop ends.
pub struct ResourceClient<T: ActorEntity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: ActorEntity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: ActorEntity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R>) -> ResourceRequest<T>,
    ) -> Result<R, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, params: T::Create) -> Result<T::Id, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Create { params, respond_to })
            .await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Get { id, respond_to })
            .await
    }

    pub async fn update(&self, id: T::Id, update: T::Update) -> Result<T, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Update {
            id,
            update,
            respond_to,
        })
        .await
    }

    pub async fn perform_action(
        &self,
        id: T::Id,
        action: T::Action,
    ) -> Result<T::ActionResult, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Action {
            id,
            action,
            respond_to,
        })
        .await
    }

    pub async fn list(&self, after: Option<T::Id>, limit: usize) -> Result<Vec<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::List {
            after,
            limit,
            respond_to,
        })
        .await
    }
}

// =============================================================================
// 5. EXAMPLE USAGE (Test)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Counter {
        id: u32,
        label: String,
        value: u32,
        frozen: bool,
    }

    #[derive(Debug)]
    struct CounterCreate {
        label: String,
    }

    #[derive(Debug)]
    struct CounterUpdate {
        value: u32,
    }

    #[derive(Debug)]
    enum CounterAction {
        Freeze,
    }

    #[derive(Debug, thiserror::Error)]
    enum CounterError {
        #[error("empty label")]
        EmptyLabel,
        #[error("counter {0} is frozen")]
        Frozen(u32),
    }

    #[async_trait]
    impl ActorEntity for Counter {
        type Id = u32;
        type Create = CounterCreate;
        type Update = CounterUpdate;
        type Action = CounterAction;
        type ActionResult = bool;
        type Context = ();
        type Error = CounterError;

        fn from_create_params(id: u32, params: CounterCreate) -> Result<Self, Self::Error> {
            if params.label.is_empty() {
                return Err(CounterError::EmptyLabel);
            }
            Ok(Self {
                id,
                label: params.label,
                value: 0,
                frozen: false,
            })
        }

        async fn on_update(&mut self, update: CounterUpdate, _ctx: &()) -> Result<(), Self::Error> {
            // Mutate before failing to prove the actor discards partial updates
            self.value = update.value;
            if self.frozen {
                return Err(CounterError::Frozen(self.id));
            }
            Ok(())
        }

        async fn handle_action(
            &mut self,
            action: CounterAction,
            _ctx: &(),
        ) -> Result<bool, Self::Error> {
            match action {
                CounterAction::Freeze => {
                    let changed = !self.frozen;
                    self.frozen = true;
                    Ok(changed)
                }
            }
        }
    }

    fn spawn_counter_actor() -> ResourceClient<Counter> {
        let (actor, client) = ResourceActor::<Counter>::new(10);
        tokio::spawn(actor.run(()));
        client
    }

    #[tokio::test]
    async fn test_resource_actor_lifecycle() {
        let client = spawn_counter_actor();

        let id = client.create(CounterCreate { label: "a".into() }).await.unwrap();
        assert_eq!(id, 1);

        let updated = client.update(id, CounterUpdate { value: 7 }).await.unwrap();
        assert_eq!(updated.value, 7);

        assert!(client.perform_action(id, CounterAction::Freeze).await.unwrap());
        assert!(!client.perform_action(id, CounterAction::Freeze).await.unwrap());

        let stored = client.get(id).await.unwrap().unwrap();
        assert!(stored.frozen);
        assert!(client.get(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejected_update_leaves_entity_untouched() {
        let client = spawn_counter_actor();
        let id = client.create(CounterCreate { label: "a".into() }).await.unwrap();
        client.update(id, CounterUpdate { value: 3 }).await.unwrap();
        client.perform_action(id, CounterAction::Freeze).await.unwrap();

        let err = client.update(id, CounterUpdate { value: 50 }).await.unwrap_err();
        assert!(matches!(err, FrameworkError::EntityError(_)));
        assert_eq!(client.get(id).await.unwrap().unwrap().value, 3);
    }

    #[tokio::test]
    async fn test_missing_entity_and_rejected_create() {
        let client = spawn_counter_actor();

        let err = client.update(42, CounterUpdate { value: 1 }).await.unwrap_err();
        assert!(matches!(err, FrameworkError::NotFound(id) if id == "42"));

        let err = client.create(CounterCreate { label: String::new() }).await.unwrap_err();
        assert!(matches!(err, FrameworkError::EntityError(_)));
    }

    #[tokio::test]
    async fn test_list_pages_in_id_order() {
        let client = spawn_counter_actor();
        for label in ["a", "b", "c", "d", "e"] {
            client.create(CounterCreate { label: label.into() }).await.unwrap();
        }

        let first = client.list(None, 2).await.unwrap();
        assert_eq!(first.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2]);

        let second = client.list(Some(2), 2).await.unwrap();
        assert_eq!(second.iter().map(|c| c.id).collect::<Vec<_>>(), vec![3, 4]);

        let last = client.list(Some(4), 2).await.unwrap();
        assert_eq!(last.iter().map(|c| c.label.as_str()).collect::<Vec<_>>(), vec!["e"]);

        assert!(client.list(Some(5), 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_client_reports_closed_actor() {
        let (actor, client) = ResourceActor::<Counter>::new(1);
        drop(actor);
        let err = client.get(1).await.unwrap_err();
        assert!(matches!(err, FrameworkError::ActorClosed));
    }
}
