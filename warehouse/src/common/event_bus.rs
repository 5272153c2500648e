use crate::common::WAREHOUSE_EVENT;
use crate::errors::{ErrorKind, WarehouseError, WarehouseResult};
use basu::error::BasuError;
use basu::event::Event;
use basu::{EventBus, Handle, HandlerId};
use std::marker::PhantomData;
use std::sync::Arc;

/// Publishes and subscribes to events in the warehouse.
///
/// This struct manages an event bus that allows callers to register listeners
/// and receive notifications about insert events. It provides synchronous
/// event publishing and listener management, with a fast path when no
/// listener is registered.
///
/// # Example
///
/// ```ignore
/// let event_bus: WarehouseEventBus<E, L> = WarehouseEventBus::new();
/// let subscriber = event_bus.register(listener)?;
///
/// event_bus.publish(my_event)?;
///
/// event_bus.deregister(subscriber)?;
/// ```
#[derive(Clone)]
pub struct WarehouseEventBus<E, L> {
    inner: Arc<WarehouseEventBusInner<E, L>>,
}

impl<E, L> Default for WarehouseEventBus<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E, L> WarehouseEventBus<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    /// Creates a new event bus instance.
    pub fn new() -> Self {
        let inner = WarehouseEventBusInner::new();
        WarehouseEventBus {
            inner: Arc::new(inner),
        }
    }

    /// Registers an event listener with the bus.
    pub fn register(&self, listener: L) -> WarehouseResult<Option<SubscriberRef>> {
        self.inner.register(listener)
    }

    /// Deregisters a previously registered event listener.
    pub fn deregister(&self, subscriber: SubscriberRef) -> WarehouseResult<()> {
        self.inner.deregister(subscriber)
    }

    /// Publishes an event to all registered listeners.
    pub fn publish(&self, event: E) -> WarehouseResult<()> {
        self.inner.publish(event)
    }

    /// Closes the event bus and clears all registered listeners.
    pub fn close(&self) -> WarehouseResult<()> {
        self.inner.close()
    }

    /// Returns true if there are any registered listeners.
    pub fn has_listeners(&self) -> bool {
        self.inner.has_listeners()
    }
}

/// An opaque handle identifying a registered listener.
pub struct SubscriberRef {
    pub(crate) inner: HandlerId,
}

impl SubscriberRef {
    pub fn new(inner: HandlerId) -> Self {
        SubscriberRef { inner }
    }
}

/// Inner implementation of the event bus.
struct WarehouseEventBusInner<E, L> {
    event_bus: EventBus<E>,
    phantom_data: PhantomData<L>,
}

impl<E, L> WarehouseEventBusInner<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    fn new() -> Self {
        let event_bus = EventBus::new();
        WarehouseEventBusInner {
            event_bus,
            phantom_data: PhantomData,
        }
    }

    pub fn register(&self, listener: L) -> WarehouseResult<Option<SubscriberRef>> {
        let subscriber = self.event_bus.subscribe(WAREHOUSE_EVENT, Box::new(listener));
        match subscriber {
            Ok(subscriber) => Ok(Some(SubscriberRef::new(subscriber))),
            Err(e) => Err(Self::warehouse_error(e)),
        }
    }

    #[inline]
    pub fn deregister(&self, subscriber: SubscriberRef) -> WarehouseResult<()> {
        match self.event_bus.unsubscribe(WAREHOUSE_EVENT, &subscriber.inner) {
            Ok(_) => Ok(()),
            Err(e) => Err(Self::warehouse_error(e)),
        }
    }

    #[inline]
    pub fn publish(&self, event: E) -> WarehouseResult<()> {
        // Fast path: check if there are listeners before creating event
        let handler_count = match self.event_bus.get_handler_count(WAREHOUSE_EVENT) {
            Ok(count) => count,
            Err(e) => {
                // If event type not found, no listeners - early return
                if matches!(e, BasuError::EventTypeNotFOUND) {
                    return Ok(());
                }
                return Err(Self::warehouse_error(e));
            }
        };

        if handler_count == 0 {
            return Ok(());
        }

        let basu_event = Event::new(event);
        match self.event_bus.publish(WAREHOUSE_EVENT, &basu_event) {
            Ok(_) => Ok(()),
            Err(e) => Err(Self::warehouse_error(e)),
        }
    }

    #[inline]
    pub fn close(&self) -> WarehouseResult<()> {
        match self.event_bus.clear() {
            Ok(_) => Ok(()),
            Err(e) => Err(Self::warehouse_error(e)),
        }
    }

    #[inline]
    pub fn has_listeners(&self) -> bool {
        match self.event_bus.get_handler_count(WAREHOUSE_EVENT) {
            Ok(count) => count > 0,
            Err(e) => {
                if matches!(e, BasuError::EventTypeNotFOUND) {
                    false
                } else {
                    log::warn!("Failed to check listeners: {}, defaulting to false", e);
                    false
                }
            }
        }
    }

    #[inline]
    pub fn warehouse_error(e: BasuError) -> WarehouseError {
        match e {
            BasuError::EventTypeNotFOUND => WarehouseError::new(
                "Event bus error: the requested event type is not registered",
                ErrorKind::EventError,
            ),
            BasuError::MutexPoisoned => WarehouseError::new(
                "Event bus error: internal mutex poisoned - the event bus may be in an inconsistent state",
                ErrorKind::EventError,
            ),
            BasuError::HandlerError(e) => {
                let error_message = e
                    .source()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "Unknown error in event handler".to_string());
                WarehouseError::new(
                    &format!("Event handler error: {}", error_message),
                    ErrorKind::EventError,
                )
            }
        }
    }
}
