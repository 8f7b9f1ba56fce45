//! Registry routing control presses to the handler of their message.

use crate::controller::{ComponentEvent, ComponentHandler, Outcome, Surface};
use crate::view::parse_scoped_id;
use api_cache::{CacheSweeper, Sweep, Timestamp, TtlCache};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Handlers keyed by session id, each live for a fixed time after registration.
pub struct ComponentRegistry {
    handlers: Arc<TtlCache<String, Arc<dyn ComponentHandler>>>,
    ttl: Duration,
}

impl ComponentRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            handlers: Arc::new(TtlCache::new("components")),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Register the handler for every control scoped to `session_id`.
    pub fn register(&self, session_id: impl Into<String>, handler: Arc<dyn ComponentHandler>) {
        self.handlers.put(session_id.into(), handler);
    }

    pub fn register_at(
        &self,
        session_id: impl Into<String>,
        handler: Arc<dyn ComponentHandler>,
        at: Timestamp,
    ) {
        self.handlers.put_at(session_id.into(), handler, at);
    }

    pub fn unregister(&self, session_id: &str) -> bool {
        self.handlers.remove(session_id).is_some()
    }

    /// Live handler for `session_id` at `now`.
    pub fn lookup(&self, session_id: &str, now: Timestamp) -> Option<Arc<dyn ComponentHandler>> {
        let entry = self.handlers.get_entry(session_id)?;
        if entry.is_expired(now, self.ttl) {
            return None;
        }
        Some(entry.value)
    }

    /// Route a press on `custom_id` to its handler. `values` holds the
    /// picked choices when the control is a select menu.
    ///
    /// Presses on unknown or expired messages are acknowledged and dropped.
    pub async fn dispatch(
        &self,
        custom_id: &str,
        actor_id: &str,
        values: &[String],
        surface: &dyn Surface,
    ) -> Outcome {
        self.dispatch_at(custom_id, actor_id, values, surface, Utc::now())
            .await
    }

    pub async fn dispatch_at(
        &self,
        custom_id: &str,
        actor_id: &str,
        values: &[String],
        surface: &dyn Surface,
        now: Timestamp,
    ) -> Outcome {
        let Some((session_id, control_id)) = parse_scoped_id(custom_id) else {
            debug!(custom_id, "Ignoring unscoped component id");
            return Outcome::Acknowledged;
        };
        let Some(handler) = self.lookup(session_id, now) else {
            debug!(session_id, "No live handler for component");
            return Outcome::Acknowledged;
        };

        let event = ComponentEvent {
            session_id: session_id.to_string(),
            control_id: control_id.to_string(),
            actor_id: actor_id.to_string(),
            values: values.to_vec(),
        };
        handler.handle(&event, surface).await
    }

    /// Register the handler table with a sweeper.
    pub fn register_sweep(&self, sweeper: &mut CacheSweeper) {
        sweeper.register("components", self.handlers.clone(), self.ttl);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
