//! Change event translator
//!
//! Turns raw change signals ("some key changed, here are the old and new
//! stored strings") into namespaced [`ChangeEvent`]s carrying decoded values,
//! and delivers them to the listeners registered for that key.
//!
//! The translator starts `Unregistered` and moves to `Registered` exactly once,
//! when `init` hands it the context's signal inbox. It never goes back.
//!
//! Raw signals only arrive for writes made by *other* contexts. A context's
//! own writes are never echoed to its own listeners.

use crate::events::{
    ChangeEvent, DispatchReport, Listener, ListenerId, ListenerRegistry, Topic,
    CLEAR_EVENT_SUFFIX,
};
use crosstab_core::{RawChangeSignal, SignalReceiver, StoreError, StoreResult, Value, ValueCodec};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, warn};

/// Registration state of the translator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslatorState {
    /// `init` has not run; no signals are received
    Unregistered,
    /// Receiving signals for the given application namespace
    Registered {
        /// Application name events are prefixed with
        app_name: String,
    },
}

/// Per-context translator from raw signals to namespaced change events.
pub struct ChangeTranslator {
    codec: Arc<dyn ValueCodec>,
    state: RwLock<TranslatorState>,
    inbox: AsyncMutex<Option<SignalReceiver>>,
    listeners: ListenerRegistry,
}

impl ChangeTranslator {
    /// Create an unregistered translator decoding with `codec`.
    pub fn new(codec: Arc<dyn ValueCodec>) -> Self {
        Self {
            codec,
            state: RwLock::new(TranslatorState::Unregistered),
            inbox: AsyncMutex::new(None),
            listeners: ListenerRegistry::new(),
        }
    }

    /// Current registration state.
    pub fn state(&self) -> TranslatorState {
        self.state.read().clone()
    }

    /// Start receiving signals from `inbox` under `app_name`.
    ///
    /// Returns `false` without changing anything if already registered.
    pub fn register(&self, app_name: &str, inbox: SignalReceiver) -> bool {
        let mut state = self.state.write();
        if matches!(*state, TranslatorState::Registered { .. }) {
            return false;
        }
        match self.inbox.try_lock() {
            Ok(mut slot) => *slot = Some(inbox),
            Err(_) => return false,
        }
        *state = TranslatorState::Registered {
            app_name: app_name.to_string(),
        };
        debug!(app = app_name, "Change translator registered");
        true
    }

    /// Namespaced event name for `key`.
    pub fn event_name(&self, key: &str) -> StoreResult<String> {
        match &*self.state.read() {
            TranslatorState::Registered { app_name } => Ok(format!("{app_name}.{key}")),
            TranslatorState::Unregistered => Err(StoreError::NotInitialized),
        }
    }

    /// Register `listener` for changes to `key`.
    pub fn listen(&self, key: &str, listener: Listener) -> StoreResult<ListenerId> {
        let name = self.event_name(key)?;
        Ok(self.listeners.add(name, listener))
    }

    /// Register `listener` for whole-store clears.
    pub fn listen_clear(&self, listener: Listener) -> StoreResult<ListenerId> {
        self.event_name(CLEAR_EVENT_SUFFIX)?;
        Ok(self.listeners.add(Topic::Clear, listener))
    }

    /// Remove a listener registration.
    pub fn unlisten(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Number of listeners registered for `key`.
    pub fn listener_count(&self, key: &str) -> usize {
        self.event_name(key)
            .map_or(0, |name| self.listeners.count(name))
    }

    /// Build the change event for a raw signal.
    ///
    /// Undecodable old or new values are downgraded to missing so that one
    /// corrupt entry cannot break delivery.
    pub fn translate(&self, signal: RawChangeSignal) -> StoreResult<ChangeEvent> {
        let suffix = signal.key.as_deref().unwrap_or(CLEAR_EVENT_SUFFIX);
        let name = self.event_name(suffix)?;
        let from = self.decode_tolerant(&name, signal.old_raw.as_deref());
        let to = self.decode_tolerant(&name, signal.new_raw.as_deref());
        Ok(ChangeEvent::new(
            name,
            signal.key,
            from,
            to,
            signal.origin,
            signal.page,
        ))
    }

    /// Translate and deliver one raw signal.
    pub fn handle_signal(&self, signal: RawChangeSignal) -> StoreResult<DispatchReport> {
        let mut event = self.translate(signal)?;
        let report = self.listeners.dispatch(&mut event);
        debug!(
            event = event.name(),
            origin = %event.origin(),
            delivered = report.delivered,
            panicked = report.panicked,
            "Dispatched change event"
        );
        Ok(report)
    }

    /// Deliver every signal already waiting in the inbox, in arrival order.
    ///
    /// Returns the number of signals handled. Returns 0 if unregistered or if
    /// an async [`ChangeTranslator::process_next`] currently owns the inbox.
    pub fn process_pending(&self) -> usize {
        let mut handled = 0;
        loop {
            let signal = {
                let Ok(mut slot) = self.inbox.try_lock() else {
                    return handled;
                };
                let Some(inbox) = slot.as_mut() else {
                    return handled;
                };
                match inbox.try_recv() {
                    Ok(signal) => signal,
                    Err(_) => return handled,
                }
            };
            // The inbox lock is released before listeners run so they may
            // write to the store or pump again.
            if self.handle_signal(signal).is_ok() {
                handled += 1;
            }
        }
    }

    /// Wait for the next signal and deliver it.
    ///
    /// Returns `Ok(None)` once the origin has gone away.
    pub async fn process_next(&self) -> StoreResult<Option<DispatchReport>> {
        let signal = {
            let mut slot = self.inbox.lock().await;
            let inbox = slot.as_mut().ok_or(StoreError::NotInitialized)?;
            inbox.recv().await
        };
        match signal {
            Some(signal) => self.handle_signal(signal).map(Some),
            None => Ok(None),
        }
    }

    fn decode_tolerant(&self, event: &str, raw: Option<&str>) -> Option<Value> {
        match self.codec.decode_optional(raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(event, error = %err, "Undecodable value in change signal, treating as missing");
                None
            }
        }
    }
}

impl std::fmt::Debug for ChangeTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeTranslator")
            .field("state", &*self.state.read())
            .field("listeners", &self.listeners)
            .finish()
    }
}
