//! Event recording for listener assertions

use crosstab::ChangeEvent;
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared log of change events seen by a listener.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<ChangeEvent>>>,
}

impl EventLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener that appends every event it sees to this log.
    pub fn listener(&self) -> impl Fn(&mut ChangeEvent) + Send + Sync + 'static {
        let events = self.events.clone();
        move |event: &mut ChangeEvent| events.lock().push(event.clone())
    }

    /// Copy of the recorded events.
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Most recent event.
    pub fn last(&self) -> Option<ChangeEvent> {
        self.events.lock().last().cloned()
    }
}
