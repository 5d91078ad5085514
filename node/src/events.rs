//! Fan-out of flow events to subscribers, and the notice inbox.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};

use ehr_flows::{FlowEvent, FlowObserver};
use ehr_types::{AgreementId, Clock, Party, Timestamp};
use serde::Serialize;

type Listener = Box<dyn Fn(&FlowEvent) + Send + Sync>;

/// Synchronous fan-out event bus for flow events.
///
/// Listeners are invoked inline on the emitting task; keep handlers fast to
/// avoid stalling flows.
pub struct EventBus {
    listeners: RwLock<Vec<Listener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, listener: Listener) {
        if let Ok(mut listeners) = self.listeners.write() {
            listeners.push(listener);
        }
    }

    pub fn emit(&self, event: &FlowEvent) {
        if let Ok(listeners) = self.listeners.read() {
            for listener in listeners.iter() {
                listener(event);
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowObserver for EventBus {
    fn on_event(&self, event: &FlowEvent) {
        self.emit(event);
    }
}

/// A notice another party sent to this one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub from: Party,
    pub agreement: Option<AgreementId>,
    pub text: String,
    pub received_at: Timestamp,
}

/// Bounded list of received notices, oldest dropped first.
pub struct Inbox {
    notices: Mutex<VecDeque<Notice>>,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl Inbox {
    pub fn new(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            notices: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
            clock,
        }
    }

    /// Keep the notice carried by `event`, if it carries one.
    pub fn observe(&self, event: &FlowEvent) {
        if let FlowEvent::NoticeReceived {
            from,
            agreement,
            text,
        } = event
        {
            self.push(Notice {
                from: from.clone(),
                agreement: *agreement,
                text: text.clone(),
                received_at: self.clock.now(),
            });
        }
    }

    pub fn push(&self, notice: Notice) {
        let Ok(mut notices) = self.notices.lock() else {
            return;
        };
        if notices.len() == self.capacity {
            notices.pop_front();
        }
        notices.push_back(notice);
    }

    /// Every held notice, oldest first.
    pub fn list(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|n| n.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.notices.lock().map(|n| n.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
