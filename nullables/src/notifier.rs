//! Nullable notifier — record notices instead of delivering them.

use async_trait::async_trait;
use ehr_flows::{Notifier, TransportError};
use ehr_types::{Party, PublicKey};
use std::collections::HashSet;
use std::sync::Mutex;

/// A notifier that records every notice, optionally failing for some parties.
pub struct NullNotifier {
    delivered: Mutex<Vec<(Party, String)>>,
    failing: Mutex<HashSet<PublicKey>>,
}

impl NullNotifier {
    pub fn new() -> Self {
        Self {
            delivered: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Make every notice to `key` fail.
    pub fn fail_for(&self, key: PublicKey) {
        self.failing.lock().unwrap().insert(key);
    }

    /// Every notice delivered so far (for assertions).
    pub fn delivered(&self) -> Vec<(Party, String)> {
        self.delivered.lock().unwrap().clone()
    }
}

impl Default for NullNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, party: &Party, text: &str) -> Result<(), TransportError> {
        if self.failing.lock().unwrap().contains(&party.key) {
            return Err(TransportError::Unreachable(party.to_string()));
        }
        self.delivered
            .lock()
            .unwrap()
            .push((party.clone(), text.to_string()));
        Ok(())
    }
}
