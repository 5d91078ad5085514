//! Nullable identity directory — a fixed name-to-party table.

use async_trait::async_trait;
use ehr_flows::IdentityService;
use ehr_types::{Party, PartyName, PublicKey};
use std::collections::HashMap;
use std::sync::Mutex;

/// An in-memory identity directory for testing.
pub struct NullDirectory {
    parties: Mutex<HashMap<PartyName, Party>>,
}

impl NullDirectory {
    pub fn new() -> Self {
        Self {
            parties: Mutex::new(HashMap::new()),
        }
    }

    /// Make `party` resolvable by its name.
    pub fn register(&self, party: Party) {
        self.parties
            .lock()
            .unwrap()
            .insert(party.name.clone(), party);
    }

    pub fn parties(&self) -> Vec<Party> {
        let mut parties: Vec<Party> = self.parties.lock().unwrap().values().cloned().collect();
        parties.sort_by(|a, b| a.name.cmp(&b.name));
        parties
    }
}

impl Default for NullDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityService for NullDirectory {
    async fn resolve(&self, name: &PartyName) -> Option<Party> {
        self.parties.lock().unwrap().get(name).cloned()
    }

    async fn party_from_key(&self, key: &PublicKey) -> Option<Party> {
        self.parties
            .lock()
            .unwrap()
            .values()
            .find(|p| &p.key == key)
            .cloned()
    }
}
