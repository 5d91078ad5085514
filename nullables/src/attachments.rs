//! Nullable attachment store — content-addressed bytes in memory.

use async_trait::async_trait;
use ehr_crypto::hash_attachment;
use ehr_flows::{AttachmentError, AttachmentStore};
use ehr_types::AttachmentRef;
use std::collections::HashMap;
use std::sync::Mutex;

/// An in-memory attachment store with a size limit.
pub struct NullAttachments {
    blobs: Mutex<HashMap<AttachmentRef, Vec<u8>>>,
    max_size: usize,
}

impl NullAttachments {
    pub const DEFAULT_MAX_SIZE: usize = 16 * 1024 * 1024;

    pub fn new(max_size: usize) -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
            max_size,
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NullAttachments {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_SIZE)
    }
}

#[async_trait]
impl AttachmentStore for NullAttachments {
    async fn store(&self, content: Vec<u8>) -> Result<AttachmentRef, AttachmentError> {
        if content.len() > self.max_size {
            return Err(AttachmentError::TooLarge {
                size: content.len(),
                limit: self.max_size,
            });
        }
        let reference = hash_attachment(&content);
        self.blobs.lock().unwrap().insert(reference, content);
        Ok(reference)
    }

    async fn fetch(&self, reference: &AttachmentRef) -> Result<Vec<u8>, AttachmentError> {
        self.blobs
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or(AttachmentError::NotFound(*reference))
    }
}
