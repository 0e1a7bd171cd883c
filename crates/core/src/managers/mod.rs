//! Resource managers handed out by the registry.
//!
//! Each manager tracks what is currently loaded with reference counts: a
//! resource loaded twice must be unloaded twice before it goes away.

mod external_source;
mod media;
mod sound_bank;

use std::collections::BTreeMap;

use parking_lot::Mutex;
use tracing::debug;

use crate::{FileHandlerError, Result};

pub use external_source::{DefaultExternalSourceManager, ExternalSourceInfo, ExternalSourceManager};
pub use media::{DefaultMediaManager, MediaInfo, MediaManager};
pub use sound_bank::{DefaultSoundBankManager, SoundBankInfo, SoundBankManager};

#[derive(Debug)]
struct LedgerEntry {
    name: String,
    refs: usize,
}

/// Reference-counted record of loaded resources of one kind.
#[derive(Debug)]
pub(crate) struct ResourceLedger {
    kind: &'static str,
    entries: Mutex<BTreeMap<u32, LedgerEntry>>,
}

impl ResourceLedger {
    pub(crate) fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Adds a reference and returns the new count.
    pub(crate) fn acquire(&self, id: u32, name: &str) -> usize {
        let mut entries = self.entries.lock();
        let entry = entries.entry(id).or_insert_with(|| LedgerEntry {
            name: name.to_string(),
            refs: 0,
        });
        entry.refs += 1;
        if entry.refs == 1 {
            debug!(kind = self.kind, id, name, "loaded");
        }
        entry.refs
    }

    /// Drops a reference and returns the remaining count.
    pub(crate) fn release(&self, id: u32) -> Result<usize> {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(&id) else {
            return Err(FileHandlerError::NotLoaded {
                kind: self.kind,
                id,
            });
        };

        entry.refs -= 1;
        let remaining = entry.refs;
        if remaining == 0 {
            if let Some(entry) = entries.remove(&id) {
                debug!(kind = self.kind, id, name = %entry.name, "unloaded");
            }
        }
        Ok(remaining)
    }

    pub(crate) fn contains(&self, id: u32) -> bool {
        self.entries.lock().contains_key(&id)
    }

    pub(crate) fn ids(&self) -> Vec<u32> {
        self.entries.lock().keys().copied().collect()
    }
}
