use std::fmt;

use serde::{Deserialize, Serialize};

use super::ResourceLedger;
use crate::Result;

/// A media file (streamed or prefetched audio) referenced by banks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub id: u32,
    pub name: String,
}

impl MediaInfo {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

pub trait MediaManager: Send + Sync + fmt::Debug {
    fn load_media(&self, media: &MediaInfo) -> Result<()>;
    fn unload_media(&self, media_id: u32) -> Result<()>;
    fn is_loaded(&self, media_id: u32) -> bool;
    fn loaded_ids(&self) -> Vec<u32>;
}

#[derive(Debug)]
pub struct DefaultMediaManager {
    ledger: ResourceLedger,
}

impl DefaultMediaManager {
    pub fn new() -> Self {
        Self {
            ledger: ResourceLedger::new("media"),
        }
    }
}

impl Default for DefaultMediaManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaManager for DefaultMediaManager {
    fn load_media(&self, media: &MediaInfo) -> Result<()> {
        self.ledger.acquire(media.id, &media.name);
        Ok(())
    }

    fn unload_media(&self, media_id: u32) -> Result<()> {
        self.ledger.release(media_id).map(|_| ())
    }

    fn is_loaded(&self, media_id: u32) -> bool {
        self.ledger.contains(media_id)
    }

    fn loaded_ids(&self) -> Vec<u32> {
        self.ledger.ids()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn concurrent_loads_share_one_entry() {
        let manager = Arc::new(DefaultMediaManager::new());
        let loaders: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                thread::spawn(move || manager.load_media(&MediaInfo::new(5, "amb_forest.wem")))
            })
            .collect();
        for loader in loaders {
            loader.join().unwrap().unwrap();
        }

        assert_eq!(manager.loaded_ids(), vec![5]);
        for _ in 0..8 {
            manager.unload_media(5).unwrap();
        }
        assert!(!manager.is_loaded(5));
    }
}
