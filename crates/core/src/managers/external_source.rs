use std::fmt;

use serde::{Deserialize, Serialize};

use super::ResourceLedger;
use crate::Result;

/// External source media bound to a cookie at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSourceInfo {
    pub cookie: u32,
    pub name: String,
}

impl ExternalSourceInfo {
    pub fn new(cookie: u32, name: impl Into<String>) -> Self {
        Self {
            cookie,
            name: name.into(),
        }
    }
}

pub trait ExternalSourceManager: Send + Sync + fmt::Debug {
    fn load_external_source(&self, source: &ExternalSourceInfo) -> Result<()>;
    fn unload_external_source(&self, cookie: u32) -> Result<()>;
    fn is_loaded(&self, cookie: u32) -> bool;
    fn loaded_ids(&self) -> Vec<u32>;
}

#[derive(Debug)]
pub struct DefaultExternalSourceManager {
    ledger: ResourceLedger,
}

impl DefaultExternalSourceManager {
    pub fn new() -> Self {
        Self {
            ledger: ResourceLedger::new("external source"),
        }
    }
}

impl Default for DefaultExternalSourceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ExternalSourceManager for DefaultExternalSourceManager {
    fn load_external_source(&self, source: &ExternalSourceInfo) -> Result<()> {
        self.ledger.acquire(source.cookie, &source.name);
        Ok(())
    }

    fn unload_external_source(&self, cookie: u32) -> Result<()> {
        self.ledger.release(cookie).map(|_| ())
    }

    fn is_loaded(&self, cookie: u32) -> bool {
        self.ledger.contains(cookie)
    }

    fn loaded_ids(&self) -> Vec<u32> {
        self.ledger.ids()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_sources_by_cookie() {
        let manager = DefaultExternalSourceManager::new();
        manager
            .load_external_source(&ExternalSourceInfo::new(20, "voice_intro.wem"))
            .unwrap();
        manager
            .load_external_source(&ExternalSourceInfo::new(10, "voice_outro.wem"))
            .unwrap();

        assert_eq!(manager.loaded_ids(), vec![10, 20]);
        manager.unload_external_source(20).unwrap();
        assert!(!manager.is_loaded(20));
        assert!(manager.unload_external_source(20).is_err());
    }
}
