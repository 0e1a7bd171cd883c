use std::fmt;

use serde::{Deserialize, Serialize};

use super::ResourceLedger;
use crate::Result;

/// Identifies a sound bank to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundBankInfo {
    pub id: u32,
    pub name: String,
}

impl SoundBankInfo {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Loads and unloads sound banks.
///
/// Loading is usually serialized through the registry's bank execution
/// queue, but implementations must tolerate concurrent callers.
pub trait SoundBankManager: Send + Sync + fmt::Debug {
    fn load_sound_bank(&self, bank: &SoundBankInfo) -> Result<()>;
    fn unload_sound_bank(&self, bank_id: u32) -> Result<()>;
    fn is_loaded(&self, bank_id: u32) -> bool;
    fn loaded_ids(&self) -> Vec<u32>;
}

#[derive(Debug)]
pub struct DefaultSoundBankManager {
    ledger: ResourceLedger,
}

impl DefaultSoundBankManager {
    pub fn new() -> Self {
        Self {
            ledger: ResourceLedger::new("sound bank"),
        }
    }
}

impl Default for DefaultSoundBankManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundBankManager for DefaultSoundBankManager {
    fn load_sound_bank(&self, bank: &SoundBankInfo) -> Result<()> {
        self.ledger.acquire(bank.id, &bank.name);
        Ok(())
    }

    fn unload_sound_bank(&self, bank_id: u32) -> Result<()> {
        self.ledger.release(bank_id).map(|_| ())
    }

    fn is_loaded(&self, bank_id: u32) -> bool {
        self.ledger.contains(bank_id)
    }

    fn loaded_ids(&self) -> Vec<u32> {
        self.ledger.ids()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FileHandlerError;

    #[test]
    fn bank_stays_loaded_until_last_unload() {
        let manager = DefaultSoundBankManager::new();
        let init = SoundBankInfo::new(1355168291, "Init");

        manager.load_sound_bank(&init).unwrap();
        manager.load_sound_bank(&init).unwrap();
        manager.unload_sound_bank(init.id).unwrap();
        assert!(manager.is_loaded(init.id));

        manager.unload_sound_bank(init.id).unwrap();
        assert!(!manager.is_loaded(init.id));
        assert!(manager.loaded_ids().is_empty());
    }

    #[test]
    fn unloading_unknown_bank_fails() {
        let manager = DefaultSoundBankManager::new();
        let err = manager.unload_sound_bank(9).unwrap_err();
        assert!(matches!(
            err,
            FileHandlerError::NotLoaded {
                kind: "sound bank",
                id: 9
            }
        ));
    }
}
