//! Lazily populated registry of the file-handling managers.
//!
//! Every slot follows the same double-checked pattern: an unlocked fast path
//! for slots that are already populated, then a shared lock re-check, then an
//! exclusive lock under which the slot is checked once more and constructed.
//! Slots are published through atomic swaps so an unlocked reader never sees
//! a half-built value.
//!
//! One coarse [`RwLock`] covers all five slots together with the lifecycle
//! phase. Shutdown holds it exclusively while releasing the slots in a fixed
//! order.

mod factories;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, trace, warn};

use crate::{
    ExecutionQueue, ExternalSourceManager, FileCache, HandlerConfig, HostExitProbe, MediaManager,
    NeverExiting, SoundBankManager,
};

pub use factories::{
    instantiate_bank_execution_queue, instantiate_external_source_manager,
    instantiate_file_cache, instantiate_media_manager, instantiate_sound_bank_manager,
    ExecutionQueueFactory, ExternalSourceManagerFactory, FileCacheFactory, ManagerFactories,
    MediaManagerFactory, SoundBankManagerFactory,
};

const SOUND_BANK_MANAGER: &str = "SoundBank Manager";
const EXTERNAL_SOURCE_MANAGER: &str = "External Source Manager";
const MEDIA_MANAGER: &str = "Media Manager";
const FILE_CACHE: &str = "File Cache";
const BANK_EXECUTION_QUEUE: &str = "Bank Execution Queue";

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Lifecycle of a [`ManagerRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryPhase {
    Created,
    Running,
    ShutDown,
}

/// Lock traffic of the resource getters since the registry was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockStats {
    pub read_locks: u64,
    pub write_locks: u64,
    pub constructions: u64,
}

#[derive(Debug, Default)]
struct LockCounters {
    read_locks: AtomicU64,
    write_locks: AtomicU64,
    constructions: AtomicU64,
}

impl LockCounters {
    fn snapshot(&self) -> LockStats {
        LockStats {
            read_locks: self.read_locks.load(Ordering::Relaxed),
            write_locks: self.write_locks.load(Ordering::Relaxed),
            constructions: self.constructions.load(Ordering::Relaxed),
        }
    }
}

/// Atomically published, optionally empty handle.
struct Slot<T: ?Sized> {
    cell: ArcSwapOption<Arc<T>>,
}

impl<T: ?Sized> Slot<T> {
    fn empty() -> Self {
        Self {
            cell: ArcSwapOption::empty(),
        }
    }

    fn load(&self) -> Option<Arc<T>> {
        self.cell.load().as_deref().cloned()
    }

    fn is_populated(&self) -> bool {
        self.cell.load().is_some()
    }

    fn store(&self, value: Arc<T>) {
        self.cell.store(Some(Arc::new(value)));
    }

    fn take(&self) -> Option<Arc<T>> {
        self.cell
            .swap(None)
            .map(|outer| Arc::try_unwrap(outer).unwrap_or_else(|shared| Arc::clone(&*shared)))
    }
}

/// Owns the sound bank, external source and media managers, the file cache
/// and the bank execution queue, creating each on first use.
///
/// # Example
/// ```no_run
/// # use file_handler_core::{HandlerConfig, ManagerRegistry, SoundBankInfo};
/// let registry = ManagerRegistry::new(HandlerConfig::default());
/// registry.startup();
///
/// if let (Some(queue), Some(banks)) = (
///     registry.bank_execution_queue(),
///     registry.sound_bank_manager(),
/// ) {
///     queue.enqueue(move || {
///         let _ = banks.load_sound_bank(&SoundBankInfo::new(1, "Init"));
///     })?;
/// }
///
/// registry.shutdown();
/// assert!(registry.sound_bank_manager().is_none());
/// # Ok::<(), file_handler_core::FileHandlerError>(())
/// ```
pub struct ManagerRegistry {
    config: HandlerConfig,
    host: Box<dyn HostExitProbe>,
    factories: ManagerFactories,
    lock: RwLock<RegistryPhase>,
    // Raised at the start of shutdown; getters observing it return empty.
    shutting_down: AtomicBool,
    counters: LockCounters,
    sound_bank_manager: Slot<dyn SoundBankManager>,
    external_source_manager: Slot<dyn ExternalSourceManager>,
    media_manager: Slot<dyn MediaManager>,
    file_cache: Slot<dyn FileCache>,
    bank_execution_queue: Slot<ExecutionQueue>,
}

impl ManagerRegistry {
    /// Creates an empty registry for a host that never signals exit.
    pub fn new(config: HandlerConfig) -> Self {
        Self::with_host(config, NeverExiting)
    }

    pub fn with_host(config: HandlerConfig, host: impl HostExitProbe + 'static) -> Self {
        Self::with_factories(config, host, ManagerFactories::default())
    }

    pub fn with_factories(
        config: HandlerConfig,
        host: impl HostExitProbe + 'static,
        factories: ManagerFactories,
    ) -> Self {
        Self {
            config,
            host: Box::new(host),
            factories,
            lock: RwLock::new(RegistryPhase::Created),
            shutting_down: AtomicBool::new(false),
            counters: LockCounters::default(),
            sound_bank_manager: Slot::empty(),
            external_source_manager: Slot::empty(),
            media_manager: Slot::empty(),
            file_cache: Slot::empty(),
            bank_execution_queue: Slot::empty(),
        }
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Current lifecycle phase. Reports `ShutDown` as soon as shutdown has
    /// begun, without waiting for it to finish.
    pub fn phase(&self) -> RegistryPhase {
        self.try_read_lock("phase")
            .map_or(RegistryPhase::ShutDown, |phase| *phase)
    }

    pub fn lock_stats(&self) -> LockStats {
        self.counters.snapshot()
    }

    /// Marks the registry as running. Slots are still populated lazily.
    pub fn startup(&self) {
        let Some(mut phase) = self.try_write_lock("startup") else {
            warn!("ignoring startup of a registry that is shutting down");
            return;
        };
        match *phase {
            RegistryPhase::Created => {
                *phase = RegistryPhase::Running;
                debug!("file handler registry started");
            }
            RegistryPhase::Running => trace!("file handler registry already running"),
            RegistryPhase::ShutDown => warn!("ignoring startup of a registry that was shut down"),
        }
    }

    pub fn sound_bank_manager(&self) -> Option<Arc<dyn SoundBankManager>> {
        self.get_or_instantiate(&self.sound_bank_manager, SOUND_BANK_MANAGER, || {
            Some((self.factories.sound_bank_manager)())
        })
    }

    pub fn external_source_manager(&self) -> Option<Arc<dyn ExternalSourceManager>> {
        self.get_or_instantiate(
            &self.external_source_manager,
            EXTERNAL_SOURCE_MANAGER,
            || Some((self.factories.external_source_manager)()),
        )
    }

    pub fn media_manager(&self) -> Option<Arc<dyn MediaManager>> {
        self.get_or_instantiate(&self.media_manager, MEDIA_MANAGER, || {
            Some((self.factories.media_manager)())
        })
    }

    pub fn file_cache(&self) -> Option<Arc<dyn FileCache>> {
        self.get_or_instantiate(&self.file_cache, FILE_CACHE, || {
            Some((self.factories.file_cache)(&self.config.file_cache))
        })
    }

    /// Returns the queue that serializes bank work.
    ///
    /// Unlike the managers, the queue is never created once the host has
    /// requested exit: its worker thread would outlive anyone able to join it.
    pub fn bank_execution_queue(&self) -> Option<Arc<ExecutionQueue>> {
        self.get_or_instantiate(&self.bank_execution_queue, BANK_EXECUTION_QUEUE, || {
            if self.host.is_exit_requested() {
                debug!(resource = BANK_EXECUTION_QUEUE, "host is exiting; not creating");
                return None;
            }
            match (self.factories.bank_execution_queue)(&self.config.bank_queue) {
                Ok(queue) => Some(Arc::new(queue)),
                Err(err) => {
                    error!(resource = BANK_EXECUTION_QUEUE, %err, "construction failed");
                    None
                }
            }
        })
    }

    /// Releases every slot in dependency order and refuses further
    /// construction.
    ///
    /// Holds the exclusive lock throughout, including while the bank
    /// execution queue drains its backlog. Getters that miss the fast path
    /// while this runs return `None`. Calling it again, from any thread and
    /// even while the first call is still draining the queue, is a no-op.
    pub fn shutdown(&self) {
        let Some(mut phase) = self.try_write_lock("shutdown") else {
            trace!("file handler registry already shutting down");
            return;
        };
        if *phase == RegistryPhase::ShutDown {
            trace!("file handler registry already shut down");
            return;
        }
        self.shutting_down.store(true, Ordering::Release);

        release(&self.sound_bank_manager, SOUND_BANK_MANAGER);
        release(&self.external_source_manager, EXTERNAL_SOURCE_MANAGER);
        release(&self.media_manager, MEDIA_MANAGER);
        release(&self.file_cache, FILE_CACHE);
        if let Some(queue) = self.bank_execution_queue.take() {
            debug!("Shutting down {BANK_EXECUTION_QUEUE}.");
            queue.close_and_delete();
        }

        *phase = RegistryPhase::ShutDown;
        debug!("file handler registry shut down");
    }

    fn get_or_instantiate<T, F>(
        &self,
        slot: &Slot<T>,
        resource: &'static str,
        instantiate: F,
    ) -> Option<Arc<T>>
    where
        T: ?Sized,
        F: FnOnce() -> Option<Arc<T>>,
    {
        if !self.host.is_exit_requested() {
            if let Some(value) = slot.load() {
                return Some(value);
            }
        }

        {
            let _phase = self.try_read_lock(resource)?;
            self.counters.read_locks.fetch_add(1, Ordering::Relaxed);
            if let Some(value) = slot.load() {
                return Some(value);
            }
        }

        let phase = self.try_write_lock(resource)?;
        self.counters.write_locks.fetch_add(1, Ordering::Relaxed);
        if *phase == RegistryPhase::ShutDown {
            trace!(resource, "registry is shut down; returning empty handle");
            return None;
        }
        if !slot.is_populated() {
            if let Some(value) = instantiate() {
                self.counters.constructions.fetch_add(1, Ordering::Relaxed);
                slot.store(value);
            }
        }
        slot.load()
    }

    // Every acquisition polls instead of blocking so that a job running on the
    // bank execution queue cannot wait on the lock shutdown holds while
    // joining that same queue. Returns `None` once shutdown has begun.
    fn try_read_lock(
        &self,
        resource: &'static str,
    ) -> Option<RwLockReadGuard<'_, RegistryPhase>> {
        loop {
            if self.shutting_down.load(Ordering::Acquire) {
                trace!(resource, "registry is shutting down");
                return None;
            }
            if let Some(guard) = self.lock.try_read_for(LOCK_POLL_INTERVAL) {
                return Some(guard);
            }
        }
    }

    fn try_write_lock(
        &self,
        resource: &'static str,
    ) -> Option<RwLockWriteGuard<'_, RegistryPhase>> {
        loop {
            if self.shutting_down.load(Ordering::Acquire) {
                trace!(resource, "registry is shutting down");
                return None;
            }
            if let Some(guard) = self.lock.try_write_for(LOCK_POLL_INTERVAL) {
                return Some(guard);
            }
        }
    }
}

fn release<T: ?Sized>(slot: &Slot<T>, resource: &'static str) {
    if let Some(value) = slot.take() {
        debug!("Shutting down {resource}.");
        drop(value);
    }
}

impl Drop for ManagerRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ManagerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagerRegistry")
            .field("config", &self.config)
            .field("sound_bank_manager", &self.sound_bank_manager.is_populated())
            .field("external_source_manager", &self.external_source_manager.is_populated())
            .field("media_manager", &self.media_manager.is_populated())
            .field("file_cache", &self.file_cache.is_populated())
            .field("bank_execution_queue", &self.bank_execution_queue.is_populated())
            .field("stats", &self.counters.snapshot())
            .finish()
    }
}
