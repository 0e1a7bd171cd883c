//! Core library for the audio file handler.
//!
//! A [`ManagerRegistry`] owns the sound bank, external source and media
//! managers, a file cache and a background [`ExecutionQueue`] for bank work.
//! Each is built lazily on first request, exactly once, and torn down in a
//! fixed order when the registry shuts down.

pub mod cache;
pub mod config;
pub mod error;
pub mod host;
pub mod managers;
pub mod queue;
pub mod registry;

pub use cache::{CacheStats, CachedFile, FileCache, LocalFileCache};
pub use config::{FileCacheConfig, HandlerConfig, QueueConfig, TaskPriority};
pub use error::{FileHandlerError, Result};
pub use host::{ExitSignal, HostExitProbe, NeverExiting};
pub use managers::{
    DefaultExternalSourceManager, DefaultMediaManager, DefaultSoundBankManager,
    ExternalSourceInfo, ExternalSourceManager, MediaInfo, MediaManager, SoundBankInfo,
    SoundBankManager,
};
pub use queue::{ExecutionQueue, QueueState};
pub use registry::{LockStats, ManagerFactories, ManagerRegistry, RegistryPhase};
