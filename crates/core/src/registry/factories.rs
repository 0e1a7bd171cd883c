use std::sync::Arc;

use tracing::debug;

use crate::{
    DefaultExternalSourceManager, DefaultMediaManager, DefaultSoundBankManager, ExecutionQueue,
    ExternalSourceManager, FileCache, FileCacheConfig, LocalFileCache, MediaManager, QueueConfig,
    Result, SoundBankManager,
};

pub type SoundBankManagerFactory = Box<dyn Fn() -> Arc<dyn SoundBankManager> + Send + Sync>;
pub type ExternalSourceManagerFactory =
    Box<dyn Fn() -> Arc<dyn ExternalSourceManager> + Send + Sync>;
pub type MediaManagerFactory = Box<dyn Fn() -> Arc<dyn MediaManager> + Send + Sync>;
pub type FileCacheFactory = Box<dyn Fn(&FileCacheConfig) -> Arc<dyn FileCache> + Send + Sync>;
pub type ExecutionQueueFactory =
    Box<dyn Fn(&QueueConfig) -> Result<ExecutionQueue> + Send + Sync>;

/// Construction hooks the registry calls the first time a slot is needed.
///
/// Defaults build the stock implementations; swap any subset to substitute
/// alternate backends or test doubles without touching the locking.
pub struct ManagerFactories {
    pub(crate) sound_bank_manager: SoundBankManagerFactory,
    pub(crate) external_source_manager: ExternalSourceManagerFactory,
    pub(crate) media_manager: MediaManagerFactory,
    pub(crate) file_cache: FileCacheFactory,
    pub(crate) bank_execution_queue: ExecutionQueueFactory,
}

impl ManagerFactories {
    pub fn new() -> Self {
        Self {
            sound_bank_manager: Box::new(instantiate_sound_bank_manager),
            external_source_manager: Box::new(instantiate_external_source_manager),
            media_manager: Box::new(instantiate_media_manager),
            file_cache: Box::new(instantiate_file_cache),
            bank_execution_queue: Box::new(instantiate_bank_execution_queue),
        }
    }

    pub fn with_sound_bank_manager<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn SoundBankManager> + Send + Sync + 'static,
    {
        self.sound_bank_manager = Box::new(factory);
        self
    }

    pub fn with_external_source_manager<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn ExternalSourceManager> + Send + Sync + 'static,
    {
        self.external_source_manager = Box::new(factory);
        self
    }

    pub fn with_media_manager<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn MediaManager> + Send + Sync + 'static,
    {
        self.media_manager = Box::new(factory);
        self
    }

    pub fn with_file_cache<F>(mut self, factory: F) -> Self
    where
        F: Fn(&FileCacheConfig) -> Arc<dyn FileCache> + Send + Sync + 'static,
    {
        self.file_cache = Box::new(factory);
        self
    }

    pub fn with_bank_execution_queue<F>(mut self, factory: F) -> Self
    where
        F: Fn(&QueueConfig) -> Result<ExecutionQueue> + Send + Sync + 'static,
    {
        self.bank_execution_queue = Box::new(factory);
        self
    }
}

impl Default for ManagerFactories {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ManagerFactories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagerFactories").finish_non_exhaustive()
    }
}

pub fn instantiate_sound_bank_manager() -> Arc<dyn SoundBankManager> {
    debug!("Initializing default SoundBank Manager.");
    Arc::new(DefaultSoundBankManager::new())
}

pub fn instantiate_external_source_manager() -> Arc<dyn ExternalSourceManager> {
    debug!("Initializing default External Source Manager.");
    Arc::new(DefaultExternalSourceManager::new())
}

pub fn instantiate_media_manager() -> Arc<dyn MediaManager> {
    debug!("Initializing default Media Manager.");
    Arc::new(DefaultMediaManager::new())
}

pub fn instantiate_file_cache(config: &FileCacheConfig) -> Arc<dyn FileCache> {
    debug!("Initializing default File Cache.");
    Arc::new(LocalFileCache::new(config))
}

pub fn instantiate_bank_execution_queue(config: &QueueConfig) -> Result<ExecutionQueue> {
    debug!("Initializing default Bank Execution Queue.");
    ExecutionQueue::new(config.name.clone(), config.priority)
}
