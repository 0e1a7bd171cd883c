/// Result alias that carries the custom [`FileHandlerError`] type.
pub type Result<T> = std::result::Result<T, FileHandlerError>;

/// Common error type for the core crate.
///
/// The registry getters never surface these; they show up on the resources
/// the registry hands out (queues, caches and managers).
#[derive(Debug, thiserror::Error)]
pub enum FileHandlerError {
    /// Free-form message for conditions without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// The execution queue no longer accepts work.
    #[error("execution queue `{queue}` is closed")]
    QueueClosed { queue: String },
    /// A job accepted by the queue never signalled completion (it panicked).
    #[error("job on execution queue `{queue}` did not complete")]
    JobAbandoned { queue: String },
    /// The worker thread backing a queue could not be started.
    #[error("failed to spawn worker for execution queue `{queue}`: {source}")]
    WorkerSpawn {
        queue: String,
        #[source]
        source: std::io::Error,
    },
    /// An unload was requested for something that is not loaded.
    #[error("{kind} {id} is not loaded")]
    NotLoaded { kind: &'static str, id: u32 },
}

impl FileHandlerError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for FileHandlerError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}
