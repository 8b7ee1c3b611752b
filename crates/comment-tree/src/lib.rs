mod clock;
mod config;
mod file_storage;
mod forest;
pub(crate) mod model;
mod notify;
mod storage;
mod storage_lock;
mod store;

pub use clock::{Clock, SystemClock};
pub use comment_types::CommentId;
pub use config::{DEFAULT_STORAGE_KEY, StoreConfig, default_storage_dir};
pub use file_storage::FileStorage;
pub use model::{
    Comment, MAX_REPLIES, MAX_REPLIES_MESSAGE, Never, Node, NodeRef, NodeView, Reply, SubReply,
    View,
};
pub use notify::{LogNotifier, NoopRenderer, Notifier, Renderer};
pub use storage::{KeyValueStore, MemoryStorage};
pub use storage_lock::StorageLock;
pub use store::{CommentTreeStore, StoreBuilder};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Storage is locked by another session: {}", .path.display())]
    Locked { path: std::path::PathBuf },
    #[error("Invalid storage key: {key:?}")]
    InvalidKey { key: String },
    #[error("Config error: {message}")]
    Config { message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why a store operation left the tree unchanged.
///
/// None of these are fatal. Only `CapacityExceeded` is surfaced to the user,
/// through the store's [`Notifier`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Comment text is empty")]
    EmptyInput,
    #[error("Comment not found: {target}")]
    NotFound { target: NodeRef },
    #[error("Reply limit reached on {target}")]
    CapacityExceeded { target: NodeRef },
    #[error("Maximum reply depth reached at {target}")]
    DepthExceeded { target: NodeRef },
    #[error("No comment ids left")]
    IdsExhausted,
}
