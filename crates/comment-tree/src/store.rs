use std::sync::Arc;

use crate::clock::{Clock, IdGenerator, SystemClock, format_timestamp};
use crate::config::StoreConfig;
use crate::file_storage::FileStorage;
use crate::forest;
use crate::model::{Comment, MAX_REPLIES_MESSAGE, NodeRef, NodeView, View};
use crate::notify::{LogNotifier, NoopRenderer, Notifier, Renderer};
use crate::storage::KeyValueStore;
use crate::{CommentId, Rejection, Result};

/// Owns a forest of comment threads and applies every change to it.
///
/// Each mutation validates first and then writes through `Arc::make_mut`, so a
/// [`View`] handed out earlier keeps showing the state it was taken from.
/// After each change the renderer gets a new view; after a change to the tree
/// itself (post, reply, delete, like) the forest is also written to storage
/// when persistence is enabled.
///
/// Operations never fail hard. A [`Rejection`] means the call was a no-op.
pub struct CommentTreeStore {
    comments: Arc<Vec<Comment>>,
    reply_target: Option<NodeRef>,
    newest_first: bool,
    most_replies_first: bool,
    persistence: Option<Persistence>,
    notifier: Box<dyn Notifier>,
    renderer: Box<dyn Renderer>,
    clock: Box<dyn Clock>,
    ids: IdGenerator,
}

/// Configures collaborators before the initial forest is loaded.
pub struct StoreBuilder {
    config: StoreConfig,
    storage: Option<Box<dyn KeyValueStore>>,
    notifier: Box<dyn Notifier>,
    renderer: Box<dyn Renderer>,
    clock: Box<dyn Clock>,
}

impl StoreBuilder {
    /// Storage backend to use when `persist_comments` is set. Without one,
    /// [`FileStorage`] is opened in the configured directory.
    pub fn storage(mut self, storage: impl KeyValueStore + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Load the initial forest and build the store.
    ///
    /// Only opening the default file storage can fail. Missing or unreadable
    /// stored data starts the store with an empty forest.
    pub fn build(self) -> Result<CommentTreeStore> {
        let persistence = if self.config.persist_comments {
            let storage: Box<dyn KeyValueStore> = match self.storage {
                Some(storage) => storage,
                None => Box::new(FileStorage::open(self.config.resolved_storage_dir()?)?),
            };
            Some(Persistence {
                storage,
                key: self.config.storage_key,
            })
        } else {
            if self.storage.is_some() {
                log::debug!("persistence disabled, ignoring configured storage");
            }
            None
        };

        let comments = persistence
            .as_ref()
            .map(Persistence::load)
            .unwrap_or_default();
        let mut ids = IdGenerator::default();
        for id in forest::all_ids(&comments) {
            ids.observe(id);
        }
        for comment in &comments {
            ids.observe_timestamp(&comment.timestamp);
        }

        Ok(CommentTreeStore {
            comments: Arc::new(comments),
            reply_target: None,
            newest_first: false,
            most_replies_first: false,
            persistence,
            notifier: self.notifier,
            renderer: self.renderer,
            clock: self.clock,
            ids,
        })
    }
}

struct Persistence {
    storage: Box<dyn KeyValueStore>,
    key: String,
}

impl Persistence {
    fn load(&self) -> Vec<Comment> {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                log::debug!("no stored comments under key {}", self.key);
                return Vec::new();
            }
            Err(err) => {
                log::warn!("failed to read stored comments under key {}: {}", self.key, err);
                return Vec::new();
            }
        };

        let comments: Vec<Comment> = match serde_json::from_str(&raw) {
            Ok(comments) => comments,
            Err(err) => {
                log::warn!("discarding unparsable comments under key {}: {}", self.key, err);
                return Vec::new();
            }
        };
        if let Err(problem) = forest::validate(&comments) {
            log::warn!("discarding stored comments under key {}: {}", self.key, problem);
            return Vec::new();
        }

        log::info!(
            "loaded {} comments from storage key {}",
            comments.len(),
            self.key
        );
        comments
    }

    /// Write-through. Failures are logged and the in-memory forest stays as is.
    fn flush(&mut self, comments: &[Comment]) {
        let json = match serde_json::to_string(comments) {
            Ok(json) => json,
            Err(err) => {
                log::error!("failed to serialize comments: {}", err);
                return;
            }
        };
        if let Err(err) = self.storage.set(&self.key, &json) {
            log::error!("failed to persist comments under key {}: {}", self.key, err);
        }
    }
}

impl Default for CommentTreeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentTreeStore {
    pub fn builder(config: StoreConfig) -> StoreBuilder {
        StoreBuilder {
            config,
            storage: None,
            notifier: Box::new(LogNotifier),
            renderer: Box::new(NoopRenderer),
            clock: Box::new(SystemClock),
        }
    }

    /// In-memory store with default collaborators and no persistence.
    pub fn new() -> Self {
        Self {
            comments: Arc::new(Vec::new()),
            reply_target: None,
            newest_first: false,
            most_replies_first: false,
            persistence: None,
            notifier: Box::new(LogNotifier),
            renderer: Box::new(NoopRenderer),
            clock: Box::new(SystemClock),
            ids: IdGenerator::default(),
        }
    }

    /// Store configured from `config` with default collaborators.
    pub fn open(config: StoreConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Append a new top-level comment.
    pub fn post(&mut self, text: &str) -> Result<CommentId, Rejection> {
        if text.trim().is_empty() {
            log::debug!("ignoring blank comment");
            return Err(Rejection::EmptyInput);
        }

        let (id, timestamp) = self.stamp()?;
        Arc::make_mut(&mut self.comments).push(Comment::new(id, text.to_string(), timestamp));
        log::debug!("posted comment {}", id);
        self.commit(true);
        Ok(id)
    }

    /// Reply to a top-level comment, or to one of its direct replies.
    ///
    /// A target that already holds the maximum number of replies is rejected
    /// and the notifier is told. A successful reply closes the reply box.
    pub fn reply(&mut self, target: NodeRef, text: &str) -> Result<CommentId, Rejection> {
        if text.trim().is_empty() {
            log::debug!("ignoring blank reply to {}", target);
            return Err(Rejection::EmptyInput);
        }
        let Some(location) = forest::locate(&self.comments, target) else {
            log::debug!("reply target {} not found", target);
            return Err(Rejection::NotFound { target });
        };

        match forest::check_reply(&self.comments, location, target) {
            Ok(()) => {}
            Err(rejection @ Rejection::CapacityExceeded { .. }) => {
                log::warn!("{}", rejection);
                self.notifier.notify(MAX_REPLIES_MESSAGE);
                return Err(rejection);
            }
            Err(rejection) => {
                log::warn!("{}", rejection);
                return Err(rejection);
            }
        }

        let (id, timestamp) = self.stamp()?;
        forest::append_reply(
            Arc::make_mut(&mut self.comments).as_mut_slice(),
            location,
            target,
            id,
            text.to_string(),
            timestamp,
        )?;
        self.reply_target = None;
        log::debug!("added reply {} to {}", id, target);
        self.commit(true);
        Ok(id)
    }

    /// Remove a node and its whole subtree. Returns how many nodes went away.
    pub fn delete(&mut self, target: NodeRef) -> Result<usize, Rejection> {
        let Some(location) = forest::locate(&self.comments, target) else {
            log::debug!("delete target {} not found", target);
            return Err(Rejection::NotFound { target });
        };

        let removed = forest::remove_at(Arc::make_mut(&mut self.comments), location);
        if let Some(pending) = self.reply_target {
            if removed.contains(&pending.node_id()) {
                self.reply_target = None;
            }
        }
        log::debug!("deleted {} ({} nodes)", target, removed.len());
        self.commit(true);
        Ok(removed.len())
    }

    /// Add a like to a node. Returns the new like count.
    pub fn like(&mut self, target: NodeRef) -> Result<u32, Rejection> {
        let Some(location) = forest::locate(&self.comments, target) else {
            log::debug!("like target {} not found", target);
            return Err(Rejection::NotFound { target });
        };

        let likes = forest::like_at(
            Arc::make_mut(&mut self.comments).as_mut_slice(),
            location,
        );
        self.commit(true);
        Ok(likes)
    }

    /// Open the reply box on `target`, or close it if it is already open there.
    pub fn toggle_reply_target(&mut self, target: NodeRef) {
        self.reply_target = if self.reply_target == Some(target) {
            None
        } else {
            Some(target)
        };
        self.commit(false);
    }

    /// Flip the date direction and reorder the top level by it.
    pub fn sort_by_date(&mut self) {
        self.newest_first = !self.newest_first;
        forest::sort_by_date(
            Arc::make_mut(&mut self.comments).as_mut_slice(),
            self.newest_first,
        );
        self.commit(false);
    }

    /// Flip the reply-count direction and reorder the top level by it.
    pub fn sort_by_reply_count(&mut self) {
        self.most_replies_first = !self.most_replies_first;
        forest::sort_by_reply_count(
            Arc::make_mut(&mut self.comments).as_mut_slice(),
            self.most_replies_first,
        );
        self.commit(false);
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Shared handle to the current forest. Later mutations do not affect it.
    pub fn snapshot(&self) -> Arc<Vec<Comment>> {
        Arc::clone(&self.comments)
    }

    pub fn view(&self) -> View {
        View {
            comments: self.snapshot(),
            reply_target: self.reply_target,
            newest_first: self.newest_first,
            most_replies_first: self.most_replies_first,
        }
    }

    pub fn get(&self, target: NodeRef) -> Option<NodeView<'_>> {
        forest::locate(&self.comments, target)
            .map(|location| forest::node_at(&self.comments, location))
    }

    /// Total number of comments and replies at every depth.
    pub fn node_count(&self) -> usize {
        forest::node_count(&self.comments)
    }

    pub fn reply_target(&self) -> Option<NodeRef> {
        self.reply_target
    }

    pub fn is_replying_to(&self, target: NodeRef) -> bool {
        self.reply_target == Some(target)
    }

    /// Whether `target` exists and can take another reply.
    pub fn can_reply(&self, target: NodeRef) -> bool {
        self.get(target).is_some_and(NodeView::accepts_reply)
    }

    pub fn newest_first(&self) -> bool {
        self.newest_first
    }

    pub fn most_replies_first(&self) -> bool {
        self.most_replies_first
    }

    pub fn is_persistent(&self) -> bool {
        self.persistence.is_some()
    }

    fn stamp(&mut self) -> Result<(CommentId, String), Rejection> {
        let now = self.clock.now();
        let Some((id, created)) = self.ids.next(now) else {
            log::error!("comment id space is exhausted");
            return Err(Rejection::IdsExhausted);
        };
        Ok((id, format_timestamp(created)))
    }

    fn commit(&mut self, persist: bool) {
        if persist {
            if let Some(persistence) = self.persistence.as_mut() {
                persistence.flush(&self.comments);
            }
        }
        let view = self.view();
        self.renderer.render(&view);
    }
}
