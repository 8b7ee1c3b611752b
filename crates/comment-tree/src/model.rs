use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::CommentId;

/// Most replies a single node may hold.
pub const MAX_REPLIES: usize = 3;

/// Message handed to the notifier when a reply hits [`MAX_REPLIES`].
pub const MAX_REPLIES_MESSAGE: &str = "Maximum 3 levels of replies are allowed.";

/// A comment or reply. `R` is the type of its children, which fixes how deep
/// the tree below it can grow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node<R> {
    pub id: CommentId,
    pub text: String,
    /// RFC 3339 UTC with millisecond precision. Fixed width, so string order is
    /// chronological order.
    pub timestamp: String,
    pub likes: u32,
    /// Children in insertion order. Never longer than [`MAX_REPLIES`].
    #[serde(default = "Vec::new")]
    pub replies: Vec<R>,
}

/// Child type of the deepest level. Uninhabited, so a [`SubReply`] can never
/// hold replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Never {}

/// Top-level comment (depth 0).
pub type Comment = Node<Reply>;
/// Reply to a top-level comment (depth 1).
pub type Reply = Node<SubReply>;
/// Reply to a reply (depth 2). The last level.
pub type SubReply = Node<Never>;

impl<R> Node<R> {
    pub(crate) fn new(id: CommentId, text: String, timestamp: String) -> Self {
        Self {
            id,
            text,
            timestamp,
            likes: 0,
            replies: Vec::new(),
        }
    }

    pub fn has_reply_capacity(&self) -> bool {
        self.replies.len() < MAX_REPLIES
    }
}

/// Structural queries shared by every level of the tree.
pub(crate) trait Subtree {
    /// This node plus all of its descendants.
    fn node_count(&self) -> usize;
    fn collect_ids(&self, ids: &mut Vec<CommentId>);
    fn within_reply_cap(&self) -> bool;
}

impl Subtree for Never {
    fn node_count(&self) -> usize {
        match *self {}
    }

    fn collect_ids(&self, _ids: &mut Vec<CommentId>) {
        match *self {}
    }

    fn within_reply_cap(&self) -> bool {
        match *self {}
    }
}

impl<R: Subtree> Subtree for Node<R> {
    fn node_count(&self) -> usize {
        1 + self.replies.iter().map(Subtree::node_count).sum::<usize>()
    }

    fn collect_ids(&self, ids: &mut Vec<CommentId>) {
        ids.push(self.id);
        for reply in &self.replies {
            reply.collect_ids(ids);
        }
    }

    fn within_reply_cap(&self) -> bool {
        self.replies.len() <= MAX_REPLIES && self.replies.iter().all(Subtree::within_reply_cap)
    }
}

/// Address of a node: a top-level comment, or a reply anywhere beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub comment_id: CommentId,
    pub reply_id: Option<CommentId>,
}

impl NodeRef {
    pub fn comment(comment_id: CommentId) -> Self {
        Self {
            comment_id,
            reply_id: None,
        }
    }

    pub fn reply(comment_id: CommentId, reply_id: CommentId) -> Self {
        Self {
            comment_id,
            reply_id: Some(reply_id),
        }
    }

    /// Id of the addressed node itself.
    pub fn node_id(self) -> CommentId {
        self.reply_id.unwrap_or(self.comment_id)
    }
}

impl std::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reply_id {
            Some(reply_id) => write!(f, "reply {} of comment {}", reply_id, self.comment_id),
            None => write!(f, "comment {}", self.comment_id),
        }
    }
}

/// Borrowed view of a single node at any depth.
#[derive(Debug, Clone, Copy)]
pub enum NodeView<'a> {
    Comment(&'a Comment),
    Reply(&'a Reply),
    SubReply(&'a SubReply),
}

impl<'a> NodeView<'a> {
    pub fn id(self) -> CommentId {
        match self {
            Self::Comment(node) => node.id,
            Self::Reply(node) => node.id,
            Self::SubReply(node) => node.id,
        }
    }

    pub fn text(self) -> &'a str {
        match self {
            Self::Comment(node) => &node.text,
            Self::Reply(node) => &node.text,
            Self::SubReply(node) => &node.text,
        }
    }

    pub fn timestamp(self) -> &'a str {
        match self {
            Self::Comment(node) => &node.timestamp,
            Self::Reply(node) => &node.timestamp,
            Self::SubReply(node) => &node.timestamp,
        }
    }

    pub fn likes(self) -> u32 {
        match self {
            Self::Comment(node) => node.likes,
            Self::Reply(node) => node.likes,
            Self::SubReply(node) => node.likes,
        }
    }

    pub fn reply_count(self) -> usize {
        match self {
            Self::Comment(node) => node.replies.len(),
            Self::Reply(node) => node.replies.len(),
            Self::SubReply(_) => 0,
        }
    }

    /// 0 for top-level comments, 1 or 2 for replies.
    pub fn depth(self) -> usize {
        match self {
            Self::Comment(_) => 0,
            Self::Reply(_) => 1,
            Self::SubReply(_) => 2,
        }
    }

    /// Whether this node can take another reply.
    pub fn accepts_reply(self) -> bool {
        match self {
            Self::Comment(node) => node.has_reply_capacity(),
            Self::Reply(node) => node.has_reply_capacity(),
            Self::SubReply(_) => false,
        }
    }
}

/// Read-only snapshot handed to a renderer after every state change.
///
/// `comments` is shared with the store until the next mutation, which
/// copies before writing; a `View` never changes once taken.
#[derive(Debug, Clone)]
pub struct View {
    pub comments: Arc<Vec<Comment>>,
    /// The node whose reply box is open, if any.
    pub reply_target: Option<NodeRef>,
    /// Direction of the last date sort. `true` shows newest first.
    pub newest_first: bool,
    /// Direction of the last reply-count sort. `true` shows most replies first.
    pub most_replies_first: bool,
}

impl View {
    pub fn is_replying_to(&self, target: NodeRef) -> bool {
        self.reply_target == Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: u64) -> CommentId {
        CommentId::new(value)
    }

    fn sample() -> Comment {
        let mut comment = Comment::new(id(1), "root".to_string(), "t1".to_string());
        let mut reply = Reply::new(id(2), "reply".to_string(), "t2".to_string());
        reply
            .replies
            .push(SubReply::new(id(3), "deep".to_string(), "t3".to_string()));
        comment.replies.push(reply);
        comment
            .replies
            .push(Reply::new(id(4), "second".to_string(), "t4".to_string()));
        comment
    }

    #[test]
    fn test_node_count_and_ids() {
        let comment = sample();
        assert_eq!(comment.node_count(), 4);

        let mut ids = Vec::new();
        comment.collect_ids(&mut ids);
        assert_eq!(ids, vec![id(1), id(2), id(3), id(4)]);
    }

    #[test]
    fn test_within_reply_cap() {
        let mut comment = sample();
        assert!(comment.within_reply_cap());

        for n in 10..12 {
            comment
                .replies
                .push(Reply::new(id(n), "more".to_string(), "t".to_string()));
        }
        assert_eq!(comment.replies.len(), 4);
        assert!(!comment.within_reply_cap());
    }

    #[test]
    fn test_serialized_shape() {
        let comment = sample();
        let json = serde_json::to_value(&comment).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["likes"], 0);
        assert_eq!(json["replies"][0]["replies"][0]["text"], "deep");
        assert_eq!(
            json["replies"][0]["replies"][0]["replies"],
            serde_json::json!([])
        );
    }

    #[test]
    fn test_missing_replies_field_defaults_to_empty() {
        let json = r#"{"id": 7, "text": "old", "timestamp": "t", "likes": 2}"#;
        let reply: Reply = serde_json::from_str(json).unwrap();
        assert_eq!(reply.likes, 2);
        assert!(reply.replies.is_empty());
    }

    #[test]
    fn test_sub_reply_with_children_is_rejected() {
        let json = r#"{"id": 7, "text": "x", "timestamp": "t", "likes": 0,
            "replies": [{"id": 8, "text": "y", "timestamp": "t", "likes": 0}]}"#;
        assert!(serde_json::from_str::<SubReply>(json).is_err());
    }

    #[test]
    fn test_node_ref_display() {
        assert_eq!(NodeRef::comment(id(5)).to_string(), "comment 5");
        assert_eq!(NodeRef::reply(id(5), id(6)).to_string(), "reply 6 of comment 5");
        assert_eq!(NodeRef::reply(id(5), id(6)).node_id(), id(6));
    }

    #[test]
    fn test_node_view_accepts_reply() {
        let comment = sample();
        assert!(NodeView::Comment(&comment).accepts_reply());
        assert_eq!(NodeView::Comment(&comment).reply_count(), 2);

        let sub = &comment.replies[0].replies[0];
        assert!(!NodeView::SubReply(sub).accepts_reply());
        assert_eq!(NodeView::SubReply(sub).depth(), 2);
    }
}
