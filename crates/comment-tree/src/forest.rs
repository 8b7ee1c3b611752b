use std::collections::HashSet;

use crate::model::{Comment, NodeRef, NodeView, Reply, SubReply, Subtree};
use crate::{CommentId, Rejection};

/// Index path of a node inside the forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Location {
    Comment(usize),
    Reply(usize, usize),
    SubReply(usize, usize, usize),
}

/// Find the node `target` addresses.
///
/// Without a `reply_id` this is the top-level comment. With one, the reply is
/// searched for among the comment's direct replies first, then one level down.
pub(crate) fn locate(forest: &[Comment], target: NodeRef) -> Option<Location> {
    let ci = forest.iter().position(|c| c.id == target.comment_id)?;
    let Some(reply_id) = target.reply_id else {
        return Some(Location::Comment(ci));
    };

    let comment = &forest[ci];
    if let Some(ri) = comment.replies.iter().position(|r| r.id == reply_id) {
        return Some(Location::Reply(ci, ri));
    }
    comment.replies.iter().enumerate().find_map(|(ri, reply)| {
        reply
            .replies
            .iter()
            .position(|s| s.id == reply_id)
            .map(|si| Location::SubReply(ci, ri, si))
    })
}

pub(crate) fn node_at(forest: &[Comment], location: Location) -> NodeView<'_> {
    match location {
        Location::Comment(ci) => NodeView::Comment(&forest[ci]),
        Location::Reply(ci, ri) => NodeView::Reply(&forest[ci].replies[ri]),
        Location::SubReply(ci, ri, si) => {
            NodeView::SubReply(&forest[ci].replies[ri].replies[si])
        }
    }
}

/// Check that the node at `location` can take one more reply.
pub(crate) fn check_reply(
    forest: &[Comment],
    location: Location,
    target: NodeRef,
) -> Result<(), Rejection> {
    let node = node_at(forest, location);
    if let NodeView::SubReply(_) = node {
        return Err(Rejection::DepthExceeded { target });
    }
    if !node.accepts_reply() {
        return Err(Rejection::CapacityExceeded { target });
    }
    Ok(())
}

/// Append a reply below the node at `location`.
pub(crate) fn append_reply(
    forest: &mut [Comment],
    location: Location,
    target: NodeRef,
    id: CommentId,
    text: String,
    timestamp: String,
) -> Result<(), Rejection> {
    check_reply(forest, location, target)?;
    match location {
        Location::Comment(ci) => forest[ci].replies.push(Reply::new(id, text, timestamp)),
        Location::Reply(ci, ri) => forest[ci].replies[ri]
            .replies
            .push(SubReply::new(id, text, timestamp)),
        Location::SubReply(..) => return Err(Rejection::DepthExceeded { target }),
    }
    Ok(())
}

/// Add one like to the node at `location`, returning its new count.
pub(crate) fn like_at(forest: &mut [Comment], location: Location) -> u32 {
    let likes = match location {
        Location::Comment(ci) => &mut forest[ci].likes,
        Location::Reply(ci, ri) => &mut forest[ci].replies[ri].likes,
        Location::SubReply(ci, ri, si) => &mut forest[ci].replies[ri].replies[si].likes,
    };
    *likes = likes.saturating_add(1);
    *likes
}

/// Remove the node at `location` with its subtree. Returns the ids of every
/// removed node, the target first.
pub(crate) fn remove_at(forest: &mut Vec<Comment>, location: Location) -> Vec<CommentId> {
    let mut removed = Vec::new();
    match location {
        Location::Comment(ci) => forest.remove(ci).collect_ids(&mut removed),
        Location::Reply(ci, ri) => forest[ci].replies.remove(ri).collect_ids(&mut removed),
        Location::SubReply(ci, ri, si) => forest[ci].replies[ri]
            .replies
            .remove(si)
            .collect_ids(&mut removed),
    }
    removed
}

/// Stable sort of the top level by timestamp. Replies keep their order.
pub(crate) fn sort_by_date(forest: &mut [Comment], newest_first: bool) {
    forest.sort_by(|a, b| {
        if newest_first {
            b.timestamp.cmp(&a.timestamp)
        } else {
            a.timestamp.cmp(&b.timestamp)
        }
    });
}

/// Stable sort of the top level by number of direct replies.
pub(crate) fn sort_by_reply_count(forest: &mut [Comment], most_replies_first: bool) {
    forest.sort_by(|a, b| {
        if most_replies_first {
            b.replies.len().cmp(&a.replies.len())
        } else {
            a.replies.len().cmp(&b.replies.len())
        }
    });
}

pub(crate) fn node_count(forest: &[Comment]) -> usize {
    forest.iter().map(Subtree::node_count).sum()
}

pub(crate) fn all_ids(forest: &[Comment]) -> Vec<CommentId> {
    let mut ids = Vec::new();
    for comment in forest {
        comment.collect_ids(&mut ids);
    }
    ids
}

/// Check the invariants that deserialization alone cannot: unique ids across
/// the whole forest and the reply cap on every node.
pub(crate) fn validate(forest: &[Comment]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for id in all_ids(forest) {
        if !seen.insert(id) {
            return Err(format!("duplicate comment id {}", id));
        }
    }
    if let Some(comment) = forest.iter().find(|c| !c.within_reply_cap()) {
        return Err(format!("comment {} exceeds the reply limit", comment.id));
    }
    Ok(())
}
