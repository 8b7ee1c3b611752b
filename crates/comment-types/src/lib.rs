mod comment_id;

pub use comment_id::CommentId;
