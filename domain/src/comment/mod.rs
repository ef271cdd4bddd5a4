//! Comment thread domain
//!
//! Threads are keyed by DTU and append-only: comments are never deleted,
//! only edited (with history) or marked resolved. Reply nesting is a
//! read-side projection built by [`CommentThread::tree`].

pub mod entities;

pub use entities::{
    Comment, CommentEdit, CommentNode, CommentThread, DEFAULT_COMMENT_LIMIT, MAX_COMMENT_LENGTH,
    MAX_REPLY_DEPTH, validate_comment_text,
};
