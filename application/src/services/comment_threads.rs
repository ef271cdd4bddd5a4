//! Comment thread store
//!
//! Threads are created lazily on the first comment for a DTU and locked per
//! DTU. A comment-id → DTU-id index lets edit/resolve/react find the owning
//! thread without scanning every thread. Audit events are emitted while the
//! thread lock is held.

use super::ServiceContext;
use crate::config::CommentPolicy;
use crate::store::{KeyedStore, lock};
use collab_domain::{
    CollabError, CollabResult, Comment, CommentId, CommentNode, CommentThread, DtuId, UserId,
    validate_comment_text,
};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Options for reading a thread
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentQuery {
    /// Nest replies under their parents instead of a flat list
    pub tree: bool,
    /// Flat mode only; defaults to the configured limit
    pub limit: Option<usize>,
}

impl CommentQuery {
    pub fn flat(limit: Option<usize>) -> Self {
        Self { tree: false, limit }
    }

    pub fn tree() -> Self {
        Self {
            tree: true,
            limit: None,
        }
    }
}

/// Result of [`CommentThreadStore::list`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommentListing {
    Flat(Vec<Comment>),
    Tree(Vec<CommentNode>),
}

impl CommentListing {
    /// Number of top-level entries
    pub fn len(&self) -> usize {
        match self {
            CommentListing::Flat(comments) => comments.len(),
            CommentListing::Tree(roots) => roots.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct CommentThreadStore {
    threads: KeyedStore<DtuId, CommentThread>,
    locations: RwLock<HashMap<CommentId, DtuId>>,
    policy: CommentPolicy,
    ctx: ServiceContext,
}

impl CommentThreadStore {
    pub fn new(policy: CommentPolicy, ctx: ServiceContext) -> Self {
        Self {
            threads: KeyedStore::new(),
            locations: RwLock::new(HashMap::new()),
            policy,
            ctx,
        }
    }

    pub fn add(
        &self,
        dtu_id: &DtuId,
        author: &UserId,
        text: impl Into<String>,
        parent_id: Option<CommentId>,
    ) -> CollabResult<Comment> {
        let text = text.into();
        validate_comment_text(&text, self.policy.max_length)?;

        // A reply needs an existing thread; don't create one just to fail.
        let entry = match &parent_id {
            Some(parent) => self.threads.get(dtu_id).ok_or_else(|| {
                CollabError::NotFound(format!(
                    "Parent comment '{}' does not exist on DTU '{}'",
                    parent, dtu_id
                ))
            })?,
            None => self
                .threads
                .get_or_insert_with(dtu_id, || CommentThread::new(dtu_id.clone(), self.ctx.now())),
        };

        let mut thread = lock(&entry);
        let comment = thread
            .append(
                CommentId::generate(),
                author.clone(),
                text,
                parent_id,
                self.policy.max_reply_depth,
                self.ctx.now(),
            )?
            .clone();
        self.locations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(comment.id.clone(), dtu_id.clone());

        debug!("Comment {} added to DTU {} by {}", comment.id, dtu_id, author);
        self.ctx.audit(
            "comment_added",
            json!({
                "comment_id": comment.id,
                "dtu_id": dtu_id,
                "author_id": author,
                "parent_id": comment.parent_id,
            }),
        );
        Ok(comment)
    }

    /// Read a DTU's comments. A DTU without comments yields an empty listing.
    pub fn list(&self, dtu_id: &DtuId, query: CommentQuery) -> CommentListing {
        let limit = query.limit.unwrap_or(self.policy.default_limit);
        let listing = self.threads.with(dtu_id, |thread| {
            if query.tree {
                CommentListing::Tree(thread.tree())
            } else {
                CommentListing::Flat(thread.flat(limit))
            }
        });

        listing.unwrap_or(if query.tree {
            CommentListing::Tree(Vec::new())
        } else {
            CommentListing::Flat(Vec::new())
        })
    }

    /// Number of comments ever added to a DTU's thread
    pub fn count(&self, dtu_id: &DtuId) -> usize {
        self.threads
            .with(dtu_id, |thread| thread.comment_count)
            .unwrap_or(0)
    }

    pub fn edit(
        &self,
        comment_id: &CommentId,
        editor: &UserId,
        new_text: impl Into<String>,
    ) -> CollabResult<Comment> {
        let new_text = new_text.into();
        let max_length = self.policy.max_length;
        let now = self.ctx.now();
        self.with_comment(comment_id, |comment| {
            comment.edit(editor, new_text, max_length, now)?;
            debug!("Comment {} edited by {}", comment_id, editor);
            self.ctx.audit(
                "comment_edited",
                json!({
                    "comment_id": comment_id,
                    "editor_id": editor,
                    "revision": comment.edit_history.len(),
                }),
            );
            Ok(comment.clone())
        })
    }

    /// Mark a comment resolved. Replies are left untouched.
    pub fn resolve(&self, comment_id: &CommentId) -> CollabResult<Comment> {
        let now = self.ctx.now();
        self.with_comment(comment_id, |comment| {
            if comment.resolve(now) {
                debug!("Comment {} resolved", comment_id);
                self.ctx
                    .audit("comment_resolved", json!({ "comment_id": comment_id }));
            }
            Ok(comment.clone())
        })
    }

    pub fn react(
        &self,
        comment_id: &CommentId,
        user: &UserId,
        emoji: &str,
    ) -> CollabResult<Comment> {
        self.with_comment(comment_id, |comment| {
            comment.react(emoji)?;
            self.ctx.audit(
                "comment_reaction",
                json!({ "comment_id": comment_id, "user_id": user, "emoji": emoji.trim() }),
            );
            Ok(comment.clone())
        })
    }

    fn with_comment<R>(
        &self,
        comment_id: &CommentId,
        f: impl FnOnce(&mut Comment) -> CollabResult<R>,
    ) -> CollabResult<R> {
        let dtu_id = self
            .locations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(comment_id)
            .cloned()
            .ok_or_else(|| CollabError::not_found("comment", comment_id))?;

        self.threads
            .with(&dtu_id, |thread| match thread.get_mut(comment_id) {
                Some(comment) => f(comment),
                None => Err(CollabError::not_found("comment", comment_id)),
            })
            .unwrap_or_else(|| Err(CollabError::not_found("comment", comment_id)))
    }
}
