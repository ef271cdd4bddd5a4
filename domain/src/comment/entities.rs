//! Comment entities

use crate::core::error::{CollabError, CollabResult};
use crate::core::ids::{CommentId, DtuId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Maximum comment length in UTF-16 code units.
pub const MAX_COMMENT_LENGTH: usize = 5000;

/// Default number of comments returned by a flat listing.
pub const DEFAULT_COMMENT_LIMIT: usize = 50;

/// Deepest reply nesting accepted. Top-level comments are depth 0.
pub const MAX_REPLY_DEPTH: usize = 64;

/// Validate comment text: non-empty and at most `max_length` long.
///
/// Length is measured in UTF-16 code units, the unit browser clients count
/// in, so a character outside the BMP (most emoji) counts as two.
pub fn validate_comment_text(text: &str, max_length: usize) -> CollabResult<()> {
    if text.trim().is_empty() {
        return Err(CollabError::validation("Comment text cannot be empty"));
    }
    let length = text.encode_utf16().count();
    if length > max_length {
        return Err(CollabError::validation(format!(
            "Comment text is {} characters, maximum is {}",
            length, max_length
        )));
    }
    Ok(())
}

/// A prior version of a comment's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentEdit {
    pub text: String,
    pub replaced_at: DateTime<Utc>,
}

/// A single comment on a DTU (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub dtu_id: DtuId,
    pub author_id: UserId,
    pub text: String,
    pub parent_id: Option<CommentId>,
    /// Reply nesting level, 0 for a top-level comment.
    #[serde(default)]
    pub depth: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub reactions: BTreeMap<String, u64>,
    pub resolved: bool,
    pub edit_history: Vec<CommentEdit>,
}

impl Comment {
    /// Replace the text, keeping the previous version in `edit_history`.
    ///
    /// Only the original author may edit.
    pub fn edit(
        &mut self,
        editor: &UserId,
        new_text: impl Into<String>,
        max_length: usize,
        now: DateTime<Utc>,
    ) -> CollabResult<()> {
        if editor != &self.author_id {
            return Err(CollabError::Forbidden(format!(
                "Only the author can edit comment '{}'",
                self.id
            )));
        }
        let new_text = new_text.into();
        validate_comment_text(&new_text, max_length)?;

        let previous = std::mem::replace(&mut self.text, new_text);
        self.edit_history.push(CommentEdit {
            text: previous,
            replaced_at: now,
        });
        self.updated_at = now;
        Ok(())
    }

    /// Mark resolved. Returns `false` if it already was.
    pub fn resolve(&mut self, now: DateTime<Utc>) -> bool {
        if self.resolved {
            return false;
        }
        self.resolved = true;
        self.updated_at = now;
        true
    }

    /// Increment the counter for `emoji`, returning the new count.
    pub fn react(&mut self, emoji: &str) -> CollabResult<u64> {
        let emoji = emoji.trim();
        if emoji.is_empty() {
            return Err(CollabError::validation("Reaction cannot be empty"));
        }
        let count = self.reactions.entry(emoji.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// A comment with its replies nested beneath it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// Number of comments in this subtree, including the root.
    pub fn size(&self) -> usize {
        let mut size = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            size += 1;
            pending.extend(node.replies.iter());
        }
        size
    }
}

/// All comments on one DTU, in submission order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentThread {
    pub dtu_id: DtuId,
    comments: Vec<Comment>,
    pub comment_count: usize,
    pub created_at: DateTime<Utc>,
}

impl CommentThread {
    pub fn new(dtu_id: DtuId, now: DateTime<Utc>) -> Self {
        Self {
            dtu_id,
            comments: Vec::new(),
            comment_count: 0,
            created_at: now,
        }
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn get(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| &c.id == id)
    }

    pub fn get_mut(&mut self, id: &CommentId) -> Option<&mut Comment> {
        self.comments.iter_mut().find(|c| &c.id == id)
    }

    /// Timestamp for the next append, never earlier than the last one.
    pub fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.comments.last() {
            Some(last) if last.created_at > now => last.created_at,
            _ => now,
        }
    }

    /// Append a new comment.
    ///
    /// A parent, if given, must already be in this thread, and the reply may
    /// nest at most `max_depth` levels below a top-level comment.
    pub fn append(
        &mut self,
        id: CommentId,
        author_id: UserId,
        text: String,
        parent_id: Option<CommentId>,
        max_depth: usize,
        now: DateTime<Utc>,
    ) -> CollabResult<&Comment> {
        let depth = match &parent_id {
            Some(parent) => {
                let parent = self.get(parent).ok_or_else(|| {
                    CollabError::NotFound(format!(
                        "Parent comment '{}' does not exist on DTU '{}'",
                        parent, self.dtu_id
                    ))
                })?;
                parent.depth + 1
            }
            None => 0,
        };
        if depth > max_depth {
            return Err(CollabError::validation(format!(
                "Replies nest at most {} levels deep",
                max_depth
            )));
        }

        let created_at = self.next_timestamp(now);
        self.comments.push(Comment {
            id,
            dtu_id: self.dtu_id.clone(),
            author_id,
            text,
            parent_id,
            depth,
            created_at,
            updated_at: created_at,
            reactions: BTreeMap::new(),
            resolved: false,
            edit_history: Vec::new(),
        });
        self.comment_count += 1;
        Ok(&self.comments[self.comments.len() - 1])
    }

    /// Comments ascending by creation time, truncated to `limit`.
    pub fn flat(&self, limit: usize) -> Vec<Comment> {
        let mut sorted: Vec<&Comment> = self.comments.iter().collect();
        sorted.sort_by_key(|c| c.created_at);
        sorted.into_iter().take(limit).cloned().collect()
    }

    /// Parent→children forest rooted at comments without a parent.
    ///
    /// Built bottom-up with an explicit stack, so reply depth never grows
    /// the call stack.
    pub fn tree(&self) -> Vec<CommentNode> {
        let mut sorted: Vec<&Comment> = self.comments.iter().collect();
        sorted.sort_by_key(|c| c.created_at);

        let position: HashMap<&CommentId, usize> =
            sorted.iter().enumerate().map(|(i, c)| (&c.id, i)).collect();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); sorted.len()];
        let mut roots = Vec::new();
        for (i, comment) in sorted.iter().enumerate() {
            match comment.parent_id.as_ref().and_then(|p| position.get(p)) {
                Some(&parent) => children[parent].push(i),
                None => roots.push(i),
            }
        }

        let mut built: Vec<Option<CommentNode>> = vec![None; sorted.len()];
        let mut stack: Vec<(usize, bool)> = roots.iter().rev().map(|&i| (i, false)).collect();
        while let Some((i, expanded)) = stack.pop() {
            if expanded {
                let replies = children[i]
                    .iter()
                    .filter_map(|&child| built[child].take())
                    .collect();
                built[i] = Some(CommentNode {
                    comment: sorted[i].clone(),
                    replies,
                });
            } else {
                stack.push((i, true));
                stack.extend(children[i].iter().map(|&child| (child, false)));
            }
        }

        roots.into_iter().filter_map(|i| built[i].take()).collect()
    }
}
