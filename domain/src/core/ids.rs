//! Identifier value objects
//!
//! - [`UserId`] and [`DtuId`] are supplied by external collaborators
//!   (the identity source and the DTU store) and never generated here.
//! - [`WorkspaceId`], [`CommentId`], [`ProposalId`] and [`SessionId`] are
//!   minted by the engine from random UUIDv4 values.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates the identifier from an existing string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

macro_rules! generated_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        string_id!($(#[$meta])* $name);

        impl $name {
            /// Generates a new unique identifier.
            pub fn generate() -> Self {
                Self(format!("{}_{}", $prefix, uuid::Uuid::new_v4().simple()))
            }
        }
    };
}

string_id!(
    /// Pre-authenticated user identifier.
    UserId
);

string_id!(
    /// Identifier of a knowledge unit in the external DTU store.
    DtuId
);

generated_id!(
    /// Unique identifier for a workspace.
    WorkspaceId,
    "ws"
);

generated_id!(
    /// Unique identifier for a comment.
    CommentId,
    "cm"
);

generated_id!(
    /// Unique identifier for a revision proposal.
    ProposalId,
    "rev"
);

generated_id!(
    /// Unique identifier for an edit session.
    SessionId,
    "es"
);
