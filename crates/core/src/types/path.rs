//! Hierarchical document-store paths.
//!
//! Paths alternate collection and document segments:
//!
//! ```text
//! designs                      collection
//! designs/{designId}           document
//! users/{userId}/drafts        collection
//! users/{userId}/wishlist/{id} document
//! ```
//!
//! A collection path always has an odd number of segments and a document
//! path an even number. Segments are non-empty and never contain `/`.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::id::{DesignId, UserId};

/// A document body: a JSON object of top-level fields.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Root collection holding every user's sub-collections.
pub const USERS: &str = "users";
/// Per-user sub-collection of saved drafts.
pub const DRAFTS: &str = "drafts";
/// Per-user sub-collection of wishlist snapshots.
pub const WISHLIST: &str = "wishlist";
/// Global catalog collection.
pub const DESIGNS: &str = "designs";

/// Errors that can occur when building or parsing a path.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path string is empty.
    #[error("path cannot be empty")]
    Empty,
    /// A segment is empty (leading, trailing, or doubled `/`).
    #[error("path `{0}` contains an empty segment")]
    EmptySegment(String),
    /// An ID used as a segment contains `/`.
    #[error("segment `{0}` must not contain '/'")]
    InvalidSegment(String),
    /// The number of segments does not match the path kind.
    #[error("`{path}` is not a {expected} path")]
    WrongDepth {
        /// The offending path.
        path: String,
        /// The kind that was expected (`collection` or `document`).
        expected: &'static str,
    },
}

fn check_segment(segment: &str) -> Result<(), PathError> {
    if segment.is_empty() {
        return Err(PathError::EmptySegment(segment.to_owned()));
    }
    if segment.contains('/') {
        return Err(PathError::InvalidSegment(segment.to_owned()));
    }
    Ok(())
}

fn count_segments(path: &str) -> Result<usize, PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }
    let mut count = 0;
    for segment in path.split('/') {
        if segment.is_empty() {
            return Err(PathError::EmptySegment(path.to_owned()));
        }
        count += 1;
    }
    Ok(count)
}

/// Path of a collection, e.g. `users/u1/drafts`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionPath(String);

impl CollectionPath {
    /// Parse a collection path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty, has an empty segment, or has an
    /// even number of segments.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if count_segments(s)? % 2 == 0 {
            return Err(PathError::WrongDepth {
                path: s.to_owned(),
                expected: "collection",
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// The global catalog collection.
    #[must_use]
    pub fn designs() -> Self {
        Self(DESIGNS.to_owned())
    }

    /// `users/{user}/drafts`.
    ///
    /// # Errors
    ///
    /// Returns an error if the user ID is not a valid segment.
    pub fn user_drafts(user: &UserId) -> Result<Self, PathError> {
        Self::user_collection(user, DRAFTS)
    }

    /// `users/{user}/wishlist`.
    ///
    /// # Errors
    ///
    /// Returns an error if the user ID is not a valid segment.
    pub fn user_wishlist(user: &UserId) -> Result<Self, PathError> {
        Self::user_collection(user, WISHLIST)
    }

    fn user_collection(user: &UserId, name: &str) -> Result<Self, PathError> {
        check_segment(user.as_str())?;
        Ok(Self(format!("{USERS}/{user}/{name}")))
    }

    /// Path of the document `id` inside this collection.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not a valid segment.
    pub fn document(&self, id: &str) -> Result<DocumentPath, PathError> {
        check_segment(id)?;
        Ok(DocumentPath {
            path: format!("{}/{id}", self.0),
            split: self.0.len(),
        })
    }

    /// The path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `path` is a direct child document of this collection.
    #[must_use]
    pub fn contains(&self, path: &DocumentPath) -> bool {
        path.collection_str() == self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CollectionPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CollectionPath> for String {
    fn from(path: CollectionPath) -> Self {
        path.0
    }
}

/// Path of a single document, e.g. `users/u1/wishlist/d1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentPath {
    path: String,
    /// Byte offset of the final `/`.
    split: usize,
}

impl DocumentPath {
    /// Parse a document path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty, has an empty segment, or has an
    /// odd number of segments.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let wrong_depth = || PathError::WrongDepth {
            path: s.to_owned(),
            expected: "document",
        };
        if count_segments(s)? % 2 != 0 {
            return Err(wrong_depth());
        }
        let split = s.rfind('/').ok_or_else(wrong_depth)?;
        Ok(Self {
            path: s.to_owned(),
            split,
        })
    }

    /// `designs/{design}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the design ID is not a valid segment.
    pub fn design(design: &DesignId) -> Result<Self, PathError> {
        CollectionPath::designs().document(design.as_str())
    }

    /// `users/{user}/wishlist/{design}`.
    ///
    /// # Errors
    ///
    /// Returns an error if either ID is not a valid segment.
    pub fn wishlist_entry(user: &UserId, design: &DesignId) -> Result<Self, PathError> {
        CollectionPath::user_wishlist(user)?.document(design.as_str())
    }

    /// The final segment: the document's ID within its collection.
    #[must_use]
    pub fn id(&self) -> &str {
        self.path.get(self.split + 1..).unwrap_or_default()
    }

    /// The collection containing this document.
    #[must_use]
    pub fn collection(&self) -> CollectionPath {
        CollectionPath(self.collection_str().to_owned())
    }

    fn collection_str(&self) -> &str {
        self.path.get(..self.split).unwrap_or_default()
    }

    /// The path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl TryFrom<String> for DocumentPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DocumentPath> for String {
    fn from(path: DocumentPath) -> Self {
        path.path
    }
}
