//! Element path tracking for the streaming parser.
//!
//! The parser never builds a tree. Instead it keeps the stack of open element
//! names and compares the joined path against fixed absolute paths such as
//! `/transformation/info/description` to tell a document-level `description`
//! from a step-level one.

/// Join path segments into an absolute slash-delimited path.
///
/// # Examples
/// ```
/// use pdi_parser::path::join_path;
///
/// let segments = vec!["job".to_string(), "name".to_string()];
/// assert_eq!(join_path(&segments), "/job/name");
/// assert_eq!(join_path(&[]), "");
/// ```
pub fn join_path(segments: &[String]) -> String {
    let mut path = String::new();
    for segment in segments {
        path.push('/');
        path.push_str(segment);
    }
    path
}

/// Stack of currently open element names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathTracker {
    segments: Vec<String>,
}

impl PathTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter an element.
    pub fn push(&mut self, element: impl Into<String>) {
        self.segments.push(element.into());
    }

    /// Leave the most recently entered element.
    ///
    /// Returns `None` on underflow. Callers record that as a warning and carry
    /// on; it only happens on malformed input.
    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    /// Absolute path of the innermost open element, or `""` when empty.
    #[must_use]
    pub fn current_path(&self) -> String {
        join_path(&self.segments)
    }

    /// Number of open elements.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Drop all open elements, used after a stream was aborted mid-document.
    pub fn clear(&mut self) {
        self.segments.clear();
    }
}
