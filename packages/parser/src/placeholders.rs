//! Substitution of PDI internal directory variables in file references.
//!
//! Job entries and executor steps reference other documents with paths like
//! `${Internal.Job.Filename.Directory}/load.ktr`. These placeholders always
//! mean "the directory of the referencing document", so they can be resolved
//! textually without a running PDI environment.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{NoExpand, Regex};

/// Internal directory variables, as they appear between `${` and `}`.
pub const INTERNAL_DIRECTORY_VARIABLES: &[&str] = &[
    "Internal.Job.Filename.Directory",
    "Internal.Transformation.Filename.Directory",
    "Internal.Entry.Current.Directory",
    "Internal.Current.Directory",
];

/// Matches any of [`INTERNAL_DIRECTORY_VARIABLES`].
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static INTERNAL_DIRECTORY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\$\{Internal\.(?:Job\.Filename|Transformation\.Filename|Entry\.Current|Current)\.Directory\}",
    )
    .expect("valid regex")
});

/// Matches any `${...}` placeholder.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ANY_PLACEHOLDER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{[^}]*\}").expect("valid regex"));

/// Resolve internal directory placeholders in `raw` against `base_dir`.
///
/// Purely textual. Returns `raw` unchanged when it holds no internal
/// directory placeholder; other placeholders are left in place.
///
/// # Examples
/// ```
/// use std::path::{Path, PathBuf};
/// use pdi_parser::placeholders::resolve;
///
/// assert_eq!(
///     resolve(Path::new("/etl/jobs"), "${Internal.Job.Filename.Directory}/load.ktr"),
///     PathBuf::from("/etl/jobs/load.ktr")
/// );
/// assert_eq!(
///     resolve(Path::new("/etl/jobs"), "/abs/other.kjb"),
///     PathBuf::from("/abs/other.kjb")
/// );
/// ```
pub fn resolve(base_dir: &Path, raw: &str) -> PathBuf {
    let base = base_dir.to_string_lossy();
    let base: Cow<'_, str> = if base.is_empty() {
        Cow::Borrowed(".")
    } else {
        Cow::Owned(base.trim_end_matches(['/', '\\']).to_string())
    };

    let resolved = INTERNAL_DIRECTORY_PATTERN.replace_all(raw, NoExpand(base.as_ref()));
    PathBuf::from(resolved.as_ref())
}

/// Whether `raw` still holds a `${...}` placeholder this module cannot resolve.
#[must_use]
pub fn has_unresolved_placeholder(raw: &str) -> bool {
    ANY_PLACEHOLDER_PATTERN
        .find_iter(raw)
        .any(|m| !INTERNAL_DIRECTORY_PATTERN.is_match(m.as_str()))
}
