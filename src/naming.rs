//! Destination file names derived from source names.
//!
//! Two shapes of filename provider feed the builder:
//!
//! - [`Rename`]: a pure function from a source file name to a thumbnail name
//!   - `photo.jpg` + `PrefixDotThumbnail` → `thumbnail.photo.jpg`
//!   - `photo.jpg` + `SuffixHyphenThumbnail` → `photo-thumbnail.jpg`
//! - [`ConsecutiveNames`]: an endless numbered sequence
//!   (`thumb0.png`, `thumb1.png`, ...)
//!
//! Any other `Iterator<Item = PathBuf>` works as a name sequence too. A finite
//! one that runs out before the sources do is an error at that source.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const THUMBNAIL: &str = "thumbnail";

/// How a thumbnail's file name is derived from its source's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rename {
    NoChange,
    PrefixDotThumbnail,
    PrefixHyphenThumbnail,
    SuffixDotThumbnail,
    SuffixHyphenThumbnail,
    /// Prepend the string as is.
    Prefix(String),
    /// Insert the string before the extension.
    Suffix(String),
}

impl Rename {
    /// Parse a CLI name (`prefix-dot-thumbnail`) or `prefix:STR` / `suffix:STR`.
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(prefix) = name.strip_prefix("prefix:") {
            return Some(Rename::Prefix(prefix.to_string()));
        }
        if let Some(suffix) = name.strip_prefix("suffix:") {
            return Some(Rename::Suffix(suffix.to_string()));
        }
        match name {
            "no-change" => Some(Rename::NoChange),
            "prefix-dot-thumbnail" => Some(Rename::PrefixDotThumbnail),
            "prefix-hyphen-thumbnail" => Some(Rename::PrefixHyphenThumbnail),
            "suffix-dot-thumbnail" => Some(Rename::SuffixDotThumbnail),
            "suffix-hyphen-thumbnail" => Some(Rename::SuffixHyphenThumbnail),
            _ => None,
        }
    }

    /// Apply to a bare file name.
    ///
    /// Suffixes go before the last extension; a name without one (or a
    /// dotfile such as `.hidden`) gets the suffix at the end.
    pub fn apply(&self, file_name: &str) -> String {
        match self {
            Rename::NoChange => file_name.to_string(),
            Rename::PrefixDotThumbnail => format!("{THUMBNAIL}.{file_name}"),
            Rename::PrefixHyphenThumbnail => format!("{THUMBNAIL}-{file_name}"),
            Rename::SuffixDotThumbnail => insert_suffix(file_name, &format!(".{THUMBNAIL}")),
            Rename::SuffixHyphenThumbnail => insert_suffix(file_name, &format!("-{THUMBNAIL}")),
            Rename::Prefix(prefix) => format!("{prefix}{file_name}"),
            Rename::Suffix(suffix) => insert_suffix(file_name, suffix),
        }
    }

    /// Renamed sibling of `source` inside `directory`, or next to `source`
    /// when `directory` is `None`.
    pub fn apply_to_path(&self, source: &Path, directory: Option<&Path>) -> PathBuf {
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = directory
            .map(Path::to_path_buf)
            .or_else(|| source.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        dir.join(self.apply(&file_name))
    }
}

fn insert_suffix(file_name: &str, suffix: &str) -> String {
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => format!("{}{suffix}{}", &file_name[..dot], &file_name[dot..]),
        _ => format!("{file_name}{suffix}"),
    }
}

/// Endless `prefix{n}suffix` names in a directory, counting from zero.
///
/// ```
/// # use simple_thumbs::naming::ConsecutiveNames;
/// let mut names = ConsecutiveNames::new("out", "thumb", ".png");
/// assert_eq!(names.next().unwrap(), std::path::Path::new("out/thumb0.png"));
/// assert_eq!(names.next().unwrap(), std::path::Path::new("out/thumb1.png"));
/// ```
#[derive(Debug, Clone)]
pub struct ConsecutiveNames {
    directory: PathBuf,
    prefix: String,
    suffix: String,
    next: u64,
}

impl ConsecutiveNames {
    pub fn new(
        directory: impl Into<PathBuf>,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
            suffix: suffix.into(),
            next: 0,
        }
    }

    pub fn starting_at(mut self, first: u64) -> Self {
        self.next = first;
        self
    }
}

impl Iterator for ConsecutiveNames {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        let n = self.next;
        self.next = self.next.checked_add(1)?;
        Some(
            self.directory
                .join(format!("{}{n}{}", self.prefix, self.suffix)),
        )
    }
}
