use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Index of one stimulus in the fixed image pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub usize);

impl ItemId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps item ids onto the resources a display backend can load.
pub trait StimulusResolver {
    fn resolve(&self, item: ItemId) -> PathBuf;

    /// Text written to the session log for this item.
    fn label(&self, item: ItemId) -> String {
        let path = self.resolve(item);
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }
}

impl<F> StimulusResolver for F
where
    F: Fn(ItemId) -> PathBuf,
{
    fn resolve(&self, item: ItemId) -> PathBuf {
        self(item)
    }
}

/// Directory of numbered image files, `<dir>/<prefix><index:04>.<extension>`.
#[derive(Debug, Clone, PartialEq)]
pub struct StimulusPool {
    pub dir: PathBuf,
    pub prefix: String,
    pub extension: String,
}

impl StimulusPool {
    pub fn new(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        let extension: String = extension.into();
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn file_name(&self, item: ItemId) -> String {
        format!("{}{:04}.{}", self.prefix, item.0, self.extension)
    }

    /// Inverse of [`StimulusPool::file_name`].
    pub fn parse_file_name(&self, name: &str) -> Option<ItemId> {
        let digits = name
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(ItemId)
    }

    /// First item whose file is absent from the pool directory.
    pub fn first_missing<'a, I>(&self, items: I) -> Option<(ItemId, PathBuf)>
    where
        I: IntoIterator<Item = &'a ItemId>,
    {
        items
            .into_iter()
            .map(|item| (*item, self.resolve(*item)))
            .find(|(_, path)| !path.is_file())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl StimulusResolver for StimulusPool {
    fn resolve(&self, item: ItemId) -> PathBuf {
        self.dir.join(self.file_name(item))
    }

    fn label(&self, item: ItemId) -> String {
        self.file_name(item)
    }
}
