use std::collections::HashSet;

use serde::Serialize;

use crate::stream::FeatureError;

/// Names a source either by position in the table or by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRef<'a> {
    /// Position in the source table
    Index(usize),
    /// Source name
    Name(&'a str),
}

impl From<usize> for SourceRef<'_> {
    fn from(index: usize) -> Self {
        SourceRef::Index(index)
    }
}

impl<'a> From<&'a str> for SourceRef<'a> {
    fn from(name: &'a str) -> Self {
        SourceRef::Name(name)
    }
}

impl<'a> From<&'a String> for SourceRef<'a> {
    fn from(name: &'a String) -> Self {
        SourceRef::Name(name.as_str())
    }
}

/// A named run of frames `[first, first + count)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceSpan<'a> {
    /// Source name
    pub name: &'a str,
    /// Global index of the first frame
    pub first: usize,
    /// Number of frames
    pub count: usize,
}

impl SourceSpan<'_> {
    /// One past the last global index of this source
    pub fn end(&self) -> usize {
        self.first + self.count
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceEntry {
    name: String,
    first: usize,
}

/// Ordered partition of the global frame range into named sources.
///
/// Sources are stored by their start index; counts are derived from the next
/// start (or the frame total for the last source), so appending frames only
/// grows the last source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTable {
    entries: Vec<SourceEntry>,
    total: usize,
}

impl SourceTable {
    /// One source covering every frame
    pub fn single(name: impl Into<String>, total: usize) -> Self {
        Self {
            entries: vec![SourceEntry {
                name: name.into(),
                first: 0,
            }],
            total,
        }
    }

    /// Build a table from consecutive `(name, count)` pairs
    pub fn from_counts<S: Into<String>>(
        sources: impl IntoIterator<Item = (S, usize)>,
    ) -> Result<Self, FeatureError> {
        let mut entries = Vec::new();
        let mut first = 0usize;
        for (name, count) in sources {
            entries.push((name.into(), first));
            first += count;
        }
        Self::from_starts(entries, first)
    }

    /// Build a table from `(name, first)` pairs and the frame total, checking
    /// that the starts partition `[0, total)`.
    pub fn from_starts(entries: Vec<(String, usize)>, total: usize) -> Result<Self, FeatureError> {
        if entries.is_empty() {
            return Err(FeatureError::InvalidData(
                "source table must contain at least one source".to_string(),
            ));
        }
        if entries[0].1 != 0 {
            return Err(FeatureError::InvalidData(format!(
                "first source '{}' starts at frame {} instead of 0",
                entries[0].0, entries[0].1
            )));
        }

        let mut names = HashSet::new();
        let mut previous = 0usize;
        for (name, first) in &entries {
            if name.is_empty() {
                return Err(FeatureError::InvalidData("empty source name".to_string()));
            }
            if !names.insert(name.as_str()) {
                return Err(FeatureError::InvalidData(format!(
                    "duplicate source name '{}'",
                    name
                )));
            }
            if *first < previous {
                return Err(FeatureError::InvalidData(format!(
                    "source '{}' starts at frame {} before the previous source ({})",
                    name, first, previous
                )));
            }
            if *first > total {
                return Err(FeatureError::InvalidData(format!(
                    "source '{}' starts at frame {} past the end of the stream ({} frames)",
                    name, first, total
                )));
            }
            previous = *first;
        }

        Ok(Self {
            entries: entries
                .into_iter()
                .map(|(name, first)| SourceEntry { name, first })
                .collect(),
            total,
        })
    }

    /// Number of sources
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// A table always holds at least one source
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the stream multiplexes more than one recording
    pub fn is_multi_source(&self) -> bool {
        self.entries.len() > 1
    }

    /// Total number of frames covered
    pub fn total(&self) -> usize {
        self.total
    }

    /// Resolve a reference to a table position
    pub fn resolve(&self, source: SourceRef<'_>) -> Result<usize, FeatureError> {
        match source {
            SourceRef::Index(index) if index < self.entries.len() => Ok(index),
            SourceRef::Index(index) => Err(FeatureError::OutOfBounds {
                index,
                count: self.entries.len(),
            }),
            SourceRef::Name(name) => self
                .entries
                .iter()
                .position(|e| e.name == name)
                .ok_or_else(|| FeatureError::SourceNotFound(name.to_string())),
        }
    }

    /// Frame range of a source
    pub fn span(&self, source: SourceRef<'_>) -> Result<SourceSpan<'_>, FeatureError> {
        let index = self.resolve(source)?;
        Ok(self.span_at(index))
    }

    /// Name of the source at `index`
    pub fn name(&self, index: usize) -> Result<&str, FeatureError> {
        let index = self.resolve(SourceRef::Index(index))?;
        Ok(&self.entries[index].name)
    }

    /// Source holding the global frame `index`
    pub fn source_of_feature(&self, index: usize) -> Option<usize> {
        if index >= self.total {
            return None;
        }
        let after = self.entries.partition_point(|e| e.first <= index);
        after.checked_sub(1)
    }

    /// Iterate over every source in order
    pub fn iter(&self) -> impl Iterator<Item = SourceSpan<'_>> + '_ {
        (0..self.entries.len()).map(move |i| self.span_at(i))
    }

    /// Declared `(first, name)` pairs, as recorded in a file header
    pub(crate) fn declared_starts(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.entries.iter().map(|e| (e.first, e.name.as_str()))
    }

    /// Grow the last source by `frames`
    pub(crate) fn extend(&mut self, frames: usize) {
        self.total += frames;
    }

    /// Replace the frame total, keeping declared starts
    pub(crate) fn with_total(mut self, total: usize) -> Self {
        self.total = total;
        self
    }

    fn span_at(&self, index: usize) -> SourceSpan<'_> {
        let entry = &self.entries[index];
        let end = self
            .entries
            .get(index + 1)
            .map_or(self.total, |next| next.first);
        // Clamped so a partly written stream still partitions its frames
        let first = entry.first.min(self.total);
        let end = end.min(self.total);
        SourceSpan {
            name: &entry.name,
            first,
            count: end - first,
        }
    }
}
