//! Two-level grouping of a flat metadata listing by category.

use shared::protocol::FileMetadataRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Bucket {
    category: String,
    filenames: Vec<String>,
}

/// Ordered category -> filenames mapping. Buckets keep first-seen order and are never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryIndex {
    buckets: Vec<Bucket>,
}

impl CategoryIndex {
    /// Single stable pass over `records`; blank or absent categories fall into `default_category`.
    pub fn build(records: &[FileMetadataRecord], default_category: &str) -> Self {
        let mut index = Self::default();
        for record in records {
            let category = match record.category.as_deref().map(str::trim) {
                Some(category) if !category.is_empty() => category,
                _ => default_category,
            };
            index.push(category, &record.filename);
        }
        index
    }

    fn push(&mut self, category: &str, filename: &str) {
        match self.buckets.iter_mut().find(|b| b.category == category) {
            Some(bucket) => bucket.filenames.push(filename.to_string()),
            None => self.buckets.push(Bucket {
                category: category.to_string(),
                filenames: vec![filename.to_string()],
            }),
        }
    }

    pub fn category_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn file_count(&self) -> usize {
        self.buckets.iter().map(|b| b.filenames.len()).sum()
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, usize)> {
        self.buckets
            .iter()
            .map(|b| (b.category.as_str(), b.filenames.len()))
    }

    pub fn contains_category(&self, category: &str) -> bool {
        self.buckets.iter().any(|b| b.category == category)
    }

    /// Files of `category`; an absent category reads as an empty list.
    pub fn files(&self, category: &str) -> &[String] {
        self.buckets
            .iter()
            .find(|b| b.category == category)
            .map(|b| b.filenames.as_slice())
            .unwrap_or(&[])
    }

    /// Drops `filename` from every bucket and prunes buckets left empty.
    /// Returns true if anything was removed; removing an absent name is a no-op.
    pub fn remove_file(&mut self, filename: &str) -> bool {
        let before = self.file_count();
        for bucket in &mut self.buckets {
            bucket.filenames.retain(|f| f != filename);
        }
        self.buckets.retain(|b| !b.filenames.is_empty());
        self.file_count() != before
    }

    pub fn to_pairs(&self) -> Vec<(String, Vec<String>)> {
        self.buckets
            .iter()
            .map(|b| (b.category.clone(), b.filenames.clone()))
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/index_tests.rs"]
mod tests;
