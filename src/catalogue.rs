use crate::models::CatalogueEntry;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CatalogueRow {
    filename: String,
    #[serde(default)]
    description: Option<String>,
}

/// The fixed list of memes a query can be matched against
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalogue {
    entries: Vec<CatalogueEntry>,
}

impl Catalogue {
    pub fn new(entries: Vec<CatalogueEntry>) -> Self {
        Self { entries }
    }

    /// Build a catalogue from (filename, description) pairs, numbering them in order
    pub fn from_pairs<I, F, D>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (F, D)>,
        F: Into<String>,
        D: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .enumerate()
            .map(|(index, (filename, description))| CatalogueEntry::new(index, filename, description))
            .collect();
        Self { entries }
    }

    /// Load a catalogue from a CSV file with `filename` and `description` columns
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open catalogue: {}", path.display()))?;

        Self::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("Failed to load catalogue: {}", path.display()))
    }

    /// Load from a file without blocking the async runtime
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        tokio::task::spawn_blocking(move || Self::from_path(path))
            .await
            .context("Catalogue loader task panicked")?
    }

    /// Parse CSV rows; row order defines each entry's ordinal
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = rdr.headers().context("Failed to read catalogue header")?;
        if !headers.iter().any(|h| h == "filename") {
            anyhow::bail!("Catalogue is missing the 'filename' column");
        }

        let mut entries = Vec::new();
        for (index, row) in rdr.deserialize::<CatalogueRow>().enumerate() {
            // +2: one for the header line, one for 1-based line numbers
            let row = row.with_context(|| format!("Malformed catalogue row at line {}", index + 2))?;
            entries.push(CatalogueEntry::new(
                index,
                row.filename,
                row.description.map(|d| d.trim().to_string()).unwrap_or_default(),
            ));
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by ordinal
    pub fn get(&self, index: usize) -> Option<&CatalogueEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[CatalogueEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogueEntry> {
        self.entries.iter()
    }

    /// Blake3 hash over every (filename, description) pair in order
    ///
    /// Stored next to the embedding index so a later run can tell the
    /// catalogue changed under a warm index.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for entry in &self.entries {
            hasher.update(entry.filename.as_bytes());
            hasher.update(&[0]);
            hasher.update(entry.description.as_bytes());
            hasher.update(&[0]);
        }
        hasher.finalize().to_hex().to_string()
    }
}

impl<'a> IntoIterator for &'a Catalogue {
    type Item = &'a CatalogueEntry;
    type IntoIter = std::slice::Iter<'a, CatalogueEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
