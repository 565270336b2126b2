use crate::bio::accession::lookup_key;
use crate::{FidoError, Result};
use indexmap::{IndexMap, IndexSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Member -> cluster representative mapping read from a clustering engine's
/// two-column `representative<TAB>member` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterTable {
    members: IndexMap<String, String>,
}

impl ClusterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn insert(&mut self, representative: impl Into<String>, member: impl Into<String>) {
        self.members.insert(member.into(), representative.into());
    }

    pub fn representative_of(&self, member: &str) -> Option<&str> {
        self.members.get(lookup_key(member)).map(String::as_str)
    }

    /// Distinct representatives, in first-seen order
    pub fn representatives(&self) -> IndexSet<&str> {
        self.members.values().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.members
            .iter()
            .map(|(member, rep)| (member.as_str(), rep.as_str()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let table = Self::parse(file, &path.display().to_string())?;
        tracing::debug!(
            "Loaded {} cluster members ({} clusters) from {}",
            table.len(),
            table.representatives().len(),
            path.display()
        );
        Ok(table)
    }

    /// Parse tab-separated `(representative, member)` lines with no header.
    ///
    /// Nothing is checked against any sequence store here. A member listed
    /// twice keeps its last representative.
    pub fn parse<R: Read>(reader: R, source_name: &str) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .quoting(false)
            .flexible(true)
            .from_reader(reader);

        let mut table = ClusterTable::new();
        for row in csv_reader.records() {
            let row = row?;
            let line = row.position().map(|p| p.line() as usize).unwrap_or(0);
            match (row.get(0), row.get(1), row.len()) {
                (Some(rep), Some(member), 2) if !rep.trim().is_empty() && !member.trim().is_empty() => {
                    table.insert(lookup_key(rep), lookup_key(member));
                }
                _ => {
                    return Err(FidoError::MalformedInput {
                        source_name: source_name.to_string(),
                        line,
                        message: format!(
                            "expected 'representative<TAB>member', found {} field(s)",
                            row.len()
                        ),
                    })
                }
            }
        }
        Ok(table)
    }
}
