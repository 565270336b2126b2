use crate::bio::accession::normalize_accession;
use crate::bio::sequence::FastaRecord;
use crate::utils::atomic::write_atomic;
use crate::{FidoError, Result};
use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Column width used when writing sequence bodies
pub const LINE_WIDTH: usize = 80;

/// In-memory FASTA collection keyed by accession, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FastaStore {
    records: IndexMap<String, FastaRecord>,
}

impl FastaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, accession: &str) -> Option<&FastaRecord> {
        self.records.get(accession)
    }

    pub fn contains(&self, accession: &str) -> bool {
        self.records.contains_key(accession)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FastaRecord> {
        self.records.values()
    }

    pub fn accessions(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Insert a record, replacing any record with the same accession in place.
    ///
    /// Returns the replaced record, if there was one.
    pub fn insert(&mut self, record: FastaRecord) -> Option<FastaRecord> {
        self.records.insert(record.accession.clone(), record)
    }

    /// Append every record of `other` whose accession is not already present.
    ///
    /// Returns the number of records added.
    pub fn merge_missing(&mut self, other: &FastaStore) -> usize {
        let mut added = 0;
        for record in other.iter() {
            if !self.contains(&record.accession) {
                self.insert(record.clone());
                added += 1;
            }
        }
        added
    }

    /// New store holding the records that satisfy `predicate`, in the same order.
    pub fn filtered<F>(&self, mut predicate: F) -> FastaStore
    where
        F: FnMut(&FastaRecord) -> bool,
    {
        self.iter().filter(|r| predicate(r)).cloned().collect()
    }

    /// Copy of this store with every accession replaced by its normalised token.
    pub fn normalized(&self) -> Result<FastaStore> {
        let mut out = FastaStore::new();
        for record in self.iter() {
            let accession = normalize_record_accession(record)?;
            if out.contains(&accession) {
                tracing::warn!("Accession '{}' is not unique after normalisation", accession);
            }
            out.insert(FastaRecord::new(accession, record.sequence.clone()));
        }
        Ok(out)
    }

    pub fn max_length(&self) -> usize {
        self.iter().map(FastaRecord::len).max().unwrap_or(0)
    }

    pub fn average_length(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let total: usize = self.iter().map(FastaRecord::len).sum();
        total as f64 / self.len() as f64
    }

    /// Load a FASTA file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let store = Self::parse(BufReader::new(file), &path.display().to_string())?;
        tracing::debug!("Loaded {} records from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::parse(data, "<memory>")
    }

    /// Parse FASTA text.
    ///
    /// A `>` line opens a record keyed by the rest of the line; following lines
    /// are concatenated into its sequence. Blank lines are ignored.
    pub fn parse<R: BufRead>(reader: R, source_name: &str) -> Result<Self> {
        let mut store = FastaStore::new();
        let mut current: Option<FastaRecord> = None;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end_matches(['\r', '\n']);

            if let Some(header) = line.strip_prefix('>') {
                if let Some(record) = current.take() {
                    store.push_parsed(record);
                }
                current = Some(FastaRecord::new(header, Vec::new()));
                continue;
            }

            if line.trim().is_empty() {
                continue;
            }

            match current.as_mut() {
                Some(record) => record.sequence.extend_from_slice(line.trim_end().as_bytes()),
                None => {
                    return Err(FidoError::MalformedInput {
                        source_name: source_name.to_string(),
                        line: index + 1,
                        message: "sequence data before the first '>' header".to_string(),
                    })
                }
            }
        }

        if let Some(record) = current.take() {
            store.push_parsed(record);
        }
        Ok(store)
    }

    fn push_parsed(&mut self, record: FastaRecord) {
        if let Some(previous) = self.insert(record) {
            tracing::warn!(
                "Duplicate FASTA header '{}': keeping the later record",
                previous.accession
            );
        }
    }

    /// Write the store to `path`, replacing the file only once fully written.
    pub fn save<P: AsRef<Path>>(&self, path: P, normalize_accession: bool) -> Result<()> {
        write_atomic(path, |writer| self.write_to(writer, normalize_accession))
    }

    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W, normalize_accession: bool) -> Result<()> {
        for record in self.iter() {
            let accession = if normalize_accession {
                normalize_record_accession(record)?
            } else {
                record.accession.clone()
            };
            writeln!(writer, ">{}", accession)?;
            for chunk in record.sequence.chunks(LINE_WIDTH) {
                writer.write_all(chunk)?;
                writer.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    /// Serialise to FASTA text.
    pub fn to_fasta_string(&self, normalize_accession: bool) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer, normalize_accession)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn normalize_record_accession(record: &FastaRecord) -> Result<String> {
    normalize_accession(&record.accession).ok_or_else(|| FidoError::MalformedInput {
        source_name: "FASTA header".to_string(),
        line: 0,
        message: format!("header '{}' contains no accession token", record.accession),
    })
}

impl FromIterator<FastaRecord> for FastaStore {
    fn from_iter<I: IntoIterator<Item = FastaRecord>>(iter: I) -> Self {
        let mut store = FastaStore::new();
        for record in iter {
            store.insert(record);
        }
        store
    }
}

impl<'a> IntoIterator for &'a FastaStore {
    type Item = &'a FastaRecord;
    type IntoIter = indexmap::map::Values<'a, String, FastaRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_parse_multiline_records() {
        let fasta = b">sp|P1|ONE_HUMAN first\nMKV\nLT\n\n>XP_2.1 second\nAAAA\n";
        let store = FastaStore::from_bytes(fasta).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("sp|P1|ONE_HUMAN first").unwrap().sequence, b"MKVLT");
        assert_eq!(store.get("XP_2.1 second").unwrap().sequence, b"AAAA");
    }

    #[test]
    fn test_parse_handles_crlf() {
        let store = FastaStore::from_bytes(b">A\r\nMK\r\nV\r\n").unwrap();
        assert_eq!(store.get("A").unwrap().sequence, b"MKV");
    }

    #[test]
    fn test_sequence_before_header_is_malformed() {
        let err = FastaStore::from_bytes(b"MKV\n>A\nMK\n").unwrap_err();
        match err {
            FidoError::MalformedInput { line, .. } => assert_eq!(line, 1),
            other => panic!("expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_leading_blank_lines_are_ignored() {
        let store = FastaStore::from_bytes(b"\n\n>A\nMK\n").unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_header_keeps_later_sequence_in_first_position() {
        let store = FastaStore::from_bytes(b">A\nMK\n>B\nVV\n>A\nLT\n").unwrap();
        let order: Vec<_> = store.accessions().collect();
        assert_eq!(order, vec!["A", "B"]);
        assert_eq!(store.get("A").unwrap().sequence, b"LT");
    }

    #[test]
    fn test_write_wraps_at_80_columns() {
        let store: FastaStore = vec![FastaRecord::new("A", vec![b'M'; 170])].into_iter().collect();
        let text = store.to_fasta_string(false).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], ">A");
        assert_eq!(lines[1].len(), 80);
        assert_eq!(lines[2].len(), 80);
        assert_eq!(lines[3].len(), 10);
    }

    #[test]
    fn test_save_with_normalisation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.fasta");
        let store = FastaStore::from_bytes(b">XP_1.1 some protein [Homo sapiens]\nMKV\n").unwrap();

        store.save(&path, true).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), ">XP_1.1\nMKV\n");
    }

    #[test]
    fn test_load_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("round.fasta");
        let body: String = std::iter::repeat("ACDEFGHIKLMNPQRSTVWY").take(9).collect();
        let input = format!(">A desc\n{}\n>B\nMK\n", body);
        let original = FastaStore::from_bytes(input.as_bytes()).unwrap();

        original.save(&path, false).unwrap();
        let reloaded = FastaStore::load(&path).unwrap();

        assert_eq!(original, reloaded);
    }

    #[test]
    fn test_merge_missing_only_adds_new_accessions() {
        let mut pool = FastaStore::from_bytes(b">A\nMK\n>B\nVV\n").unwrap();
        let anchors = FastaStore::from_bytes(b">B\nZZZ\n>REF\nMKVLT\n").unwrap();

        let added = pool.merge_missing(&anchors);

        assert_eq!(added, 1);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.get("B").unwrap().sequence, b"VV");
        assert_eq!(pool.accessions().last(), Some("REF"));
    }

    #[test]
    fn test_normalized_rejects_empty_header() {
        let store = FastaStore::from_bytes(b">\nMK\n").unwrap();
        assert!(store.normalized().is_err());
    }

    #[test]
    fn test_average_and_max_length() {
        let store = FastaStore::from_bytes(b">A\nMK\n>B\nMKVL\n").unwrap();
        assert_eq!(store.max_length(), 4);
        assert_eq!(store.average_length(), 3.0);
        assert_eq!(FastaStore::new().average_length(), 0.0);
    }
}
