//! Accession normalisation for FASTA headers.
//!
//! Local BLAST databases and NCBI downloads label records differently
//! (`sp|P12345|NAME_HUMAN ...` vs `XP_0123.1 description [Organism]`). Every
//! stage after the first filter works on the normalised token, so the cluster
//! table and the aligned FASTA can be joined on it.

/// One way of pulling an accession token out of a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessionStrategy {
    /// NCBI style: everything before the first space
    BeforeSpace,
    /// Pipe-delimited style: everything before the first `|`
    BeforePipe,
}

impl AccessionStrategy {
    /// Strategies in the order they are tried
    pub const ORDERED: [AccessionStrategy; 2] =
        [AccessionStrategy::BeforeSpace, AccessionStrategy::BeforePipe];

    pub fn extract<'a>(&self, header: &'a str) -> Option<&'a str> {
        let token = match self {
            AccessionStrategy::BeforeSpace => header.split(' ').next()?,
            AccessionStrategy::BeforePipe => header.split('|').next()?,
        };
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(token)
        }
    }
}

/// Strip the record marker and the UniProt `sp|` database token.
fn strip_prefixes(header: &str) -> &str {
    let header = header.trim_start_matches('>');
    header.strip_prefix("sp|").unwrap_or(header)
}

/// Normalise a FASTA header to its accession token.
///
/// Returns `None` when no strategy yields a non-empty token.
pub fn normalize_accession(header: &str) -> Option<String> {
    let stripped = strip_prefixes(header.trim_end());
    AccessionStrategy::ORDERED
        .iter()
        .find_map(|strategy| strategy.extract(stripped))
        .map(str::to_string)
}

/// Accession used for lookups across stage files: marker and surrounding whitespace removed.
pub fn lookup_key(accession: &str) -> &str {
    accession.trim().trim_start_matches('>')
}
