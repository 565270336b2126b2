/// NCBI remote BLAST (QBlast) and Entrez sequence retrieval
use crate::bio::accession::AccessionStrategy;
use crate::bio::fasta::LINE_WIDTH;
use crate::core::config::RemoteConfig;
use crate::utils::atomic::write_atomic;
use crate::{FidoError, Result};
use indexmap::{IndexMap, IndexSet};
use indicatif::ProgressBar;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use std::time::Duration;

pub const QBLAST_URL: &str = "https://blast.ncbi.nlm.nih.gov/Blast.cgi";
pub const EFETCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";

/// Response bodies larger than this are rejected
const MAX_RESPONSE_BYTES: u64 = 256 * 1024 * 1024;

fn network_error(context: &str, error: impl std::fmt::Display) -> FidoError {
    FidoError::Network(format!("{}: {}", context, error))
}

fn build_client() -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(300))
        .connect_timeout(Duration::from_secs(30))
        .user_agent(concat!("fido/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| network_error("Failed to build HTTP client", e))
}

fn read_body(response: reqwest::blocking::Response, context: &str) -> Result<String> {
    if !response.status().is_success() {
        return Err(FidoError::Network(format!(
            "{}: server returned status {}",
            context,
            response.status()
        )));
    }
    let mut body = String::new();
    response
        .take(MAX_RESPONSE_BYTES)
        .read_to_string(&mut body)
        .map_err(|e| network_error(context, e))?;
    Ok(body)
}

/// State of a submitted QBlast search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Waiting,
    Ready { has_hits: bool },
    Failed,
    Unknown,
}

/// Extract the request id from a `CMD=Put` response
pub fn parse_rid(body: &str) -> Option<String> {
    let re = Regex::new(r"(?m)^\s*RID = (\S+)").ok()?;
    re.captures(body).map(|caps| caps[1].to_string())
}

/// Parse the `SearchInfo` block of a `CMD=Get` poll
pub fn parse_search_status(body: &str) -> Option<SearchStatus> {
    let re = Regex::new(r"Status=(\w+)").ok()?;
    let status = re.captures(body)?;
    match &status[1] {
        "WAITING" => Some(SearchStatus::Waiting),
        "READY" => Some(SearchStatus::Ready {
            has_hits: body.contains("ThereAreHits=yes"),
        }),
        "FAILED" => Some(SearchStatus::Failed),
        "UNKNOWN" => Some(SearchStatus::Unknown),
        _ => None,
    }
}

/// Hit accessions from BLAST XML, in report order, without duplicates
pub fn parse_hit_accessions(xml: &str) -> Vec<String> {
    let Ok(re) = Regex::new(r"<Hit_accession>\s*([^<\s]+)\s*</Hit_accession>") else {
        return Vec::new();
    };
    re.captures_iter(xml)
        .map(|caps| caps[1].to_string())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// Client for NCBI's URL BLAST API
pub struct QBlastClient {
    client: reqwest::blocking::Client,
    base_url: String,
    config: RemoteConfig,
}

impl QBlastClient {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: QBLAST_URL.to_string(),
            config: config.clone(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    fn identity_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("TOOL", self.config.tool_name.clone())];
        if let Some(email) = &self.config.email {
            params.push(("EMAIL", email.clone()));
        }
        params
    }

    /// Submit a blastp search against nr and return its request id.
    pub fn submit(&self, query: &str, hit_count: usize) -> Result<String> {
        let hits = hit_count.to_string();
        let mut form = vec![
            ("CMD", "Put".to_string()),
            ("PROGRAM", "blastp".to_string()),
            ("DATABASE", "nr".to_string()),
            ("QUERY", query.to_string()),
            ("EXPECT", self.config.expect.to_string()),
            ("HITLIST_SIZE", hits.clone()),
            ("ALIGNMENTS", hits.clone()),
            ("DESCRIPTIONS", hits),
        ];
        form.extend(self.identity_params());

        let response = self
            .client
            .post(&self.base_url)
            .form(&form)
            .send()
            .map_err(|e| network_error("QBlast submission failed", e))?;
        let body = read_body(response, "QBlast submission failed")?;

        let rid = parse_rid(&body)
            .ok_or_else(|| FidoError::Network("QBlast response contained no RID".to_string()))?;
        tracing::info!("Submitted remote BLAST search (RID {})", rid);
        Ok(rid)
    }

    /// Poll until the search is finished. Returns whether it found any hits.
    pub fn wait(&self, rid: &str) -> Result<bool> {
        let interval = Duration::from_secs(self.config.poll_interval_secs);
        for attempt in 1..=self.config.max_polls {
            std::thread::sleep(interval);

            let response = self
                .client
                .get(&self.base_url)
                .query(&[("CMD", "Get"), ("FORMAT_OBJECT", "SearchInfo"), ("RID", rid)])
                .send()
                .map_err(|e| network_error("QBlast status check failed", e))?;
            let body = read_body(response, "QBlast status check failed")?;

            match parse_search_status(&body) {
                Some(SearchStatus::Ready { has_hits }) => return Ok(has_hits),
                Some(SearchStatus::Waiting) | None => {
                    tracing::debug!("RID {} still running (poll {})", rid, attempt);
                }
                Some(SearchStatus::Failed) => {
                    return Err(FidoError::Network(format!("Remote search {} failed", rid)))
                }
                Some(SearchStatus::Unknown) => {
                    return Err(FidoError::Network(format!(
                        "Remote search {} expired or is unknown",
                        rid
                    )))
                }
            }
        }
        Err(FidoError::Network(format!(
            "Remote search {} did not finish after {} polls",
            rid, self.config.max_polls
        )))
    }

    pub fn fetch_xml(&self, rid: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("CMD", "Get"), ("FORMAT_TYPE", "XML"), ("RID", rid)])
            .send()
            .map_err(|e| network_error("QBlast result download failed", e))?;
        read_body(response, "QBlast result download failed")
    }

    /// Run a search to completion and return the hit accessions.
    pub fn search(&self, query: &str, hit_count: usize) -> Result<Vec<String>> {
        let rid = self.submit(query, hit_count)?;
        if !self.wait(&rid)? {
            tracing::warn!("Remote search {} returned no hits", rid);
            return Ok(Vec::new());
        }
        let accessions = parse_hit_accessions(&self.fetch_xml(&rid)?);
        tracing::info!("Remote search {} returned {} accessions", rid, accessions.len());
        Ok(accessions)
    }
}

/// Anything that can turn a batch of accessions into FASTA text
pub trait SequenceSource {
    fn fetch_batch(&self, accessions: &[String]) -> Result<String>;
}

/// Entrez efetch against the protein database
pub struct EntrezClient {
    client: reqwest::blocking::Client,
    base_url: String,
    tool_name: String,
    email: Option<String>,
}

impl EntrezClient {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: EFETCH_URL.to_string(),
            tool_name: config.tool_name.clone(),
            email: config.email.clone(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }
}

impl SequenceSource for EntrezClient {
    fn fetch_batch(&self, accessions: &[String]) -> Result<String> {
        let mut params = vec![
            ("db", "protein".to_string()),
            ("id", accessions.join(",")),
            ("rettype", "fasta".to_string()),
            ("retmode", "text".to_string()),
            ("tool", self.tool_name.clone()),
        ];
        if let Some(email) = &self.email {
            params.push(("email", email.clone()));
        }

        let response = self
            .client
            .post(&self.base_url)
            .form(&params)
            .send()
            .map_err(|e| network_error("efetch request failed", e))?;
        read_body(response, "efetch request failed")
    }
}

/// A full-length sequence as returned by efetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSequence {
    pub id: String,
    pub description: String,
    pub sequence: String,
}

impl RemoteSequence {
    /// Last `|` field of the id when it has one, otherwise the id itself
    pub fn accession(&self) -> &str {
        match self.id.rsplit('|').find(|part| !part.is_empty()) {
            Some(last) if self.id.contains('|') => last,
            _ => &self.id,
        }
    }
}

/// Parse efetch FASTA text. Headers split into id and description at the
/// first whitespace.
pub fn parse_remote_fasta(text: &str) -> Result<Vec<RemoteSequence>> {
    let mut sequences: Vec<RemoteSequence> = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix('>') {
            let id = AccessionStrategy::BeforeSpace
                .extract(header)
                .unwrap_or_default()
                .to_string();
            let description = header.trim().get(id.len()..).unwrap_or_default().trim().to_string();
            sequences.push(RemoteSequence {
                id,
                description,
                sequence: String::new(),
            });
        } else {
            let current = sequences.last_mut().ok_or_else(|| FidoError::MalformedInput {
                source_name: "efetch response".to_string(),
                line: index + 1,
                message: "sequence data before the first header".to_string(),
            })?;
            current.sequence.push_str(line.trim());
        }
    }
    Ok(sequences)
}

/// Batching, pacing and retry settings for sequence retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RemoteConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            batch_delay: Duration::from_millis(config.batch_delay_ms),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Wait before retry number `retry` (0-based); doubles each time
    pub fn backoff(&self, retry: u32) -> Duration {
        self.retry_backoff.saturating_mul(2u32.saturating_pow(retry))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedBatch {
    pub index: usize,
    pub accessions: Vec<String>,
    pub error: String,
}

/// Sequences retrieved plus the batches that never succeeded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    pub sequences: IndexMap<String, RemoteSequence>,
    pub failed_batches: Vec<FailedBatch>,
}

impl FetchOutcome {
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.failed_batches.is_empty()
    }

    /// Write the sequences as FASTA with `>{id} {description}` headers.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, |writer| {
            for sequence in self.sequences.values() {
                if sequence.description.is_empty() {
                    writeln!(writer, ">{}", sequence.id)?;
                } else {
                    writeln!(writer, ">{} {}", sequence.id, sequence.description)?;
                }
                for chunk in sequence.sequence.as_bytes().chunks(LINE_WIDTH) {
                    writer.write_all(chunk)?;
                    writer.write_all(b"\n")?;
                }
            }
            Ok(())
        })
    }
}

fn fetch_with_retry<S: SequenceSource + ?Sized>(
    source: &S,
    batch: &[String],
    batch_number: usize,
    policy: &RetryPolicy,
) -> Result<Vec<RemoteSequence>> {
    let mut retry = 0;
    loop {
        match source.fetch_batch(batch).and_then(|text| parse_remote_fasta(&text)) {
            Ok(sequences) => return Ok(sequences),
            Err(e) if retry < policy.max_retries => {
                let wait = policy.backoff(retry);
                tracing::warn!(
                    "Batch {} failed ({}); retrying in {:?} ({}/{})",
                    batch_number,
                    e,
                    wait,
                    retry + 1,
                    policy.max_retries
                );
                std::thread::sleep(wait);
                retry += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Retrieve full sequences for `accessions` in batches.
///
/// A batch that still fails after every retry is recorded in the outcome and
/// the remaining batches still run.
pub fn fetch_full_sequences<S: SequenceSource + ?Sized>(
    source: &S,
    accessions: &[String],
    policy: &RetryPolicy,
    progress: Option<&ProgressBar>,
) -> FetchOutcome {
    let mut outcome = FetchOutcome::default();
    let batches: Vec<&[String]> = accessions.chunks(policy.batch_size.max(1)).collect();
    let total = batches.len();

    tracing::info!("Fetching {} full sequences in {} batches", accessions.len(), total);

    for (index, batch) in batches.into_iter().enumerate() {
        if index > 0 && !policy.batch_delay.is_zero() {
            std::thread::sleep(policy.batch_delay);
        }

        match fetch_with_retry(source, batch, index + 1, policy) {
            Ok(sequences) => {
                for sequence in sequences {
                    outcome
                        .sequences
                        .insert(sequence.accession().to_string(), sequence);
                }
                tracing::info!("Fetched batch {}/{}", index + 1, total);
            }
            Err(e) => {
                tracing::error!("Giving up on batch {}/{}: {}", index + 1, total, e);
                outcome.failed_batches.push(FailedBatch {
                    index,
                    accessions: batch.to_vec(),
                    error: e.to_string(),
                });
            }
        }

        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    outcome
}
