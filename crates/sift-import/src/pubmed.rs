//! Abstract lookup through NCBI E-utilities `efetch`.
//!
//! CSV exports from PubMed omit abstracts. [`PubMedClient::fetch_abstracts`]
//! asks `efetch` for the PubMed XML of a PMID list, in batches and at the
//! rate NCBI allows, and [`parse_abstracts`] reads the abstracts back out.

use std::collections::BTreeMap;
use std::time::Duration;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;
use sift_config::PubMedConfig;

use crate::error::ImportError;

/// Outcome of [`PubMedClient::fetch_abstracts`].
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct FetchedAbstracts {
    /// PMID to abstract text.
    pub abstracts: BTreeMap<String, String>,
    /// Batches whose request or response failed. Their PMIDs are absent
    /// from `abstracts`.
    pub failed_batches: usize,
}

pub struct PubMedClient {
    http: reqwest::Client,
    efetch_url: reqwest::Url,
    email: Option<String>,
    api_key: Option<String>,
    batch_size: usize,
    interval: Duration,
}

impl PubMedClient {
    /// # Errors
    ///
    /// Returns `ImportError::Url` for an unusable `base_url` and
    /// `ImportError::Http` if the HTTP client cannot be built.
    pub fn from_config(config: &PubMedConfig) -> Result<Self, ImportError> {
        let efetch_url = reqwest::Url::parse(&config.efetch_url())
            .map_err(|e| ImportError::Url(format!("{}: {e}", config.base_url)))?;
        let http = reqwest::Client::builder()
            .user_agent("sift/0.1")
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            efetch_url,
            email: config.email.clone().filter(|e| !e.trim().is_empty()),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            batch_size: config.batch_size.max(1),
            interval: config.request_interval(),
        })
    }

    /// Fetch abstracts for `pmids`. A failed batch is logged and counted;
    /// the remaining batches still run.
    pub async fn fetch_abstracts(&self, pmids: &[String]) -> FetchedAbstracts {
        let mut fetched = FetchedAbstracts::default();
        for (index, batch) in pmids.chunks(self.batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.interval).await;
            }
            match self.fetch_batch(batch).await {
                Ok(abstracts) => {
                    tracing::debug!(requested = batch.len(), found = abstracts.len(), "efetch batch");
                    fetched.abstracts.extend(abstracts);
                }
                Err(error) => {
                    tracing::warn!(%error, pmids = batch.len(), "efetch batch failed");
                    fetched.failed_batches += 1;
                }
            }
        }
        fetched
    }

    async fn fetch_batch(&self, batch: &[String]) -> Result<BTreeMap<String, String>, ImportError> {
        let ids = batch.join(",");
        let mut params = vec![
            ("db", "pubmed"),
            ("id", ids.as_str()),
            ("rettype", "xml"),
            ("retmode", "xml"),
        ];
        if let Some(email) = self.email.as_deref() {
            params.push(("email", email));
        }
        if let Some(api_key) = self.api_key.as_deref() {
            params.push(("api_key", api_key));
        }
        let mut url = self.efetch_url.clone();
        url.query_pairs_mut().extend_pairs(&params);

        let body = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_abstracts(&body)
    }
}

fn xml_error(error: impl std::fmt::Display) -> ImportError {
    ImportError::Xml(error.to_string())
}

fn label_of(start: &BytesStart<'_>) -> Result<Option<String>, ImportError> {
    match start.try_get_attribute("Label").map_err(xml_error)? {
        Some(attribute) => Ok(Some(
            attribute.unescape_value().map_err(xml_error)?.into_owned(),
        )),
        None => Ok(None),
    }
}

/// Read PMID to abstract pairs from an efetch `PubmedArticleSet`.
///
/// Structured abstracts keep their section labels (`Methods: ...`), and
/// sections are joined with a space. Articles without an abstract are left
/// out.
///
/// # Errors
///
/// Returns `ImportError::Xml` for malformed XML.
pub fn parse_abstracts(xml: &str) -> Result<BTreeMap<String, String>, ImportError> {
    let mut reader = Reader::from_str(xml);
    let mut abstracts = BTreeMap::new();

    let mut pmid: Option<String> = None;
    let mut in_pmid = false;
    let mut sections: Vec<String> = Vec::new();
    let mut section: Option<String> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(start) => match start.name().as_ref() {
                b"PubmedArticle" => {
                    pmid = None;
                    sections.clear();
                }
                // The first PMID of an article is its own; later ones are
                // cited references.
                b"PMID" => in_pmid = pmid.is_none(),
                b"AbstractText" => {
                    section = Some(
                        label_of(&start)?
                            .map(|label| format!("{label}: "))
                            .unwrap_or_default(),
                    );
                }
                _ => {}
            },
            Event::Text(text) => {
                let text = text.unescape().map_err(xml_error)?;
                if in_pmid {
                    pmid = Some(text.trim().to_string());
                } else if let Some(section) = section.as_mut() {
                    section.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(section) = section.as_mut() {
                    section.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(end) => match end.name().as_ref() {
                b"PMID" => in_pmid = false,
                b"AbstractText" => {
                    if let Some(done) = section.take() {
                        let done = done.trim();
                        if !done.is_empty() {
                            sections.push(done.to_string());
                        }
                    }
                }
                b"PubmedArticle" => {
                    if let Some(id) = pmid.take().filter(|id| !id.is_empty()) {
                        if !sections.is_empty() {
                            abstracts.insert(id, sections.join(" "));
                        }
                    }
                    sections.clear();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(abstracts)
}
