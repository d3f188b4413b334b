//! # sift-import
//!
//! Bibliographic export parsers for Sift.
//!
//! Turns RIS, PubMed MEDLINE and PubMed CSV exports into [`NewArticle`]
//! records ready for `SiftService::import_articles`. Each format names the
//! identifier its records are matched on when re-imported:
//! - RIS: DOI
//! - MEDLINE: PMID
//! - CSV: PMID
//!
//! CSV exports carry no abstracts; [`pubmed::PubMedClient`] fetches them from
//! NCBI E-utilities. [`fulltext`] turns attached PDFs into text.

pub mod error;
pub mod fulltext;
pub mod medline;
pub mod pubmed;
pub mod pubmed_csv;
pub mod ris;

use std::path::Path;

use serde::Serialize;
use sift_core::inputs::{DedupKey, NewArticle};

pub use error::ImportError;

/// Records read from one export.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ParsedImport {
    pub articles: Vec<NewArticle>,
    /// Records dropped for lacking their identifier or a title.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Ris,
    Medline,
    Csv,
}

impl ImportFormat {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ris => "ris",
            Self::Medline => "medline",
            Self::Csv => "csv",
        }
    }

    /// Identifier used to match re-imported records.
    #[must_use]
    pub const fn dedup_key(self) -> DedupKey {
        match self {
            Self::Ris => DedupKey::Doi,
            Self::Medline | Self::Csv => DedupKey::Pmid,
        }
    }

    /// Guess the format from a file extension (`.ris`, `.txt`, `.nbib`,
    /// `.csv`).
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ris" => Some(Self::Ris),
            "txt" | "nbib" | "medline" => Some(Self::Medline),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// # Errors
    ///
    /// Returns `ImportError::Parse` for malformed input.
    pub fn parse(self, content: &str) -> Result<ParsedImport, ImportError> {
        match self {
            Self::Ris => ris::parse(content),
            Self::Medline => medline::parse(content),
            Self::Csv => pubmed_csv::parse(content),
        }
    }
}

/// Read and parse an export file, tagging each record with its file name.
///
/// # Errors
///
/// Returns `ImportError::Io` if the file cannot be read and
/// `ImportError::Parse` for malformed input.
pub fn read_file(format: ImportFormat, path: &Path) -> Result<ParsedImport, ImportError> {
    let content = std::fs::read_to_string(path)?;
    let mut parsed = format.parse(&content)?;
    let filename = path.file_name().map(|name| name.to_string_lossy().into_owned());
    for article in &mut parsed.articles {
        article.source_filename.clone_from(&filename);
    }
    tracing::debug!(
        format = format.name(),
        path = %path.display(),
        records = parsed.articles.len(),
        skipped = parsed.skipped,
        "parsed export"
    );
    Ok(parsed)
}

/// Year from the first four characters of a date such as `2021/05/10` or
/// `2019 Mar 15`.
pub(crate) fn leading_year(date: &str) -> Option<i32> {
    let head = date.trim().get(..4)?;
    if head.bytes().all(|b| b.is_ascii_digit()) {
        head.parse().ok()
    } else {
        None
    }
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    Some(value.to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("2021/05/10", Some(2021))]
    #[case("2019 Mar 15", Some(2019))]
    #[case("1999", Some(1999))]
    #[case("Spring 2001", None)]
    #[case("19", None)]
    fn year_from_date(#[case] date: &str, #[case] expected: Option<i32>) {
        assert_eq!(leading_year(date), expected);
    }

    #[test]
    fn formats_pick_their_dedup_key() {
        assert_eq!(ImportFormat::Ris.dedup_key(), DedupKey::Doi);
        assert_eq!(ImportFormat::Medline.dedup_key(), DedupKey::Pmid);
        assert_eq!(ImportFormat::Csv.dedup_key(), DedupKey::Pmid);
        assert_eq!(
            ImportFormat::from_path(Path::new("export.RIS")),
            Some(ImportFormat::Ris)
        );
        assert_eq!(
            ImportFormat::from_path(Path::new("pubmed-set.txt")),
            Some(ImportFormat::Medline)
        );
        assert_eq!(
            ImportFormat::from_path(Path::new("csv-Exercise-set.csv")),
            Some(ImportFormat::Csv)
        );
        assert_eq!(ImportFormat::from_path(Path::new("refs.bib")), None);
    }
}
