//! PubMed CSV reader.
//!
//! PubMed's "Save as CSV" export has one header row and carries no abstracts;
//! see [`crate::pubmed`] for filling them in afterwards. Columns are matched
//! by header name, so their order and any extra columns do not matter.

use csv::StringRecord;
use sift_core::inputs::NewArticle;

use crate::error::ImportError;
use crate::ris::normalize_doi;
use crate::{ParsedImport, non_empty};

const FORMAT: &str = "CSV";

/// Header positions of the columns the reader understands.
struct Columns {
    pmid: usize,
    title: usize,
    authors: Option<usize>,
    journal: Option<usize>,
    year: Option<usize>,
    doi: Option<usize>,
    pmcid: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, ImportError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            find(name).ok_or_else(|| ImportError::Parse {
                format: FORMAT,
                line: 1,
                message: format!("missing '{name}' column"),
            })
        };
        Ok(Self {
            pmid: required("PMID")?,
            title: required("Title")?,
            authors: find("Authors"),
            journal: find("Journal/Book"),
            year: find("Publication Year"),
            doi: find("DOI"),
            pmcid: find("PMCID"),
        })
    }
}

fn cell(record: &StringRecord, column: Option<usize>) -> Option<String> {
    column
        .and_then(|index| record.get(index))
        .and_then(|value| non_empty(value.trim()))
}

/// `Smith J, Doe A.` becomes `["Smith J", "Doe A"]`.
fn split_authors(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|author| author.trim().trim_end_matches('.').trim())
        .filter(|author| !author.is_empty())
        .map(str::to_string)
        .collect()
}

fn to_article(record: &StringRecord, columns: &Columns) -> Option<NewArticle> {
    let pmid = cell(record, Some(columns.pmid))?;
    let title = cell(record, Some(columns.title))?;
    Some(NewArticle {
        title,
        authors: cell(record, columns.authors)
            .map(|authors| split_authors(&authors))
            .unwrap_or_default(),
        journal: cell(record, columns.journal),
        year: cell(record, columns.year).and_then(|year| year.parse().ok()),
        doi: cell(record, columns.doi).and_then(|doi| normalize_doi(&doi)),
        pmid: Some(pmid),
        pmcid: cell(record, columns.pmcid),
        ..NewArticle::default()
    })
}

fn parse_error(error: &csv::Error) -> ImportError {
    let line = error
        .position()
        .and_then(|position| usize::try_from(position.line()).ok())
        .unwrap_or_default();
    ImportError::Parse {
        format: FORMAT,
        line,
        message: error.to_string(),
    }
}

/// Parse a PubMed CSV export. Rows missing a PMID or a title are counted as
/// skipped.
///
/// # Errors
///
/// Returns `ImportError::Parse` when the header lacks a `PMID` or `Title`
/// column, or for malformed CSV.
pub fn parse(content: &str) -> Result<ParsedImport, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());
    let columns = Columns::locate(reader.headers().map_err(|e| parse_error(&e))?)?;

    let mut parsed = ParsedImport::default();
    for record in reader.records() {
        let record = record.map_err(|e| parse_error(&e))?;
        match to_article(&record, &columns) {
            Some(article) => parsed.articles.push(article),
            None => {
                tracing::debug!("skipping CSV row without PMID or title");
                parsed.skipped += 1;
            }
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const SAMPLE: &str = "\u{feff}PMID,Title,Authors,Citation,First Author,Journal/Book,Publication Year,Create Date,PMCID,NIHMS ID,DOI
31234567,\"Aerobic exercise and depression, a trial\",\"Smith J, Doe A.\",J Geriatr Psychiatry. 2019;12(3):45-67.,Smith J,J Geriatr Psychiatry,2019,2019/03/20,PMC6543210,,10.1000/jgp.2019.45
,Row without a PMID,Nobody N,,,,2020,,,,
32345678,Yoga and sleep quality,,,,Sleep Med,unknown,,,,
";

    #[test]
    fn maps_pubmed_columns() {
        let parsed = parse(SAMPLE).unwrap();
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.articles.len(), 2);

        let first = &parsed.articles[0];
        assert_eq!(first.pmid.as_deref(), Some("31234567"));
        assert_eq!(first.title, "Aerobic exercise and depression, a trial");
        assert_eq!(first.authors, vec!["Smith J", "Doe A"]);
        assert_eq!(first.journal.as_deref(), Some("J Geriatr Psychiatry"));
        assert_eq!(first.year, Some(2019));
        assert_eq!(first.doi.as_deref(), Some("10.1000/jgp.2019.45"));
        assert_eq!(first.pmcid.as_deref(), Some("PMC6543210"));
        assert_eq!(first.abstract_text, None);

        let second = &parsed.articles[1];
        assert!(second.authors.is_empty());
        assert_eq!(second.year, None);
        assert_eq!(second.doi, None);
    }

    #[test]
    fn missing_pmid_column_is_a_parse_error() {
        let err = parse("Title,Authors\nSomething,Someone\n").unwrap_err();
        assert!(
            matches!(err, ImportError::Parse { format: "CSV", line: 1, .. }),
            "got {err:?}"
        );
    }

    #[rstest]
    #[case("Smith J, Doe A.", &["Smith J", "Doe A"])]
    #[case("Lee K.", &["Lee K"])]
    #[case(" , ", &[])]
    fn author_lists(#[case] value: &str, #[case] expected: &[&str]) {
        assert_eq!(split_authors(value), expected);
    }
}
