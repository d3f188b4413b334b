//! RIS reader.
//!
//! A record starts at a `TY` line and ends at `ER`. Tag lines have the form
//! `XX  - value`; any other non-blank line inside a record continues the
//! previous field.

use sift_core::inputs::NewArticle;

use crate::error::ImportError;
use crate::{ParsedImport, leading_year, non_empty};

const FORMAT: &str = "RIS";

/// Split `XX  - value` into tag and trimmed value.
fn split_tag(line: &str) -> Option<(&str, &str)> {
    let bytes = line.as_bytes();
    if bytes.len() < 5 || &bytes[2..5] != b"  -" {
        return None;
    }
    if !bytes[0].is_ascii_uppercase() || !(bytes[1].is_ascii_uppercase() || bytes[1].is_ascii_digit()) {
        return None;
    }
    let value = line.get(5..).unwrap_or_default().trim();
    Some((&line[..2], value))
}

#[derive(Debug, Default)]
struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    fn first(&self, tags: &[&str]) -> Option<String> {
        tags.iter().find_map(|tag| {
            self.fields
                .iter()
                .find(|(t, v)| t == tag && !v.is_empty())
                .map(|(_, v)| v.clone())
        })
    }

    fn all(&self, tags: &[&str]) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(t, v)| tags.contains(&t.as_str()) && !v.is_empty())
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn into_article(self) -> Option<NewArticle> {
        let title = self.first(&["TI", "T1"])?;
        let doi = self.first(&["DO"])?;

        let pages = match (self.first(&["SP"]), self.first(&["EP"])) {
            (Some(start), Some(end)) => Some(format!("{start}-{end}")),
            (start, _) => start,
        };
        let urls = self.all(&["UR"]);

        Some(NewArticle {
            title,
            authors: self.all(&["AU", "A1"]),
            abstract_text: self.first(&["AB", "N2"]),
            publication_date: self.first(&["DA"]),
            year: self.first(&["PY", "Y1"]).as_deref().and_then(leading_year),
            journal: self.first(&["JO", "JF", "T2"]),
            volume: self.first(&["VL"]),
            issue: self.first(&["IS"]),
            pages,
            publication_type: self.first(&["TY"]),
            doi: normalize_doi(&doi),
            pmid: self.first(&["AN"]),
            pmcid: None,
            issn: self.first(&["SN"]),
            keywords: self.all(&["KW"]),
            mesh_terms: Vec::new(),
            article_url: urls.first().cloned(),
            urls,
            source_filename: None,
        })
    }
}

/// Parse RIS text. Records missing a DOI or a title are counted as skipped.
///
/// # Errors
///
/// Returns `ImportError::Parse` when content appears outside a `TY`..`ER`
/// record.
pub fn parse(content: &str) -> Result<ParsedImport, ImportError> {
    let mut parsed = ParsedImport::default();
    let mut current: Option<Record> = None;

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim_start_matches('\u{feff}').trim_end();
        let Some(record) = current.as_mut() else {
            match split_tag(line) {
                Some(("TY", value)) => {
                    current = Some(Record {
                        fields: vec![("TY".into(), value.to_string())],
                    });
                }
                None if line.is_empty() => {}
                _ => return Err(parse_error(index, "content outside a TY..ER record")),
            }
            continue;
        };
        match split_tag(line) {
            Some(("TY", _)) => return Err(parse_error(index, "TY inside an open record")),
            Some(("ER", _)) => {
                if let Some(record) = current.take() {
                    finish(record, &mut parsed);
                }
            }
            Some((tag, value)) => record.fields.push((tag.to_string(), value.to_string())),
            None if line.is_empty() => {}
            None => {
                if let Some((_, value)) = record.fields.last_mut() {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(line.trim());
                }
            }
        }
    }

    if let Some(record) = current {
        tracing::debug!("RIS input ended without ER; keeping the open record");
        finish(record, &mut parsed);
    }
    Ok(parsed)
}

fn finish(record: Record, parsed: &mut ParsedImport) {
    match record.into_article() {
        Some(article) => parsed.articles.push(article),
        None => {
            tracing::debug!("skipping RIS record without DOI or title");
            parsed.skipped += 1;
        }
    }
}

fn parse_error(index: usize, message: &str) -> ImportError {
    ImportError::Parse {
        format: FORMAT,
        line: index + 1,
        message: message.to_string(),
    }
}

/// Normalise a DOI for comparison: trimmed, lower-case, without resolver prefix.
#[must_use]
pub fn normalize_doi(doi: &str) -> Option<String> {
    let doi = doi.trim();
    let lower = doi.to_ascii_lowercase();
    let stripped = ["https://doi.org/", "http://doi.org/", "https://dx.doi.org/", "doi:"]
        .iter()
        .find_map(|prefix| lower.strip_prefix(prefix))
        .unwrap_or(&lower);
    non_empty(stripped.trim())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const SAMPLE: &str = "\
TY  - JOUR
TI  - Aerobic exercise for depression in adults
AU  - Smith, John
AU  - Doe, Alice
AB  - We randomised 120 adults
      to supervised exercise.
PY  - 2021/05/10
DA  - 2021/05/10
JO  - Journal of Affective Disorders
VL  - 12
IS  - 3
SP  - 101
EP  - 110
DO  - 10.1000/jad.2021.1
AN  - 33445566
SN  - 0165-0327
KW  - exercise
KW  - depression
UR  - https://example.org/a
UR  - https://example.org/b
ER  -

TY  - JOUR
TI  - Record without a DOI
ER  -
";

    #[test]
    fn parses_full_record() {
        let parsed = parse(SAMPLE).unwrap();
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.articles.len(), 1);

        let article = &parsed.articles[0];
        assert_eq!(article.title, "Aerobic exercise for depression in adults");
        assert_eq!(article.authors, vec!["Smith, John", "Doe, Alice"]);
        assert_eq!(
            article.abstract_text.as_deref(),
            Some("We randomised 120 adults to supervised exercise.")
        );
        assert_eq!(article.year, Some(2021));
        assert_eq!(article.publication_date.as_deref(), Some("2021/05/10"));
        assert_eq!(article.pages.as_deref(), Some("101-110"));
        assert_eq!(article.publication_type.as_deref(), Some("JOUR"));
        assert_eq!(article.doi.as_deref(), Some("10.1000/jad.2021.1"));
        assert_eq!(article.pmid.as_deref(), Some("33445566"));
        assert_eq!(article.keywords, vec!["exercise", "depression"]);
        assert_eq!(article.article_url.as_deref(), Some("https://example.org/a"));
        assert_eq!(article.urls.len(), 2);
    }

    #[test]
    fn alternate_tags_are_used_as_fallbacks() {
        let input = "TY  - JOUR\nT1  - Primary title\nA1  - Roe, R\nN2  - Notes abstract\nY1  - 1999\nT2  - Secondary journal\nSP  - 7\nDO  - 10.1/x\nER  - \n";
        let article = &parse(input).unwrap().articles[0];
        assert_eq!(article.title, "Primary title");
        assert_eq!(article.authors, vec!["Roe, R"]);
        assert_eq!(article.abstract_text.as_deref(), Some("Notes abstract"));
        assert_eq!(article.year, Some(1999));
        assert_eq!(article.journal.as_deref(), Some("Secondary journal"));
        assert_eq!(article.pages.as_deref(), Some("7"));
    }

    #[test]
    fn missing_end_tag_keeps_last_record() {
        let parsed = parse("TY  - JOUR\nTI  - Open\nDO  - 10.1/open\n").unwrap();
        assert_eq!(parsed.articles.len(), 1);
    }

    #[test]
    fn stray_content_is_a_parse_error() {
        let err = parse("TI  - No record start\n").unwrap_err();
        assert!(matches!(err, ImportError::Parse { line: 1, .. }));
    }

    #[test]
    fn empty_input_yields_nothing() {
        let parsed = parse("\n\n").unwrap();
        assert!(parsed.articles.is_empty());
        assert_eq!(parsed.skipped, 0);
    }

    #[rstest]
    #[case("10.1000/ABC", Some("10.1000/abc"))]
    #[case("https://doi.org/10.1000/abc", Some("10.1000/abc"))]
    #[case("doi:10.1000/abc", Some("10.1000/abc"))]
    #[case("   ", None)]
    fn doi_normalisation(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(normalize_doi(raw).as_deref(), expected);
    }
}
