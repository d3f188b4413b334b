//! PubMed MEDLINE (`.txt`) reader.
//!
//! Tag lines look like `PMID- 12345` or `TI  - Title`; lines indented by six
//! spaces (or a tab) continue the previous tag; a blank line ends the record.

use std::collections::HashMap;

use sift_core::inputs::NewArticle;

use crate::error::ImportError;
use crate::ris::normalize_doi;
use crate::{ParsedImport, leading_year};

const FORMAT: &str = "MEDLINE";

/// Tags that may repeat within a record.
const LIST_TAGS: [&str; 7] = ["AU", "FAU", "MH", "OT", "PT", "AID", "IS"];

/// Split a `TAG - value` line. Tags are two to four upper-case letters.
fn split_tag(line: &str) -> Option<(&str, &str)> {
    let tag_len = line.bytes().take_while(u8::is_ascii_uppercase).count();
    if !(2..=4).contains(&tag_len) {
        return None;
    }
    let rest = line[tag_len..].trim_start();
    let value = rest.strip_prefix('-')?;
    Some((&line[..tag_len], value.trim()))
}

fn is_continuation(line: &str) -> bool {
    line.starts_with("      ") || line.starts_with('\t')
}

#[derive(Debug, Default)]
struct Record {
    single: HashMap<String, String>,
    lists: HashMap<String, Vec<String>>,
}

impl Record {
    fn is_empty(&self) -> bool {
        self.single.is_empty() && self.lists.is_empty()
    }

    fn add(&mut self, tag: &str, parts: &[String]) {
        let value = parts.join(" ");
        if value.is_empty() {
            return;
        }
        if LIST_TAGS.contains(&tag) {
            self.lists.entry(tag.to_string()).or_default().push(value);
        } else {
            self.single.entry(tag.to_string()).or_insert(value);
        }
    }

    fn get(&self, tag: &str) -> Option<String> {
        self.single.get(tag).cloned()
    }

    fn list(&self, tag: &str) -> Vec<String> {
        self.lists.get(tag).cloned().unwrap_or_default()
    }

    fn into_article(self) -> Option<NewArticle> {
        let pmid = self.get("PMID")?;
        let title = self.get("TI")?;

        let authors = match self.lists.get("FAU") {
            Some(full) => full.clone(),
            None => self.list("AU"),
        };
        let doi = self
            .list("AID")
            .iter()
            .find(|aid| aid.contains("[doi]"))
            .and_then(|aid| normalize_doi(&aid.replace("[doi]", "")));
        let publication_type = Some(self.list("PT").join("; ")).filter(|pt| !pt.is_empty());
        let date = self.get("DP");

        Some(NewArticle {
            title,
            authors,
            abstract_text: self.get("AB"),
            year: date.as_deref().and_then(leading_year),
            publication_date: date,
            journal: self.get("JT").or_else(|| self.get("TA")),
            volume: self.get("VI"),
            issue: self.get("IP"),
            pages: self.get("PG"),
            publication_type,
            doi,
            pmid: Some(pmid),
            pmcid: self.get("PMC"),
            issn: pick_issn(&self.list("IS")),
            keywords: self.list("OT"),
            mesh_terms: self.list("MH"),
            article_url: None,
            urls: Vec::new(),
            source_filename: None,
        })
    }
}

/// First non-Linking ISSN, else the first one, reduced to the number.
fn pick_issn(values: &[String]) -> Option<String> {
    let number = |value: &String| {
        let digits: String = value
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '-' || *c == 'X')
            .collect();
        Some(digits).filter(|d| !d.is_empty())
    };
    values
        .iter()
        .filter(|v| !v.contains("Linking"))
        .find_map(number)
        .or_else(|| values.first().and_then(number))
}

/// Parse MEDLINE text. Records missing a PMID or a title are counted as
/// skipped.
///
/// # Errors
///
/// Returns `ImportError::Parse` for a continuation line that has no tag to
/// continue.
pub fn parse(content: &str) -> Result<ParsedImport, ImportError> {
    let mut parsed = ParsedImport::default();
    let mut record = Record::default();
    let mut tag: Option<String> = None;
    let mut parts: Vec<String> = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim_start_matches('\u{feff}').trim_end_matches(['\r', '\n']);

        if let Some((next, value)) = split_tag(line) {
            if let Some(previous) = tag.replace(next.to_string()) {
                record.add(&previous, &parts);
            }
            parts = vec![value.to_string()];
        } else if is_continuation(line) && !line.trim().is_empty() {
            if tag.is_none() {
                return Err(ImportError::Parse {
                    format: FORMAT,
                    line: index + 1,
                    message: "continuation line without a tag".into(),
                });
            }
            parts.push(line.trim().to_string());
        } else if line.trim().is_empty() {
            if let Some(previous) = tag.take() {
                record.add(&previous, &parts);
            }
            parts.clear();
            finish(std::mem::take(&mut record), &mut parsed);
        }
    }

    if let Some(previous) = tag {
        record.add(&previous, &parts);
    }
    finish(record, &mut parsed);
    Ok(parsed)
}

fn finish(record: Record, parsed: &mut ParsedImport) {
    if record.is_empty() {
        return;
    }
    match record.into_article() {
        Some(article) => parsed.articles.push(article),
        None => {
            tracing::debug!("skipping MEDLINE record without PMID or title");
            parsed.skipped += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const SAMPLE: &str = "\
PMID- 31234567
OWN - NLM
TI  - Aerobic exercise and depressive symptoms in older adults: a randomised
      controlled trial.
AB  - Background: Depression is common.
      Methods: We randomised 200 adults.
FAU - Smith, John
AU  - Smith J
FAU - Doe, Alice
AU  - Doe A
DP  - 2019 Mar 15
JT  - Journal of Geriatric Psychiatry
TA  - J Geriatr Psychiatry
VI  - 34
IP  - 2
PG  - 201-210
IS  - 1099-1166 (Electronic)
IS  - 0885-6230 (Linking)
AID - S0885-6230(19)00012 [pii]
AID - 10.1002/GPS.5012 [doi]
MH  - Aged
MH  - Exercise Therapy
OT  - physical activity
PMC - PMC6543210
PT  - Journal Article
PT  - Randomized Controlled Trial

PMID- 31234568
AB  - Title-less record.
";

    #[test]
    fn parses_full_record() {
        let parsed = parse(SAMPLE).unwrap();
        assert_eq!(parsed.articles.len(), 1);
        assert_eq!(parsed.skipped, 1);

        let article = &parsed.articles[0];
        assert_eq!(article.pmid.as_deref(), Some("31234567"));
        assert_eq!(
            article.title,
            "Aerobic exercise and depressive symptoms in older adults: a randomised controlled trial."
        );
        assert_eq!(
            article.abstract_text.as_deref(),
            Some("Background: Depression is common. Methods: We randomised 200 adults.")
        );
        assert_eq!(article.authors, vec!["Smith, John", "Doe, Alice"]);
        assert_eq!(article.year, Some(2019));
        assert_eq!(article.publication_date.as_deref(), Some("2019 Mar 15"));
        assert_eq!(article.journal.as_deref(), Some("Journal of Geriatric Psychiatry"));
        assert_eq!(article.pages.as_deref(), Some("201-210"));
        assert_eq!(article.issn.as_deref(), Some("1099-1166"));
        assert_eq!(article.doi.as_deref(), Some("10.1002/gps.5012"));
        assert_eq!(article.mesh_terms, vec!["Aged", "Exercise Therapy"]);
        assert_eq!(article.keywords, vec!["physical activity"]);
        assert_eq!(article.pmcid.as_deref(), Some("PMC6543210"));
        assert_eq!(
            article.publication_type.as_deref(),
            Some("Journal Article; Randomized Controlled Trial")
        );
    }

    #[test]
    fn abbreviated_authors_and_journal_are_fallbacks() {
        let parsed = parse("PMID- 1\nTI  - Short\nAU  - Roe R\nTA  - J Short\n").unwrap();
        let article = &parsed.articles[0];
        assert_eq!(article.authors, vec!["Roe R"]);
        assert_eq!(article.journal.as_deref(), Some("J Short"));
    }

    #[test]
    fn blank_lines_between_records_are_ignored() {
        let parsed = parse("\n\nPMID- 1\nTI  - One\n\n\n\nPMID- 2\nTI  - Two\n\n").unwrap();
        let pmids: Vec<_> = parsed.articles.iter().filter_map(|a| a.pmid.clone()).collect();
        assert_eq!(pmids, vec!["1", "2"]);
        assert_eq!(parsed.skipped, 0);
    }

    #[test]
    fn orphan_continuation_is_a_parse_error() {
        let err = parse("      floating text\n").unwrap_err();
        assert!(matches!(err, ImportError::Parse { line: 1, .. }));
    }

    #[rstest]
    #[case("PMID- 123", Some(("PMID", "123")))]
    #[case("TI  - A title", Some(("TI", "A title")))]
    #[case("LID - 10.1/x [doi]", Some(("LID", "10.1/x [doi]")))]
    #[case("      continued", None)]
    #[case("Plain prose line", None)]
    fn tag_lines(#[case] line: &str, #[case] expected: Option<(&str, &str)>) {
        assert_eq!(split_tag(line), expected);
    }

    #[test]
    fn linking_issn_is_last_resort() {
        assert_eq!(
            pick_issn(&["0885-6230 (Linking)".to_string()]).as_deref(),
            Some("0885-6230")
        );
        assert_eq!(pick_issn(&[]), None);
    }
}
