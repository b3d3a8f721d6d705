//! Tolerant parser for the LLM-produced wiki outline.
//!
//! Expected shape (surrounding prose is ignored):
//! ```xml
//! <wiki_structure>
//!   <section title="Core Architecture">
//!     <page title="Request Lifecycle" importance="high">
//!       <files><file>src/lib.rs</file><file>src/server.rs</file></files>
//!     </page>
//!   </section>
//! </wiki_structure>
//! ```

use regex::Regex;
use repowiki_domain::entities::PageImportance;

/// One page parsed from the outline, before generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlinePage {
    pub title: String,
    pub importance: PageImportance,
    pub relevant_files: Vec<String>,
}

/// One section parsed from the outline.
#[derive(Debug, Clone)]
pub struct OutlineSection {
    pub title: String,
    pub pages: Vec<OutlinePage>,
}

/// Parse an LLM outline response. On any structural failure — missing
/// `<wiki_structure>`, zero sections, zero pages — returns the one-section
/// default outline rather than failing the job.
#[must_use]
pub fn parse_outline(response: &str) -> Vec<OutlineSection> {
    try_parse(response).filter(|s| !s.is_empty()).unwrap_or_else(default_outline)
}

fn try_parse(response: &str) -> Option<Vec<OutlineSection>> {
    let structure_re = Regex::new(r"(?s)<wiki_structure>(.*?)</wiki_structure>").ok()?;
    let body = structure_re.captures(response)?.get(1)?.as_str();

    let section_re = Regex::new(r#"(?s)<section\s+title="([^"]*)">(.*?)</section>"#).ok()?;
    let page_re =
        Regex::new(r#"(?s)<page\s+title="([^"]*)"\s+importance="([^"]*)">(.*?)</page>"#).ok()?;
    let file_re = Regex::new(r"(?s)<file>([^<]*)</file>").ok()?;

    let mut sections = Vec::new();
    for section_caps in section_re.captures_iter(body) {
        let title = section_caps.get(1)?.as_str().trim().to_owned();
        let section_body = section_caps.get(2)?.as_str();

        let mut pages = Vec::new();
        for page_caps in page_re.captures_iter(section_body) {
            let page_title = page_caps.get(1)?.as_str().trim().to_owned();
            let importance = parse_importance(page_caps.get(2)?.as_str());
            let files_body = page_caps.get(3)?.as_str();
            let relevant_files = file_re
                .captures_iter(files_body)
                .map(|c| c.get(1).map(|m| m.as_str().trim().to_owned()))
                .collect::<Option<Vec<_>>>()?;
            pages.push(OutlinePage {
                title: page_title,
                importance,
                relevant_files,
            });
        }

        if !pages.is_empty() {
            sections.push(OutlineSection { title, pages });
        }
    }

    Some(sections)
}

fn parse_importance(raw: &str) -> PageImportance {
    match raw.trim().to_ascii_lowercase().as_str() {
        "high" => PageImportance::High,
        "low" => PageImportance::Low,
        _ => PageImportance::Medium,
    }
}

/// Single-section fallback used when the outline cannot be parsed.
fn default_outline() -> Vec<OutlineSection> {
    vec![OutlineSection {
        title: "Overview".to_owned(),
        pages: vec![OutlinePage {
            title: "Project Summary".to_owned(),
            importance: PageImportance::High,
            relevant_files: Vec::new(),
        }],
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_outline() {
        let xml = r#"
        Here is the outline:
        <wiki_structure>
          <section title="Core">
            <page title="Router" importance="high">
              <files><file>src/router.rs</file><file>src/dispatch.rs</file></files>
            </page>
          </section>
        </wiki_structure>
        Hope that helps!
        "#;
        let sections = parse_outline(xml);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Core");
        assert_eq!(sections[0].pages[0].title, "Router");
        assert_eq!(sections[0].pages[0].relevant_files.len(), 2);
    }

    #[test]
    fn falls_back_on_missing_structure() {
        let sections = parse_outline("I couldn't produce an outline, sorry.");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Overview");
    }

    #[test]
    fn falls_back_on_empty_sections() {
        let sections = parse_outline("<wiki_structure></wiki_structure>");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Overview");
    }
}
