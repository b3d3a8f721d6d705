//! The [`Wiki`] / [`WikiSection`] / [`WikiPage`] tree — the hierarchical
//! generated documentation rooted at a repository.

use serde::{Deserialize, Serialize};

use crate::value_objects::{RepositoryId, WikiPageId, WikiSectionId};

/// Importance tag attached to a wiki page, used to prioritize navigation and
/// incremental-regeneration triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageImportance {
    /// Core architectural or entry-point documentation.
    High,
    /// Supporting subsystem documentation.
    Medium,
    /// Peripheral or auxiliary documentation.
    Low,
}

/// Marks a page as one of the system's well-known auto-generated pages
/// (as opposed to an LLM-outlined technical page).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellKnownPageType {
    /// Project overview page in the quick-start section.
    Overview,
    /// Content navigation page in the quick-start section.
    Navigation,
}

/// A leaf documentation page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiPage {
    /// Unique identifier.
    pub id: WikiPageId,
    /// Owning section.
    pub section_id: WikiSectionId,
    /// Page title.
    pub title: String,
    /// Importance tag.
    pub importance: PageImportance,
    /// Rendered Markdown body.
    pub body_markdown: String,
    /// Ordered list of relevant source file paths.
    pub relevant_files: Vec<String>,
    /// Short summary paragraph, used by the cross-reference navigation page.
    pub summary: Option<String>,
    /// Marks a well-known auto-generated page; `None` for LLM-outlined pages.
    pub page_type: Option<WellKnownPageType>,
    /// Position among sibling pages.
    pub order_index: u32,
}

impl WikiPage {
    /// Returns `true` if this page's relevant-files list intersects the given
    /// change set, after case-normalized path canonicalization.
    #[must_use]
    pub fn is_dirty(&self, changed_paths: &[String]) -> bool {
        let changed: std::collections::HashSet<String> =
            changed_paths.iter().map(|p| canonicalize(p)).collect();
        self.relevant_files
            .iter()
            .any(|p| changed.contains(&canonicalize(p)))
    }
}

fn canonicalize(path: &str) -> String {
    path.replace('\\', "/").to_ascii_lowercase()
}

/// An ordered group of pages within a wiki.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiSection {
    /// Unique identifier.
    pub id: WikiSectionId,
    /// Section title.
    pub title: String,
    /// Position among sibling sections. `0` is reserved for the
    /// system-generated quick-start section.
    pub order_index: u32,
    /// Pages belonging to this section, in display order.
    pub pages: Vec<WikiPage>,
}

impl WikiSection {
    /// `true` for the fixed quick-start section the generator assembles
    /// itself (never produced by the LLM outline step).
    #[must_use]
    pub fn is_quick_start(&self) -> bool {
        self.order_index == 0
    }

    /// Fraction of this section's pages whose relevant-files list intersects
    /// `changed_paths`.
    #[must_use]
    pub fn dirty_ratio(&self, changed_paths: &[String]) -> f64 {
        if self.pages.is_empty() {
            return 0.0;
        }
        let dirty = self
            .pages
            .iter()
            .filter(|p| p.is_dirty(changed_paths))
            .count();
        dirty as f64 / self.pages.len() as f64
    }
}

/// The three-level documentation tree rooted at a repository.
///
/// Invariant: a repo has at most one Wiki; replacing it is a cascading
/// delete followed by insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wiki {
    /// Owning repository.
    pub repo_id: RepositoryId,
    /// Wiki title.
    pub title: String,
    /// Ordered sections.
    pub sections: Vec<WikiSection>,
}

impl Wiki {
    /// Fraction of all technical pages (excluding the quick-start section)
    /// whose relevant-files list intersects `changed_paths`.
    #[must_use]
    pub fn dirty_ratio(&self, changed_paths: &[String]) -> f64 {
        let technical_pages: Vec<&WikiPage> = self
            .sections
            .iter()
            .filter(|s| !s.is_quick_start())
            .flat_map(|s| s.pages.iter())
            .collect();
        if technical_pages.is_empty() {
            return 0.0;
        }
        let dirty = technical_pages
            .iter()
            .filter(|p| p.is_dirty(changed_paths))
            .count();
        dirty as f64 / technical_pages.len() as f64
    }

    /// All pages across all sections whose relevant-files intersect the
    /// change set.
    #[must_use]
    pub fn dirty_pages(&self, changed_paths: &[String]) -> Vec<&WikiPage> {
        self.sections
            .iter()
            .filter(|s| !s.is_quick_start())
            .flat_map(|s| s.pages.iter())
            .filter(|p| p.is_dirty(changed_paths))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(files: &[&str], order: u32) -> WikiPage {
        WikiPage {
            id: WikiPageId::new(),
            section_id: WikiSectionId::new(),
            title: "Page".to_owned(),
            importance: PageImportance::Medium,
            body_markdown: String::new(),
            relevant_files: files.iter().map(|s| (*s).to_owned()).collect(),
            summary: None,
            page_type: None,
            order_index: order,
        }
    }

    #[test]
    fn dirty_detection_is_case_and_separator_insensitive() {
        let p = page(&["src/Lib.rs"], 1);
        assert!(p.is_dirty(&["SRC/lib.rs".to_owned()]));
        assert!(p.is_dirty(&["src\\Lib.rs".to_owned()]));
        assert!(!p.is_dirty(&["other.rs".to_owned()]));
    }

    #[test]
    fn quick_start_excluded_from_dirty_ratio() {
        let wiki = Wiki {
            repo_id: RepositoryId::new(),
            title: "t".to_owned(),
            sections: vec![
                WikiSection {
                    id: WikiSectionId::new(),
                    title: "Quick Start".to_owned(),
                    order_index: 0,
                    pages: vec![page(&["README.md"], 0)],
                },
                WikiSection {
                    id: WikiSectionId::new(),
                    title: "Core".to_owned(),
                    order_index: 1,
                    pages: vec![page(&["src/a.rs"], 0), page(&["src/b.rs"], 1)],
                },
            ],
        };
        // Only src/a.rs changed: 1 of 2 technical pages dirty, quick-start ignored.
        assert_eq!(wiki.dirty_ratio(&["src/a.rs".to_owned()]), 0.5);
    }
}
