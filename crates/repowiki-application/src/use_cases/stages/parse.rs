//! Parse stage: walk the clone, filter by denylist/size-cap/whitelist, hash
//! each file against [`FileStateStore`], dispatch to the parser registry,
//! then apply sliding-window re-segmentation.

use std::path::Path;
use std::sync::Arc;

use ignore::WalkBuilder;
use repowiki_domain::constants::{
    MAX_CODE_FILE_BYTES, MAX_DOC_FILE_BYTES, PROGRESS_UPDATE_INTERVAL, SKIP_DIRS,
};
use repowiki_domain::entities::{Chunk, Stage};
use repowiki_domain::error::{Error, Result};
use repowiki_domain::ports::{FileStateStore, ParserRegistry};
use repowiki_domain::value_objects::RepositoryId;
use sha2::{Digest, Sha256};

use super::StageContext;
use crate::use_cases::chunker::apply_sliding_window;

const DOC_EXTENSIONS: &[&str] = &["md", "rst", "txt"];
const NAMED_CONFIG_FILES: &[&str] = &[
    "package.json",
    "pyproject.toml",
    "docker-compose.yml",
    "docker-compose.yaml",
    "Dockerfile",
    ".env.example",
    "Cargo.toml",
    "go.mod",
];

/// Generated lockfiles: real extensions (`json`/`yaml`/`yml`) but pure
/// dependency-resolution output, never hand-authored and never worth a
/// chunk. Checked by exact filename before the extension whitelist.
const SKIP_FILES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Pipfile.lock",
    "poetry.lock",
    "go.sum",
];

/// Output of the Parse stage: the full chunk list (already sliding-window
/// split) and the content hash computed for each included path.
pub struct ParseOutput {
    pub chunks: Vec<Chunk>,
    pub path_hashes: std::collections::HashMap<String, String>,
}

pub struct ParseStage {
    file_states: Arc<dyn FileStateStore>,
    parser_registry: Arc<dyn ParserRegistry>,
}

impl ParseStage {
    #[must_use]
    pub fn new(file_states: Arc<dyn FileStateStore>, parser_registry: Arc<dyn ParserRegistry>) -> Self {
        Self {
            file_states,
            parser_registry,
        }
    }

    pub async fn run(
        &self,
        ctx: &StageContext,
        repo_id: RepositoryId,
        clone_path: &Path,
        full_rebuild: bool,
    ) -> Result<ParseOutput> {
        ctx.report(Stage::Parse, 25.0, "Parsing source files").await?;

        let files = discover_files(clone_path);
        let total = files.len();
        let mut chunks = Vec::new();
        let mut path_hashes = std::collections::HashMap::new();

        for (i, file_path) in files.iter().enumerate() {
            if i % PROGRESS_UPDATE_INTERVAL == 0 {
                let pct = 25.0 + 20.0 * (i as f32 / total.max(1) as f32);
                ctx.report(Stage::Parse, pct, "Parsing source files").await?;
            }

            let relative = file_path
                .strip_prefix(clone_path)
                .unwrap_or(file_path)
                .to_string_lossy()
                .replace('\\', "/");

            let content = match tokio::fs::read_to_string(file_path).await {
                Ok(c) => c,
                Err(_) => continue, // binary or unreadable; silently skipped
            };

            let hash = content_hash(&content);

            if !full_rebuild
                && let Some(existing) = self.file_states.get(&repo_id, &relative).await?
                && existing.is_current(&hash)
            {
                continue;
            }

            let language = self.parser_registry.detect_language(&relative);
            let input = repowiki_domain::ports::ParseInput {
                repo_id,
                file_path: &relative,
                content: &content,
                language: &language,
            };
            let file_chunks = self.parser_registry.parse_file(input).await?;

            path_hashes.insert(relative, hash);
            chunks.extend(file_chunks);
        }

        ctx.report(Stage::Parse, 45.0, "Parse complete").await?;

        let chunks = apply_sliding_window(chunks);

        if chunks.is_empty() && full_rebuild {
            return Err(Error::internal(
                "full process produced zero chunks; the clone may be empty or unparseable",
            ));
        }

        Ok(ParseOutput { chunks, path_hashes })
    }
}

fn discover_files(root: &Path) -> Vec<std::path::PathBuf> {
    let mut files = Vec::new();
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .filter_entry(|entry| {
            if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
                return true;
            }
            entry
                .file_name()
                .to_str()
                .is_none_or(|name| !SKIP_DIRS.contains(&name))
        })
        .build();

    for entry in walker.flatten() {
        if entry.file_type().is_some_and(|ft| ft.is_file()) && is_recognized(entry.path()) {
            if let Ok(meta) = entry.metadata()
                && meta.len() <= size_cap_for(entry.path())
            {
                files.push(entry.path().to_path_buf());
            }
        }
    }

    files
}

fn is_recognized(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if SKIP_FILES.contains(&name) {
        return false;
    }
    if NAMED_CONFIG_FILES.contains(&name) {
        return true;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => DOC_EXTENSIONS.contains(&ext) || is_known_source_extension(ext),
        None => false,
    }
}

fn is_known_source_extension(ext: &str) -> bool {
    matches!(
        ext,
        "rs" | "py" | "js" | "jsx" | "ts" | "tsx" | "go" | "java" | "rb" | "c" | "h" | "cpp"
            | "hpp" | "cs" | "php" | "kt" | "swift" | "toml" | "yaml" | "yml" | "json"
    )
}

fn size_cap_for(path: &Path) -> u64 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if DOC_EXTENSIONS.contains(&ext) => MAX_DOC_FILE_BYTES,
        _ => MAX_CODE_FILE_BYTES,
    }
}

fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_named_config_files() {
        assert!(is_recognized(Path::new("Dockerfile")));
        assert!(is_recognized(Path::new("pyproject.toml")));
    }

    #[test]
    fn recognizes_doc_extensions() {
        assert!(is_recognized(Path::new("README.md")));
        assert!(!is_recognized(Path::new("archive.bin")));
    }

    #[test]
    fn skips_generated_lockfiles_despite_matching_extensions() {
        assert!(!is_recognized(Path::new("package-lock.json")));
        assert!(!is_recognized(Path::new("yarn.lock")));
        assert!(!is_recognized(Path::new("pnpm-lock.yaml")));
        assert!(!is_recognized(Path::new("Pipfile.lock")));
        assert!(!is_recognized(Path::new("poetry.lock")));
        assert!(!is_recognized(Path::new("go.sum")));
    }

    #[test]
    fn hash_is_stable() {
        assert_eq!(content_hash("fn main() {}"), content_hash("fn main() {}"));
        assert_ne!(content_hash("a"), content_hash("b"));
    }
}
