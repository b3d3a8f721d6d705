//! Pipeline-wide tunables. Values follow the defaults recommended by the
//! processing-pipeline design rather than being derived empirically here.

use std::time::Duration;

/// Directories never walked during the Parse stage.
pub const SKIP_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "venv",
    ".idea",
    ".vscode",
];

/// Per-file size cap for source files (1 MiB).
pub const MAX_CODE_FILE_BYTES: u64 = 1024 * 1024;

/// Per-file size cap for documentation/config files (100 KiB).
pub const MAX_DOC_FILE_BYTES: u64 = 100 * 1024;

/// Token budget above which a code chunk is re-segmented by sliding window
/// (approximated as `content.len() / 4`).
pub const CHUNK_TOKEN_BUDGET: usize = 6_000;

/// Sliding-window overlap, in lines, applied when a chunk is re-segmented.
pub const SLIDING_WINDOW_OVERLAP_LINES: usize = 20;

/// Cap, in bytes, for a single-`module`-chunk fallback when a file has no
/// extractable structure.
pub const MODULE_CHUNK_CAP_BYTES: usize = 8 * 1024;

/// Minimum embedding batch size.
pub const EMBED_BATCH_MIN: usize = 10;
/// Maximum embedding batch size.
pub const EMBED_BATCH_MAX: usize = 50;

/// Global concurrency bound on in-flight embedding/LLM batch calls per process.
pub const EMBED_CONCURRENCY: usize = 10;

/// Embedding/LLM call retry attempts.
pub const RETRY_ATTEMPTS: u32 = 3;
/// Initial retry backoff delay.
pub const RETRY_INITIAL_DELAY: Duration = Duration::from_secs(2);
/// Retry backoff delay cap.
pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(30);

/// Wiki page-generation concurrency bound.
pub const WIKI_PAGE_CONCURRENCY: usize = 5;

/// Dirty-page ratio above which incremental wiki regeneration is refused in
/// favor of a `full_regen_suggested` signal.
pub const WIKI_DIRTY_THRESHOLD: f64 = 0.65;

/// Dirty-page ratio within a section above which the LLM is asked whether the
/// section title should change.
pub const SECTION_RETITLE_THRESHOLD: f64 = 0.80;

/// Cancellation flag TTL.
pub const CANCEL_FLAG_TTL: Duration = Duration::from_secs(3_600);

/// Grace period repo deletion waits after setting the cancel flag, before
/// proceeding to cascading delete, to let the worker release write locks.
pub const DELETE_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// LLM call timeout.
pub const LLM_CALL_TIMEOUT: Duration = Duration::from_secs(240);
/// Git clone timeout.
pub const GIT_CLONE_TIMEOUT: Duration = Duration::from_secs(600);
/// Git fetch timeout.
pub const GIT_FETCH_TIMEOUT: Duration = Duration::from_secs(120);
/// Git diff timeout.
pub const GIT_DIFF_TIMEOUT: Duration = Duration::from_secs(60);

/// Job-runner retry backoff delays (in order) on unexpected exceptions.
pub const JOB_RETRY_DELAYS: [Duration; 2] = [Duration::from_secs(30), Duration::from_secs(60)];

/// Maximum unexpected-exception retries for a job before giving up.
pub const JOB_MAX_RETRIES: u32 = 2;

/// How often (in files processed) the Parse/Embed loops publish a progress
/// event, to avoid flooding the progress bus on large repositories.
pub const PROGRESS_UPDATE_INTERVAL: usize = 10;
