//! `tracing-subscriber` bootstrap for the worker process. JSON output when
//! `REPOWIKI_LOG_FORMAT=json` (production), human-readable otherwise (local
//! runs). Every line passes through the credential scrubber first.

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::scrubber::ScrubbingWriter;

#[derive(Clone)]
struct ScrubbingMakeWriter;

impl<'a> MakeWriter<'a> for ScrubbingMakeWriter {
    type Writer = ScrubbingWriter<std::io::Stdout>;

    fn make_writer(&'a self) -> Self::Writer {
        ScrubbingWriter(std::io::stdout())
    }
}

/// Initialize the global tracing subscriber. Call once at process start.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("REPOWIKI_LOG_FORMAT").as_deref() == Ok("json");

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(ScrubbingMakeWriter);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
