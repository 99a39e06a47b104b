pub mod catalogue;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod hosted;
pub mod index;
pub mod llm;
pub mod matcher;
pub mod models;
pub mod utils;

pub use catalogue::Catalogue;
pub use error::{MatchError, Upstream};
pub use matcher::{FinderContext, MemeFinder};
pub use models::{CatalogueEntry, MatchResult, MemeMatch};

/// Install the stderr log subscriber used by the binaries
///
/// `RUST_LOG` wins; otherwise this crate logs at info.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("memefinder=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
