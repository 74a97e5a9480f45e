pub mod backfill;
pub mod build;
pub mod config;
pub mod error;
pub mod harness;
pub mod history;
pub mod measure;
pub mod report;
pub mod schema;
pub mod transform;
pub mod version;

pub use schema::Mode;

/// Build configuration being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    /// No-virtual-DOM compilation mode (the checked-in source).
    Vapor,
    /// Traditional virtual-DOM runtime.
    Classic,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Vapor => "vapor",
            Variant::Classic => "classic",
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("vapor_size_bench=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
