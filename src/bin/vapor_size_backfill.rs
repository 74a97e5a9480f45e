use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use vapor_size_bench::backfill::{self, NpmInstaller, NpmRegistry};
use vapor_size_bench::config::BenchConfig;
use vapor_size_bench::harness;
use vapor_size_bench::Mode;

#[derive(Parser, Debug)]
#[command(name = "vapor-size-backfill")]
#[command(about = "Benchmark every published alpha release missing from history")]
struct Args {
    /// Demo project root containing the tracked sources and build script.
    #[arg(long, env = "VAPOR_BENCH_ROOT", default_value = ".", value_name = "DIR")]
    root: PathBuf,
}

fn main() -> ExitCode {
    vapor_size_bench::init_logging();
    let args = Args::parse();
    let cfg = BenchConfig::new(args.root);

    let registry = NpmRegistry::new(&cfg);
    let installer = NpmInstaller::new(&cfg);
    let result = backfill::backfill(&cfg, &registry, &installer, |_version| {
        harness::run_benchmark(&cfg, Mode::Benchmark).map(|outcome| outcome.entry)
    });

    match result {
        Ok(summary) => {
            println!("\nBackfill summary:");
            println!("  Attempted: {}", summary.attempted());
            println!("  Succeeded: {}", summary.succeeded.len());
            println!("  Failed:    {}", summary.failed.len());
            for (version, reason) in &summary.failed {
                println!("    {version}: {reason}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    }
}
