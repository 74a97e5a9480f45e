use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use vapor_size_bench::config::BenchConfig;
use vapor_size_bench::error::Result;
use vapor_size_bench::harness;
use vapor_size_bench::Mode;

#[derive(Parser, Debug)]
#[command(name = "vapor-size-bench")]
#[command(about = "Measure Vapor vs Classic bundle size and record it in history")]
struct Args {
    /// Build unminified, source-mapped output. The result is reported but not
    /// written to history.
    #[arg(long, default_value_t = false)]
    inspect: bool,

    /// Demo project root containing the tracked sources and build script.
    #[arg(long, env = "VAPOR_BENCH_ROOT", default_value = ".", value_name = "DIR")]
    root: PathBuf,

    /// History file (default: bench/history.json under the root).
    #[arg(long, value_name = "FILE")]
    history: Option<PathBuf>,

    /// Report file (default: bench/report.md under the root).
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Also write this run's entry as JSON.
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
}

fn run(args: Args) -> Result<()> {
    let mut cfg = BenchConfig::new(args.root);
    if let Some(history) = args.history {
        cfg.history_file = history;
    }
    if let Some(report) = args.report {
        cfg.report_file = report;
    }

    let mode = if args.inspect {
        Mode::Inspect
    } else {
        Mode::Benchmark
    };
    let outcome = harness::run_benchmark(&cfg, mode)?;

    if let Some(out) = args.out {
        let json = serde_json::to_string_pretty(&outcome.entry)?;
        fs::write(out, json)?;
    }
    println!("{}", outcome.report);
    Ok(())
}

fn main() -> ExitCode {
    vapor_size_bench::init_logging();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    }
}
