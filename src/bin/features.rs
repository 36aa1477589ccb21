use std::env;
use std::error::Error;
use std::io;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::anyhow;
use clap::Parser;
use tracing::{debug, info, warn};

use formxg::config::Config;
use formxg::csv::CsvWriter;
use formxg::data;
use formxg::feature::build_feature_table;

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// CSV file to source the matches from
    #[clap(short = 'm', long)]
    matches: Option<PathBuf>,

    /// CSV file of individual top scorers
    #[clap(short = 's', long)]
    scorers: Option<PathBuf>,

    /// JSON config file
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// rolling window, overriding the config
    #[clap(short = 'w', long)]
    window: Option<NonZeroUsize>,

    /// output CSV file; the table is written to stdout if omitted
    #[clap(short = 'o', long)]
    output: Option<PathBuf>,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        self.matches
            .as_ref()
            .ok_or(anyhow!("matches file must be specified"))?;
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    if env::var("RUST_BACKTRACE").is_err() {
        env::set_var("RUST_BACKTRACE", "full")
    }
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info")
    }
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let args = Args::parse();
    args.validate()?;
    debug!("args: {args:?}");

    let mut config = match &args.config {
        Some(path) => Config::read_json(path)?,
        None => Config::default(),
    };
    if let Some(window) = args.window {
        config.window = window;
    }
    config.validate()?;

    let start_time = Instant::now();
    let matches = data::read_matches_file(args.matches.as_ref().ok_or(anyhow!("no matches file"))?)?;
    let scorers = args.scorers.as_ref().map(data::read_scorers_file).transpose()?;
    let table = build_feature_table(&matches, scorers.as_ref(), config.window);
    for (stage, reason) in table.report.skipped() {
        warn!("{stage} stage skipped: {reason}");
    }
    for (stage, reason) in table.report.defaulted() {
        warn!("{stage} stage defaulted: {reason}");
    }

    match &args.output {
        Some(path) => data::write_feature_table(&table, &mut CsvWriter::create(path)?)?,
        None => data::write_feature_table(&table, &mut CsvWriter::new(io::stdout()))?,
    }
    let elapsed = start_time.elapsed();
    info!(
        "wrote {} rows with {} populated columns in {:.3}s",
        table.len(),
        table.columns.len(),
        elapsed.as_secs_f64()
    );
    Ok(())
}
