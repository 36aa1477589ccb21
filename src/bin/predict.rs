use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::anyhow;
use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info};

use formxg::classifier::FrequencyClassifier;
use formxg::config::Config;
use formxg::data;
use formxg::predictor::Predictor;
use formxg::print::{tabulate_predictions, tabulate_ranking, tabulate_report, tabulate_summary};
use formxg::summary::summarise;

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// CSV file to source the matches from
    #[clap(short = 'm', long)]
    matches: Option<PathBuf>,

    /// CSV file of individual top scorers
    #[clap(short = 's', long)]
    scorers: Option<PathBuf>,

    /// CSV file of fixtures to predict
    #[clap(short = 'f', long)]
    fixtures: Option<PathBuf>,

    /// JSON config file
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// team to summarise
    #[clap(short = 't', long)]
    team: Option<String>,
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
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    args.validate()?;
    debug!("args: {args:?}");

    let config = match &args.config {
        Some(path) => Config::read_json(path)?,
        None => Config::default(),
    };
    debug!("config: {config:?}");

    let start_time = Instant::now();
    let matches = data::read_matches_file(args.matches.as_ref().ok_or(anyhow!("no matches file"))?)?;
    let scorers = args.scorers.as_ref().map(data::read_scorers_file).transpose()?;
    let predictor = Predictor::train(&matches, scorers.as_ref(), config, FrequencyClassifier::default())?;
    info!("trained in {:.3}s", start_time.elapsed().as_secs_f64());

    let report = &predictor.history().report;
    info!("Derivations:\n{}", Console::default().render(&tabulate_report(report)));
    if let Some(ranking) = report.ranking.computed() {
        info!("Power ranking:\n{}", Console::default().render(&tabulate_ranking(ranking)));
    }

    if let Some(path) = &args.fixtures {
        let fixtures = data::read_fixtures_file(path)?;
        let predictions = fixtures
            .iter()
            .map(|fixture| predictor.predict(fixture))
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            "Predictions:\n{}",
            Console::default().render(&tabulate_predictions(&predictions))
        );
    }

    if let Some(team) = &args.team {
        let summary = summarise(&matches, team);
        info!("Summary:\n{}", Console::default().render(&tabulate_summary(&summary)));
    }
    Ok(())
}
