use std::fs::{create_dir_all, File};
use std::io::BufWriter;
use std::path::PathBuf;

use crate::engine::EpidemicEngine;
use crate::error::AirborneError;
use crate::log::{apply_log_levels, info};
use crate::parameters::{load_parameters, Parameters};
use crate::stats::Summary;
use clap::{Args, Command, FromArgMatches as _};

/// File name of the per-tick ledger inside `--output-dir`.
pub const LEDGER_FILE: &str = "ledger.csv";
/// File name of the run summary inside `--output-dir`.
pub const SUMMARY_FILE: &str = "summary.json";

/// Default cli arguments for the airborne runner
#[derive(Args, Debug, Default)]
pub struct BaseArgs {
    /// Random seed, overrides the seed of the config file
    #[arg(short, long)]
    pub random_seed: Option<u64>,

    /// Optional path for a JSON parameters file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of ticks to run, 0 runs until nobody is infectious. Overrides the config file
    #[arg(short, long)]
    pub tick_limit: Option<usize>,

    /// Optional directory for the ledger and summary. The summary goes to stdout otherwise
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Log levels, e.g. `info` or `warn,airborne::engine=trace`
    #[arg(short, long)]
    pub log_level: Option<String>,
}

fn create_airborne_cli() -> Command {
    let cli = Command::new("airborne").about("Simulates an airborne epidemic on a grid");
    BaseArgs::augment_args(cli)
}

/// Runs a simulation configured from the command line.
///
/// # Errors
/// Returns an error if argument parsing, configuration or writing the output fails
pub fn run_with_args() -> Result<EpidemicEngine, Box<dyn std::error::Error>> {
    let cli = create_airborne_cli();
    let matches = cli.get_matches();

    let base_args_matches = BaseArgs::from_arg_matches(&matches)?;
    Ok(run_with_args_internal(base_args_matches)?)
}

/// Combines the config file (or the defaults) with the command line overrides.
fn resolve_parameters(args: &BaseArgs) -> Result<Parameters, AirborneError> {
    let mut parameters = match &args.config {
        Some(path) => {
            info!("loading parameters from: {}", path.display());
            load_parameters(path)?
        }
        None => Parameters::default(),
    };
    if let Some(seed) = args.random_seed {
        parameters.seed = Some(seed);
    }
    if let Some(tick_limit) = args.tick_limit {
        parameters.tick_limit = tick_limit;
    }
    Ok(parameters)
}

fn write_summary(summary: &Summary, path: PathBuf) -> Result<(), AirborneError> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, summary)?;
    Ok(())
}

pub(crate) fn run_with_args_internal(args: BaseArgs) -> Result<EpidemicEngine, AirborneError> {
    if let Some(spec) = &args.log_level {
        apply_log_levels(spec)?;
    }

    let parameters = resolve_parameters(&args)?;
    let mut engine = EpidemicEngine::new(parameters)?;
    let summary = engine.run();

    match &args.output_dir {
        Some(output_dir) => {
            create_dir_all(output_dir)?;
            engine.ledger().write_csv(&output_dir.join(LEDGER_FILE))?;
            write_summary(&summary, output_dir.join(SUMMARY_FILE))?;
            info!("wrote ledger and summary to {}", output_dir.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(engine)
}
