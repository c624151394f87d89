use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;

use sgrna_picks::fold::FoldOptions;
use sgrna_picks::peaks::{PeakPolicy, ThresholdPolicy, DEFAULT_PERCENTILE};
use sgrna_picks::{pick_best_seqs, PickConfig};

/// Pick well-separated, high-scoring checkpoints from design trajectories
/// and write out the sequence at each one.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Trajectory logs (.tsv or .tsv.gz). Defaults to logs/mh.tsv.
    #[arg(value_name = "TSV")]
    trajectories: Vec<PathBuf>,

    /// Half-width of the window suppressed around each pick.
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    window_size: u64,

    /// Percentile of each trajectory's scores a pick must reach.
    #[arg(short, long, default_value_t = DEFAULT_PERCENTILE, conflicts_with_all = ["threshold", "legacy"])]
    percentile: f64,

    /// Absolute score a pick must reach, instead of a percentile.
    #[arg(short, long, allow_negative_numbers = true, conflicts_with = "legacy")]
    threshold: Option<f64>,

    /// Use the older picking rules: half-width windows and no quality bar.
    #[arg(long)]
    legacy: bool,

    /// Where to write the picks table.
    #[arg(short, long, value_name = "PATH", default_value = "picks.tsv")]
    output: PathBuf,

    /// Also write the picks as FASTA.
    #[arg(long, value_name = "PATH")]
    fasta: Option<PathBuf>,

    /// Fold every pick with RNAfold and write the results here.
    #[arg(short, long, value_name = "PATH")]
    fold: Option<PathBuf>,

    /// Fold with the theophylline aptamer motif.
    #[arg(long, requires = "fold")]
    theo: bool,

    /// RNAfold executable.
    #[arg(long, value_name = "PATH", default_value = "RNAfold")]
    rnafold: String,

    /// Extra argument for RNAfold; may be repeated.
    #[arg(long = "rnafold-arg", value_name = "ARG", allow_hyphen_values = true)]
    rnafold_args: Vec<String>,

    /// Number of worker threads. Defaults to the number of logical cores.
    #[arg(short = 'j', long, value_name = "NUM")]
    threads: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn config(&self) -> PickConfig {
        let policy = if self.legacy {
            PeakPolicy::legacy()
        } else {
            let threshold = match self.threshold {
                Some(t) => ThresholdPolicy::Fixed(t),
                None => ThresholdPolicy::Percentile(self.percentile),
            };
            PeakPolicy {
                threshold,
                ..PeakPolicy::default()
            }
        };

        let fold = self.fold.as_ref().map(|_| FoldOptions {
            program: self.rnafold.clone(),
            extra_args: self.rnafold_args.clone(),
            theo: self.theo,
        });

        PickConfig {
            window_size: self.window_size as usize,
            policy,
            fold,
        }
    }

    fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

fn spinner(color: &str, message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&[
                "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏",
            ])
            .template(&format!("{{spinner:.{color}}} {{msg}}"))
            .expect("Invalid spinner template"),
    );
    spinner.set_message(message.to_string());
    spinner
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(num_threads) = cli.threads {
        log::info!("Setting rayon global thread pool to {} threads", num_threads);
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()?;
    }

    let config = cli.config();
    log::debug!("Run configuration: {:?}", config);

    // 1. Load, pick and (optionally) fold
    let message = if config.fold.is_some() {
        "Picking and folding sequences..."
    } else {
        "Picking sequences..."
    };
    let progress = spinner("green", message);
    let results = pick_best_seqs(&cli.trajectories, &config)?;
    progress.finish_with_message(format!(
        "Picked {} sequence(s) from {} trajectory file(s).",
        results.picks.len(),
        results.trajectories.len()
    ));

    // 2. Write outputs
    let progress = spinner("yellow", "Writing output files...");
    fs::write(&cli.output, results.get_picks_tsv())?;

    if let Some(path) = &cli.fasta {
        fs::write(path, results.get_fasta())?;
    }

    if let (Some(path), Some(text)) = (&cli.fold, results.get_folds_text()) {
        fs::write(path, text)?;
    }
    progress.finish_with_message(format!("Wrote {}.", cli.output.display()));

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    if let Err(e) = run(cli) {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use sgrna_picks::peaks::SuppressionPolicy;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_use_the_percentile_policy() {
        let cli = Cli::parse_from(["sgrna-picks", "run.tsv"]);
        let config = cli.config();
        assert_eq!(config.window_size, 10);
        assert_eq!(config.policy, PeakPolicy::default());
        assert!(config.fold.is_none());
        assert_eq!(cli.trajectories, vec![PathBuf::from("run.tsv")]);
    }

    #[test]
    fn fixed_threshold_and_folding_flags() {
        let cli = Cli::parse_from([
            "sgrna-picks", "-w", "25", "-t", "-3.5", "--fold", "folds.txt", "--theo",
            "--rnafold-arg", "-T", "--rnafold-arg", "30",
        ]);
        let config = cli.config();
        assert_eq!(config.window_size, 25);
        assert_eq!(config.policy.threshold, ThresholdPolicy::Fixed(-3.5));
        assert_eq!(config.policy.suppression, SuppressionPolicy::TrueMinimum);

        let fold = config.fold.unwrap();
        assert!(fold.theo);
        assert_eq!(fold.program, "RNAfold");
        assert_eq!(fold.extra_args, vec!["-T", "30"]);
    }

    #[test]
    fn legacy_flag_selects_the_legacy_policy() {
        let cli = Cli::parse_from(["sgrna-picks", "--legacy"]);
        assert_eq!(cli.config().policy, PeakPolicy::legacy());
    }

    #[test]
    fn zero_window_is_rejected() {
        assert!(Cli::try_parse_from(["sgrna-picks", "-w", "0"]).is_err());
    }

    #[test]
    fn theo_requires_fold() {
        assert!(Cli::try_parse_from(["sgrna-picks", "--theo"]).is_err());
    }
}
