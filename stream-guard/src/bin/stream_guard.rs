//! stream-guard
//!
//! Runs the synthetic signal through a z-score detector, rendering each
//! sample to the terminal. Ctrl-C or reaching `--max-samples` stops the
//! stream and exports the anomalies to CSV. The run summary is printed to
//! stdout as JSON; logs go to stderr.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use stream_guard::logging::setup::{init_logging, LoggingConfig};
use stream_guard::logging::LogConfig;
use stream_guard::prelude::*;
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file; flags override its values
    #[arg(long, env = "STREAM_GUARD_CONFIG")]
    config: Option<PathBuf>,

    /// Detector window capacity
    #[arg(long, env = "STREAM_GUARD_WINDOW_SIZE")]
    window_size: Option<usize>,

    /// Z-score threshold; samples strictly above it are anomalies
    #[arg(long, env = "STREAM_GUARD_THRESHOLD")]
    threshold: Option<f64>,

    /// Samples kept on screen
    #[arg(long, env = "STREAM_GUARD_DISPLAY_WINDOW")]
    display_window: Option<usize>,

    /// Milliseconds between samples
    #[arg(long, env = "STREAM_GUARD_INTERVAL_MS")]
    interval_ms: Option<u64>,

    /// Stop and export after this many samples
    #[arg(long, env = "STREAM_GUARD_MAX_SAMPLES")]
    max_samples: Option<u64>,

    /// Seed for the synthetic signal
    #[arg(long, env = "STREAM_GUARD_SEED")]
    seed: Option<u64>,

    /// Destination of the anomaly CSV
    #[arg(long, short, env = "STREAM_GUARD_OUTPUT")]
    output: Option<PathBuf>,

    /// Feed NaN and infinite samples to the detector instead of rejecting them
    #[arg(long, env = "STREAM_GUARD_ALLOW_NON_FINITE")]
    allow_non_finite: bool,

    /// Emit logs as JSON
    #[arg(long, env = "STREAM_GUARD_JSON_LOGS")]
    json_logs: bool,

    /// Log every sample at debug level
    #[arg(long, short)]
    verbose: bool,

    /// Do not render samples
    #[arg(long, short)]
    quiet: bool,
}

impl Args {
    /// JSON logs without `--verbose` use the production preset.
    fn logging_config(&self) -> LoggingConfig {
        match (self.verbose, self.json_logs) {
            (true, json) => LoggingConfig::development().with_json_format(json),
            (false, true) => LoggingConfig::production(),
            (false, false) => LoggingConfig::default(),
        }
    }

    /// Defaults, then the config file, then flags.
    fn stream_config(&self) -> stream_guard::Result<StreamConfig> {
        let mut config = match &self.config {
            Some(path) => StreamConfig::from_json_file(path)?,
            None => StreamConfig::default(),
        };

        if let Some(window_size) = self.window_size {
            config.detector.window_size = window_size;
        }
        if let Some(threshold) = self.threshold {
            config.detector.z_score_threshold = threshold;
        }
        if self.allow_non_finite {
            config.detector.non_finite = NonFinitePolicy::PassThrough;
        }
        if let Some(display_window) = self.display_window {
            config.display_window = display_window;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.tick_interval_ms = interval_ms;
        }
        if let Some(output) = &self.output {
            config.export_path = output.clone();
        }
        config.seed = self.seed.or(config.seed);
        config.max_samples = self.max_samples.or(config.max_samples);

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(args.logging_config()) {
        eprintln!("{e}");
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "stream-guard failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> stream_guard::Result<()> {
    let config = args.stream_config()?;
    let log_config = if args.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };

    let sink: Box<dyn DetectionSink> = if args.quiet {
        Box::new(NullSink)
    } else {
        Box::new(TerminalSink::new(io::stdout(), config.display_window))
    };
    let source = SyntheticSource::new(SyntheticParams::default(), config.seed)?;
    let mut runner =
        StreamRunner::new(config.detector.clone(), sink)?.with_log_config(log_config);

    let (commands, receiver) = watch::channel(StreamCommand::Run);
    let export_path = config.export_path.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping");
            let _ = commands.send(StreamCommand::StopAndExport(export_path));
        }
    });

    let mut summary = runner
        .run(source, config.tick_interval(), receiver, config.max_samples)
        .await?;
    interrupt.abort();

    if summary.export.is_none() {
        summary.export = Some(runner.export(&config.export_path)?);
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::try_parse_from([
            "stream-guard",
            "--window-size",
            "20",
            "--threshold",
            "2.5",
            "--allow-non-finite",
            "--output",
            "out.csv",
        ])
        .unwrap();
        let config = args.stream_config().unwrap();

        assert_eq!(config.detector.window_size, 20);
        assert_eq!(config.detector.z_score_threshold, 2.5);
        assert_eq!(config.detector.non_finite, NonFinitePolicy::PassThrough);
        assert_eq!(config.export_path, PathBuf::from("out.csv"));
        assert_eq!(config.display_window, 100);
    }

    #[test]
    fn test_invalid_flags_rejected() {
        let args = Args::try_parse_from(["stream-guard", "--window-size", "0"]).unwrap();
        assert!(args.stream_config().is_err());

        let args = Args::try_parse_from(["stream-guard", "--interval-ms", "0"]).unwrap();
        assert!(matches!(
            args.stream_config(),
            Err(GuardError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_logging_presets_follow_flags() {
        let args = Args::try_parse_from(["stream-guard", "--json-logs"]).unwrap();
        let logging = args.logging_config();
        assert!(logging.json_format);
        assert_eq!(logging.env_filter(), "warn,stream_guard=info");

        let args = Args::try_parse_from(["stream-guard", "--verbose"]).unwrap();
        let logging = args.logging_config();
        assert!(!logging.json_format);
        assert_eq!(logging.env_filter(), "debug,stream_guard=debug");
    }
}
