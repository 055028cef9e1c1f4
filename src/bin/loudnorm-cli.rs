use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use loudnorm::command::loudnorm_filter;
use loudnorm::{
    AnalysisRequest, AudioCodec, AudioEncoding, Completion, EngineLogLevel, Failure,
    LoudnessMeasurement, LoudnessTargets, NormalizationRequest, NormalizeError, ProgressEvent,
    RunOptions, RunRequest, Scheduler, SchedulerOptions, TaskHandle,
};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  loudnorm analyze input.mp4 --duration 120 --json\n  loudnorm normalize input.mp4 output.mp4 --i -16 --tp -1 --lra 7 --progress\n  loudnorm normalize input.mp4 output.mp4 --measured-i -23 --measured-tp -5 --measured-lra 4 --measured-thresh -33 --offset 9\n  loudnorm completions zsh > _loudnorm";

/// Longest analysis duration cap accepted, in seconds.
const MAX_DURATION_CAP: i64 = 3600;

/// Diagnostic lines shown after a failure when not running `--verbose`.
const FAILURE_CONTEXT_LINES: usize = 12;

#[derive(Debug, Parser)]
#[command(
    name = "loudnorm",
    version,
    about = "Two-pass audio loudness normalization for video files (video is stream-copied)",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Path to the ffmpeg binary.
    #[arg(long, global = true, env = "LOUDNORM_FFMPEG")]
    ffmpeg: Option<PathBuf>,

    /// Echo every ffmpeg diagnostic line to stderr.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a spinner with the latest ffmpeg status line.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting an existing output file.
    #[arg(long, global = true)]
    overwrite: bool,

    /// ffmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Measure loudness (first pass).
    #[command(
        about = "Measure integrated loudness, true peak and loudness range",
        visible_alias = "measure",
        after_help = "Examples:\n  loudnorm analyze input.mp4\n  loudnorm analyze input.mp4 --duration 60 --json"
    )]
    Analyze {
        /// Input media path.
        input: String,

        /// Analyze only the first N seconds (0 = whole file).
        #[arg(long, default_value_t = 0)]
        duration: i64,

        /// Output the measurement as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Normalize audio loudness (second pass), copying video untouched.
    #[command(
        about = "Re-encode audio to the loudness targets; video is stream-copied",
        after_help = "Without --measured-* values the analysis pass runs first.\n\nExamples:\n  loudnorm normalize input.mp4 output.mp4\n  loudnorm normalize input.mp4 output.mp4 --codec flac --sample-rate 48000 --qsv"
    )]
    Normalize {
        /// Input media path.
        input: String,
        /// Output media path.
        output: String,

        /// Integrated loudness target in LUFS.
        #[arg(long = "i", default_value_t = -14.0, allow_negative_numbers = true)]
        integrated: f64,
        /// Maximum true peak in dBTP.
        #[arg(long = "tp", default_value_t = -1.5, allow_negative_numbers = true)]
        true_peak: f64,
        /// Loudness range target in LU.
        #[arg(long = "lra", default_value_t = 11.0, allow_negative_numbers = true)]
        loudness_range: f64,

        /// Measured integrated loudness from a previous analysis.
        #[arg(long, allow_negative_numbers = true)]
        measured_i: Option<f64>,
        /// Measured true peak from a previous analysis.
        #[arg(long, allow_negative_numbers = true)]
        measured_tp: Option<f64>,
        /// Measured loudness range from a previous analysis.
        #[arg(long, allow_negative_numbers = true)]
        measured_lra: Option<f64>,
        /// Measured threshold from a previous analysis.
        #[arg(long, allow_negative_numbers = true)]
        measured_thresh: Option<f64>,
        /// Target offset from a previous analysis.
        #[arg(long, allow_negative_numbers = true)]
        offset: Option<f64>,

        /// Audio bitrate passed to ffmpeg, e.g. 192K.
        #[arg(long, default_value = "192K")]
        bitrate: String,
        /// Audio codec: aac | mp3 | flac.
        #[arg(long, default_value = "aac")]
        codec: String,
        /// Output sample rate in Hz.
        #[arg(long, default_value_t = 44_100)]
        sample_rate: u32,
        /// Decode with Intel Quick Sync Video.
        #[arg(long)]
        qsv: bool,

        /// When analyzing first, analyze only the first N seconds (0 = whole file).
        #[arg(long, default_value_t = 0)]
        duration: i64,

        /// Print a JSON summary instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_duration_cap(seconds: i64) -> Result<i64, String> {
    if (0..=MAX_DURATION_CAP).contains(&seconds) {
        Ok(seconds)
    } else {
        Err(format!("--duration must be between 0 and {MAX_DURATION_CAP} seconds"))
    }
}

/// All five measured values, or none of them.
fn measurement_from_args(
    measured_i: Option<f64>,
    measured_tp: Option<f64>,
    measured_lra: Option<f64>,
    measured_thresh: Option<f64>,
    offset: Option<f64>,
) -> Result<Option<LoudnessMeasurement>, Box<dyn std::error::Error>> {
    match (measured_i, measured_tp, measured_lra, measured_thresh, offset) {
        (None, None, None, None, None) => Ok(None),
        (Some(i), Some(tp), Some(lra), Some(thresh), Some(offset)) => {
            Ok(Some(LoudnessMeasurement::new(i, tp, lra, thresh, offset)?))
        }
        _ => Err(
            "provide all of --measured-i, --measured-tp, --measured-lra, --measured-thresh and --offset, or none"
                .into(),
        ),
    }
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn parse_log_level(global: &GlobalOptions) -> Result<Option<EngineLogLevel>, String> {
    global
        .log_level
        .as_deref()
        .map(|level| {
            level
                .parse::<EngineLogLevel>()
                .map_err(|_| format!("unsupported --log-level: {level}"))
        })
        .transpose()
}

fn run_options(global: &GlobalOptions, log_level: Option<EngineLogLevel>) -> RunOptions {
    let mut options = RunOptions::new().with_overwrite(global.overwrite);

    if let Some(path) = &global.ffmpeg {
        options = options.with_engine(path);
    }
    if let Some(level) = log_level {
        options = options.with_engine_log_level(level);
    }

    options
}

/// Whether the command runs the analysis pass.
fn runs_analysis(command: &Commands) -> bool {
    match command {
        Commands::Analyze { .. } => true,
        Commands::Normalize { measured_i, .. } => measured_i.is_none(),
        Commands::Completions { .. } => false,
    }
}

fn measurement_json(measurement: &LoudnessMeasurement) -> serde_json::Value {
    json!({
        "input_i": measurement.measured_i,
        "input_tp": measurement.measured_tp,
        "input_lra": measurement.measured_lra,
        "input_thresh": measurement.measured_thresh,
        "target_offset": measurement.target_offset,
    })
}

fn spinner(enabled: bool, label: &str) -> Result<Option<ProgressBar>, Box<dyn std::error::Error>> {
    if !enabled {
        return Ok(None);
    }
    let bar = ProgressBar::new_spinner();
    let template = "{spinner:.green} [{elapsed}] {prefix:.bold} {wide_msg}";
    bar.set_style(ProgressStyle::with_template(template)?);
    bar.set_prefix(label.to_string());
    bar.enable_steady_tick(std::time::Duration::from_millis(120));
    Ok(Some(bar))
}

/// Relay a task's events to the terminal until it finishes. When `interrupt`
/// resolves the task is cancelled (killing ffmpeg) instead of abandoned.
async fn follow(
    mut task: TaskHandle,
    global: &GlobalOptions,
    interrupt: impl Future<Output = std::io::Result<()>>,
) -> Result<Result<Completion, Failure>, Box<dyn std::error::Error>> {
    let bar = spinner(global.progress, &task.operation().to_string())?;
    let mut interrupted = false;
    tokio::pin!(interrupt);

    let result = loop {
        tokio::select! {
            event = task.next_event() => match event {
                Some(ProgressEvent::Line(line)) => {
                    if global.verbose {
                        match &bar {
                            Some(bar) => bar.println(line.dimmed().to_string()),
                            None => eprintln!("{}", line.dimmed()),
                        }
                    }
                    if let Some(bar) = &bar {
                        bar.set_message(line);
                    }
                }
                Some(ProgressEvent::Degraded { line, error }) => {
                    if global.verbose {
                        eprintln!("{} {} ({error})", "warning:".yellow().bold(), line);
                    }
                }
                Some(ProgressEvent::Finished(result)) => break result,
                None => break Err(Failure::new(NormalizeError::Cancelled)),
            },
            _ = &mut interrupt, if !interrupted => {
                interrupted = true;
                let notice = "interrupted, stopping ffmpeg".yellow();
                eprintln!("{} {notice}", "warning:".yellow().bold());
                task.cancel();
            }
        }
    };

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    Ok(result)
}

/// A failure that has already been printed by [`report_failure`].
#[derive(Debug, thiserror::Error)]
#[error("task failed")]
struct Reported;

fn report_failure(operation: &str, failure: &Failure, verbose: bool) {
    if !verbose && !failure.diagnostics.is_empty() {
        let lines: Vec<&str> = failure.diagnostics.lines().collect();
        let start = lines.len().saturating_sub(FAILURE_CONTEXT_LINES);
        for line in &lines[start..] {
            eprintln!("{}", line.dimmed());
        }
    }
    eprintln!(
        "{} {} failed: {} [{}]",
        "error:".red().bold(),
        operation,
        failure.reason,
        failure.reason.code()
    );
}

async fn run_task(
    scheduler: &Scheduler,
    request: RunRequest,
    global: &GlobalOptions,
) -> Result<Completion, Box<dyn std::error::Error>> {
    let operation = request.operation().to_string();
    let task = scheduler.submit(request);
    match follow(task, global, tokio::signal::ctrl_c()).await? {
        Ok(completion) => Ok(completion),
        Err(failure) => {
            report_failure(&operation, &failure, global.verbose);
            Err(Reported.into())
        }
    }
}

async fn analyze_input(
    scheduler: &Scheduler,
    input: &str,
    duration: i64,
    global: &GlobalOptions,
) -> Result<LoudnessMeasurement, Box<dyn std::error::Error>> {
    let max_duration = parse_duration_cap(duration)?;
    let request = AnalysisRequest::new(input).with_max_duration(max_duration);
    match run_task(scheduler, request.into(), global).await? {
        Completion::Analyzed(measurement) => Ok(measurement),
        Completion::Normalized => Err("analysis returned no measurement".into()),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let Cli { global, command } = Cli::parse();
    let log_level = parse_log_level(&global)?;
    let options = run_options(&global, log_level);

    if let Some(level) = log_level {
        if !level.shows_analysis_summary() && runs_analysis(&command) {
            return Err(format!(
                "--log-level {level} hides the loudnorm summary the analysis pass reads (use info or more verbose)"
            )
            .into());
        }
    }

    let scheduler = Scheduler::new(options, SchedulerOptions::with_max_concurrent(1));

    match command {
        Commands::Analyze {
            input,
            duration,
            json,
        } => {
            let measurement = analyze_input(&scheduler, &input, duration, &global).await?;
            if json {
                let payload = measurement_json(&measurement);
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                let LoudnessMeasurement {
                    measured_i,
                    measured_tp,
                    measured_lra,
                    measured_thresh,
                    target_offset,
                } = measurement;
                println!("Integrated loudness: {measured_i:.2} LUFS");
                println!("True peak:           {measured_tp:.2} dBTP");
                println!("Loudness range:      {measured_lra:.2} LU");
                println!("Threshold:           {measured_thresh:.2} LUFS");
                println!("Target offset:       {target_offset:.2} LU");
            }
        }
        Commands::Normalize {
            input,
            output,
            integrated,
            true_peak,
            loudness_range,
            measured_i,
            measured_tp,
            measured_lra,
            measured_thresh,
            offset,
            bitrate,
            codec,
            sample_rate,
            qsv,
            duration,
            json,
        } => {
            let targets = LoudnessTargets::new(integrated, true_peak, loudness_range)?;
            let codec = codec.parse::<AudioCodec>()?;
            let supplied = measurement_from_args(
                measured_i,
                measured_tp,
                measured_lra,
                measured_thresh,
                offset,
            )?;
            ensure_writable_path(Path::new(&output), global.overwrite)?;

            let measurement = match supplied {
                Some(measurement) => measurement,
                None => {
                    if !json {
                        eprintln!("{} analyzing {input}", "pass 1/2".cyan().bold());
                    }
                    analyze_input(&scheduler, &input, duration, &global).await?
                }
            };

            let request = NormalizationRequest::new(input.as_str(), output.as_str(), measurement)
                .with_targets(targets)
                .with_encoding(AudioEncoding::new(bitrate, codec, sample_rate))
                .with_hardware_acceleration(qsv);

            if !json && supplied.is_none() {
                eprintln!("{} normalizing {input}", "pass 2/2".cyan().bold());
            }
            let filter = loudnorm_filter(&request.targets, &request.measurement);
            run_task(&scheduler, request.into(), &global).await?;

            if json {
                let payload = json!({
                    "input": input,
                    "output": output,
                    "measurement": measurement_json(&measurement),
                    "filter": filter,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!("Normalized audio written to {output}").green()
                );
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            let mut stdout = std::io::stdout();
            clap_complete::generate(shell, &mut command, "loudnorm", &mut stdout);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        if !error.is::<Reported>() {
            eprintln!("error: {error}");
        }
        std::process::exit(1);
    }
}
