use clap::{Parser, Subcommand};
use pixbudget::config::{self, PipelineConfig};
use pixbudget::imaging::{ProcessingOptions, Quality};
use pixbudget::pool::ProcessingPool;
use pixbudget::{inspect, output, persist};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Limit overrides shared by commands that apply the processing policy.
#[derive(clap::Args, Clone, Default)]
struct LimitArgs {
    /// Bounding box width in pixels
    #[arg(long)]
    max_width: Option<u32>,
    /// Bounding box height in pixels
    #[arg(long)]
    max_height: Option<u32>,
    /// Byte budget for the written file
    #[arg(long = "max-size", value_name = "BYTES")]
    max_size_bytes: Option<u64>,
    /// Starting quality (1-100)
    #[arg(long)]
    quality: Option<u32>,
}

impl LimitArgs {
    fn apply(&self, limits: &mut ProcessingOptions) {
        if let Some(w) = self.max_width {
            limits.max_width = w;
        }
        if let Some(h) = self.max_height {
            limits.max_height = h;
        }
        if let Some(b) = self.max_size_bytes {
            limits.max_size_bytes = b;
        }
        if let Some(q) = self.quality {
            // Unclamped so validate() reports an out-of-range flag
            limits.initial_quality = Quality(q);
        }
    }
}

#[derive(Parser)]
#[command(name = "pixbudget")]
#[command(about = "Normalize uploaded images to a pixel box and a byte budget")]
#[command(long_about = "\
Normalize uploaded images to a pixel box and a byte budget

Each image is decoded, scaled down to fit the box (never up), and re-encoded
in its own format at decreasing quality until it fits the byte budget. If
it still does not fit, it is re-encoded once as lossy WebP; when that is
no larger, it is written instead and the extension of the destination
changes accordingly. The printed output path is the one actually written.

Format handling:
  JPEG             re-encoded as JPEG
  PNG              re-encoded as PNG (palette-quantized when smaller)
  WebP             re-encoded as WebP
  GIF, BMP, TIFF   re-encoded as JPEG (.jpg)

Settings are read from pixbudget.toml in the working directory if present.
Command-line flags override the file. Run 'pixbudget gen-config' to
generate a documented pixbudget.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./pixbudget.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resize and compress one image into DEST
    Process {
        /// Image to read
        input: PathBuf,
        /// Requested destination (the extension may change)
        dest: PathBuf,
        #[command(flatten)]
        limits: LimitArgs,
        /// Cancel after this many seconds; a cancelled image is never written
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// On failure, store the untouched input at DEST instead
        #[arg(long)]
        keep_original_on_error: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print dimensions, format, and size of a stored image
    Inspect {
        path: PathBuf,
        /// Print as JSON (null when unreadable)
        #[arg(long)]
        json: bool,
    },
    /// Report whether a stored image exceeds the active limits
    Check {
        path: PathBuf,
        #[command(flatten)]
        limits: LimitArgs,
    },
    /// Print a stock pixbudget.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_telemetry(&cli);

    match &cli.command {
        Command::Process {
            input,
            dest,
            limits,
            timeout_secs,
            keep_original_on_error,
            json,
        } => {
            let mut config = load_config(&cli)?;
            limits.apply(&mut config.limits);
            if let Some(secs) = timeout_secs {
                config.processing.timeout_secs = Some(*secs);
            }
            config.validate()?;

            let bytes = std::fs::read(input)?;
            let pool = ProcessingPool::new(&config.processing)?;
            let pending = pool.submit(bytes.clone(), dest.clone(), config.limits);

            // On timeout the job is cancelled and has stopped before this
            // returns, so it cannot race the original written below
            match pending.wait_or_cancel(config.processing.timeout()) {
                Ok(result) => {
                    if *json {
                        println!("{}", serde_json::to_string_pretty(&result)?);
                    } else {
                        output::print_process_result(input, &result, &config.limits);
                    }
                }
                Err(e) if *keep_original_on_error => {
                    tracing::warn!(dest = %dest.display(), error = %e, "storing original bytes");
                    persist::write_atomic(dest, &bytes)?;
                    if *json {
                        let report = serde_json::json!({
                            "success": false,
                            "error": e.to_string(),
                            "kept_original": true,
                            "output_path": dest,
                            "final_size_bytes": bytes.len(),
                        });
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    } else {
                        for line in output::format_kept_original(dest, &e.to_string()) {
                            println!("{}", line);
                        }
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Inspect { path, json } => {
            let info = inspect::inspect(path);
            if *json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                output::print_inspect(path, info.as_ref());
            }
        }
        Command::Check { path, limits } => {
            let mut config = load_config(&cli)?;
            limits.apply(&mut config.limits);
            config.validate()?;
            let info = inspect::inspect(path);
            output::print_check(path, info.as_ref(), &config.limits);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Explicit `--config`, else `./pixbudget.toml`, else stock defaults.
fn load_config(cli: &Cli) -> Result<PipelineConfig, config::ConfigError> {
    config::load_config_or_default(cli.config.as_deref(), Path::new("."))
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
