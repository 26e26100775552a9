use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use sunlog::{HistoryQuery, LogDocument, LogParser, get_history};

#[derive(Parser)]
#[command(name = "sunlog")]
#[command(about = "Structured solver log tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ParseOptions {
    /// Key suffix that marks a multi-line array value
    #[arg(long, default_value = sunlog::DEFAULT_ARRAY_INDICATOR)]
    array_indicator: String,

    /// Fail if a section is still open at the end of the log
    #[arg(long)]
    strict: bool,
}

impl ParseOptions {
    fn load(&self, path: &Path) -> anyhow::Result<LogDocument> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let parser = LogParser::new()
            .array_indicator(self.array_indicator.as_str())
            .require_closed(self.strict);
        let doc = parser
            .parse_document(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        log::info!("{}: {} top-level steps", path.display(), doc.steps.len());
        Ok(doc)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a solver log and emit the step tree as JSON
    Parse {
        /// Path to the log file
        #[arg(value_name = "FILE")]
        path: PathBuf,

        #[command(flatten)]
        options: ParseOptions,

        /// Single-line JSON output
        #[arg(long)]
        compact: bool,

        /// Also emit fields logged outside of any step
        #[arg(long)]
        globals: bool,
    },
    /// Print the values of one field across all steps
    History {
        /// Path to the log file
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Field to collect, e.g. `h`
        key: String,

        #[command(flatten)]
        options: ParseOptions,

        /// Keep steps whose status contains this text
        #[arg(long)]
        status: Option<String>,

        /// Keep steps of this time level only
        #[arg(long)]
        level: Option<i64>,

        #[arg(long, allow_negative_numbers = true)]
        t_min: Option<f64>,

        #[arg(long, allow_negative_numbers = true)]
        t_max: Option<f64>,

        #[arg(long)]
        step_min: Option<i64>,

        #[arg(long)]
        step_max: Option<i64>,

        /// Field holding the step number
        #[arg(long, default_value = "step")]
        step_key: String,

        /// Field holding the step time
        #[arg(long, default_value = "tn")]
        time_key: String,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Parse {
            path,
            options,
            compact,
            globals,
        } => {
            let doc = options.load(path)?;
            let json = match (*globals, *compact) {
                (true, true) => serde_json::to_string(&doc)?,
                (true, false) => serde_json::to_string_pretty(&doc)?,
                (false, true) => serde_json::to_string(&doc.steps)?,
                (false, false) => serde_json::to_string_pretty(&doc.steps)?,
            };
            println!("{json}");
        }
        Commands::History {
            path,
            key,
            options,
            status,
            level,
            t_min,
            t_max,
            step_min,
            step_max,
            step_key,
            time_key,
            json,
        } => {
            let doc = options.load(path)?;

            let mut query = HistoryQuery::new(key);
            query.step_key = step_key.as_str();
            query.time_key = time_key.as_str();
            query.status = status.as_deref();
            query.level = *level;
            if t_min.is_some() || t_max.is_some() {
                query.time_range = Some((
                    t_min.unwrap_or(f64::NEG_INFINITY),
                    t_max.unwrap_or(f64::INFINITY),
                ));
            }
            if step_min.is_some() || step_max.is_some() {
                query.step_range = Some((
                    step_min.unwrap_or(i64::MIN),
                    step_max.unwrap_or(i64::MAX),
                ));
            }

            let points = get_history(&doc.steps, &query);
            if *json {
                println!("{}", serde_json::to_string_pretty(&points)?);
            } else {
                println!("{:>8} {:>24} {:>5}  {}", "step", "time", "level", key);
                for point in &points {
                    let step = point.step.map_or_else(|| "-".to_string(), |s| s.to_string());
                    let time = point.time.map_or_else(|| "-".to_string(), |t| format!("{t:e}"));
                    println!("{:>8} {:>24} {:>5}  {}", step, time, point.level, point.value);
                }
            }
        }
    }
    Ok(())
}
