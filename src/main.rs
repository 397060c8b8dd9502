//! llmbench - benchmark OpenAI-compatible streaming endpoints
//!
//! USAGE:
//!   llmbench run --model <id> [--suite all]        # one model, print report
//!   llmbench compare <id> <id>... [--parallel]     # head-to-head ranking
//!   llmbench report <results.json>                 # re-render a saved file
//!   llmbench suites                                # list prompt suites
//!   llmbench config set <key> <value>              # non-interactive config

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use llmbench::config::{self, Config};
use llmbench::runner::{run_models, BenchmarkResult, BenchmarkRunner};
use llmbench::store::{self, SavedReport};
use llmbench::{prompts, report, BenchError, OpenAiClient, PromptSuite};

// ═══════════════════════════════════════════════════════════════
// CLI
// ═══════════════════════════════════════════════════════════════

#[derive(Parser, Debug)]
#[command(name = "llmbench")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// More logging on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct EndpointArgs {
    /// API base URL (defaults to OPENAI_BASE_URL, config, then OpenAI)
    #[arg(short = 'u', long)]
    base_url: Option<String>,

    /// API key (defaults to OPENAI_API_KEY, then config)
    #[arg(short = 'k', long)]
    api_key: Option<String>,

    /// Sampling temperature
    #[arg(short, long)]
    temperature: Option<f32>,

    /// Save results to a JSON file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a benchmark suite against a model
    Run {
        /// Model name (e.g. gpt-4o)
        #[arg(short, long)]
        model: String,

        /// Prompt suite to run [default: all]
        #[arg(short, long)]
        suite: Option<String>,

        #[command(flatten)]
        endpoint: EndpointArgs,
    },

    /// Compare two or more models side-by-side
    Compare {
        /// Model names
        #[arg(required = true)]
        models: Vec<String>,

        /// Prompt suite to run [default: reasoning]
        #[arg(short, long)]
        suite: Option<String>,

        /// Benchmark all models at once; each model's own prompts stay sequential
        #[arg(long)]
        parallel: bool,

        #[command(flatten)]
        endpoint: EndpointArgs,
    },

    /// Display a report from a saved results JSON file
    Report {
        results_file: PathBuf,
    },

    /// List built-in prompt suites
    Suites,

    /// Edit ~/.config/llmbench/config.json
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Set key, base-url, temperature or suite
    Set { key: String, value: String },
}

// ═══════════════════════════════════════════════════════════════
// MAIN
// ═══════════════════════════════════════════════════════════════

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = match cli.command {
        Commands::Run {
            model,
            suite,
            endpoint,
        } => run_single(&model, suite, &endpoint).await,
        Commands::Compare {
            models,
            suite,
            parallel,
            endpoint,
        } => run_compare(&models, suite, parallel, &endpoint).await,
        Commands::Report { results_file } => run_report(&results_file),
        Commands::Suites => {
            run_suites();
            Ok(())
        }
        Commands::Config {
            action: ConfigAction::Set { key, value },
        } => run_config_set(&key, &value),
    };

    if let Err(e) = &outcome {
        match e.downcast_ref::<BenchError>() {
            Some(b) if b.is_authentication() => {
                eprintln!("\n❌ {}", b);
                std::process::exit(1);
            }
            Some(b @ BenchError::UnknownSuite { .. }) => {
                eprintln!("{}", b);
                std::process::exit(2);
            }
            _ => {}
        }
    }
    outcome
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ═══════════════════════════════════════════════════════════════
// COMMANDS
// ═══════════════════════════════════════════════════════════════

fn resolve_suite(flag: Option<String>, cfg: &Config, fallback: &str) -> Result<&'static PromptSuite> {
    let name = flag
        .or_else(|| cfg.default_suite.clone())
        .unwrap_or_else(|| fallback.to_string());
    Ok(prompts::get_suite(&name)?)
}

fn progress_style() -> Result<ProgressStyle> {
    Ok(
        ProgressStyle::with_template("{spinner:.cyan} {msg:24} [{bar:30.cyan/blue}] {pos}/{len}")?
            .progress_chars("=> "),
    )
}

async fn run_single(model: &str, suite: Option<String>, args: &EndpointArgs) -> Result<()> {
    let cfg = Config::load()?;
    let suite = resolve_suite(suite, &cfg, "all")?;
    let temperature = args.temperature.or(cfg.temperature).unwrap_or(0.0);
    let backend = OpenAiClient::new(cfg.endpoint(args.base_url.as_deref(), args.api_key.as_deref()))?;

    println!(
        "\nBenchmarking {} with {} suite ({} prompts)\n",
        model,
        suite.name,
        suite.len()
    );

    let bar = ProgressBar::new(suite.len() as u64);
    bar.set_style(progress_style()?);
    bar.set_message("Running benchmarks...");
    let sink = |done: usize, total: usize, _r: &BenchmarkResult| {
        bar.set_position(done as u64);
        bar.set_message(format!("Prompt {}/{}", done, total));
    };

    let run = BenchmarkRunner::new(&backend, model)
        .with_temperature(temperature)
        .run(suite, Some(&sink))
        .await;
    bar.finish_and_clear();
    let run = run?;

    print!("{}", report::render_run_report(&run)?);

    if let Some(path) = &args.output {
        store::save_run(&run, path)?;
        println!("\nResults saved to {}", path.display());
    }
    Ok(())
}

async fn run_compare(
    models: &[String],
    suite: Option<String>,
    parallel: bool,
    args: &EndpointArgs,
) -> Result<()> {
    if models.len() < 2 {
        eprintln!("Provide at least 2 model names to compare.");
        std::process::exit(1);
    }

    let cfg = Config::load()?;
    let suite = resolve_suite(suite, &cfg, "reasoning")?;
    let temperature = args.temperature.or(cfg.temperature).unwrap_or(0.0);
    let backend = OpenAiClient::new(cfg.endpoint(args.base_url.as_deref(), args.api_key.as_deref()))?;

    println!(
        "\nComparing {} on {} suite ({} prompts each)\n",
        models.join(" vs "),
        suite.name,
        suite.len()
    );

    let multi = MultiProgress::new();
    let style = progress_style()?;
    let bars: HashMap<&str, ProgressBar> = models
        .iter()
        .map(|m| {
            let bar = multi.add(ProgressBar::new(suite.len() as u64));
            bar.set_style(style.clone());
            bar.set_message(m.clone());
            (m.as_str(), bar)
        })
        .collect();
    // Keyed by model so interleaved calls from parallel runs land on the right bar
    let sink = |done: usize, _total: usize, r: &BenchmarkResult| {
        if let Some(bar) = bars.get(r.model.as_str()) {
            bar.set_position(done as u64);
        }
    };

    let runs = run_models(&backend, models, suite, temperature, parallel, Some(&sink)).await;
    for bar in bars.values() {
        bar.finish_and_clear();
    }
    let runs = runs?;

    print!("{}", report::render_comparison_report(&runs)?);

    if let Some(path) = &args.output {
        store::save_comparison(&runs, path)?;
        println!("\nResults saved to {}", path.display());
    }
    Ok(())
}

fn run_report(path: &std::path::Path) -> Result<()> {
    let text = match store::load_report(path)? {
        SavedReport::Single(run) => report::render_run_report(&run)?,
        SavedReport::Comparison(runs) if runs.len() == 1 => report::render_run_report(&runs[0])?,
        SavedReport::Comparison(runs) => report::render_comparison_report(&runs)?,
    };
    print!("{}", text);
    Ok(())
}

fn run_suites() {
    for suite in prompts::suites() {
        println!("  {:10} {:2} prompts  {}", suite.name, suite.len(), suite.description);
    }
}

fn run_config_set(key: &str, value: &str) -> Result<()> {
    let mut cfg = Config::load()?;
    cfg.set(key, value)?;
    cfg.save()?;
    println!("Saved {} to {}", key, config::config_path()?.display());
    Ok(())
}
