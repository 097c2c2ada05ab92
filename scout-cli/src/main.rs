//! Scout CLI
//!
//! Runs GUI scenarios against the simulated IDE and inspects object maps.
//!
//! Usage from workspace root:
//!   cargo run --bin scout -- run git-clone            # All three clone endings
//!   cargo run --bin scout -- run git-clone --json     # Machine-readable verdicts
//!   cargo run --bin scout -- run new-project --kind quick --build-system CMake
//!   cargo run --bin scout -- names --map my.map       # Validate an object map

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use scout::platforms::simulated::SimulatedEngine;
use scout::scenarios::{CloneEnding, GitCloneScenario, NewProjectScenario, ProjectKind};
use scout::simulation::{IdeOptions, SimulatedIde};
use scout::{names, run_scenario, ObjectMap, Scenario, Session, SessionConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

mod report;

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "Scripted GUI scenarios for a desktop IDE")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[clap(rename_all = "kebab-case")]
enum ScenarioName {
    GitClone,
    NewProject,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[clap(rename_all = "kebab-case")]
enum EndingArg {
    CancelImmediately,
    CancelButton,
    FinishButton,
}

impl From<EndingArg> for CloneEnding {
    fn from(arg: EndingArg) -> Self {
        match arg {
            EndingArg::CancelImmediately => CloneEnding::CancelImmediately,
            EndingArg::CancelButton => CloneEnding::CancelButton,
            EndingArg::FinishButton => CloneEnding::FinishButton,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
#[clap(rename_all = "lower")]
enum KindArg {
    #[default]
    Widgets,
    Quick,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Scenario to run
    #[clap(value_enum)]
    scenario: ScenarioName,

    /// Session config file (JSON); missing fields keep their defaults
    #[clap(long, short = 'c')]
    config: Option<PathBuf>,

    /// Extra object map merged over the built-in names
    #[clap(long, env = "SCOUT_OBJECT_MAP")]
    map: Option<PathBuf>,

    /// How long object lookups wait, in milliseconds (overrides SCOUT_OBJECT_TIMEOUT_MS)
    #[clap(long)]
    object_timeout_ms: Option<u64>,

    /// Default timeout of condition waits, in milliseconds (overrides SCOUT_WAIT_TIMEOUT_MS)
    #[clap(long)]
    wait_timeout_ms: Option<u64>,

    #[clap(long)]
    poll_interval_ms: Option<u64>,

    #[clap(long)]
    startup_grace_ms: Option<u64>,

    /// Clone endings to run (default: all of them)
    #[clap(long = "ending", value_enum)]
    endings: Vec<EndingArg>,

    /// Repository to clone
    #[clap(long)]
    url: Option<String>,

    /// Directory name the clone is checked out to
    #[clap(long)]
    clone_dir: Option<String>,

    /// Application template for new-project
    #[clap(long, value_enum, default_value_t = KindArg::Widgets)]
    kind: KindArg,

    /// Build system picked in the project wizard
    #[clap(long, default_value = "qmake")]
    build_system: String,

    /// Delay between the simulated IDE's progress steps, in milliseconds
    #[clap(long, default_value_t = 50)]
    step_delay_ms: u64,

    /// Make the simulated clone fail with this message
    #[clap(long)]
    clone_failure: Option<String>,

    /// Make the simulated IDE refuse to open cloned projects
    #[clap(long)]
    unopenable: bool,

    /// Show a plugin error with this text at startup
    #[clap(long)]
    plugin_error: Option<String>,

    /// Print the verdicts as JSON
    #[clap(long)]
    json: bool,

    /// Verbose output
    #[clap(long, short)]
    verbose: bool,
}

#[derive(Parser, Debug)]
struct NamesArgs {
    /// Object map file merged over the built-in names
    #[clap(long, env = "SCOUT_OBJECT_MAP")]
    map: Option<PathBuf>,

    /// Print the resolved selectors as JSON
    #[clap(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario against the simulated IDE
    Run(RunArgs),
    /// List and validate symbolic object names
    Names(NamesArgs),
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    let default = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[tokio::main]
async fn main() {
    // a missing .env is fine
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Names(args) => {
            init_logging(false);
            names_command(args)
        }
    };
    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("❌ {e:#}");
            std::process::exit(2);
        }
    }
}

fn load_config(args: &RunArgs) -> Result<SessionConfig> {
    // precedence: defaults, config file, SCOUT_* environment, flags
    let mut config = match &args.config {
        Some(path) => {
            let mut config = SessionConfig::from_file(path)
                .with_context(|| format!("loading session config {}", path.display()))?;
            config
                .apply_env(|key| std::env::var(key).ok())
                .context("reading SCOUT_* environment")?;
            config
        }
        None => SessionConfig::from_env().context("reading SCOUT_* environment")?,
    };
    if let Some(ms) = args.object_timeout_ms {
        config.object_timeout_ms = ms;
    }
    if let Some(ms) = args.wait_timeout_ms {
        config.wait_timeout_ms = ms;
    }
    if let Some(ms) = args.poll_interval_ms {
        config.poll_interval_ms = ms;
    }
    if let Some(ms) = args.startup_grace_ms {
        config.startup_grace_ms = ms;
    }
    config.validate().context("invalid session config")?;
    Ok(config)
}

fn load_map(path: Option<&PathBuf>) -> Result<ObjectMap> {
    let mut map = names::builtin();
    if let Some(path) = path {
        let extra = ObjectMap::load(path)
            .with_context(|| format!("loading object map {}", path.display()))?;
        debug!(entries = extra.len(), "merging object map");
        map.merge(extra);
    }
    Ok(map)
}

/// Runs one scenario. Ok(false) when a Fail or Fatal verdict was recorded.
async fn run(args: RunArgs) -> Result<bool> {
    init_logging(args.verbose);
    let config = load_config(&args)?;
    let map = load_map(args.map.as_ref())?;
    info!(scenario = ?args.scenario, ?config, "starting scout run");

    let ide = SimulatedIde::new(IdeOptions {
        step_delay: Duration::from_millis(args.step_delay_ms),
        clone_failure: args.clone_failure.clone(),
        project_openable: !args.unopenable,
        plugin_error: args.plugin_error.clone(),
        ..IdeOptions::default()
    });
    let engine = SimulatedEngine::with_poll_interval(ide, config.poll_interval());
    let session = Session::new(engine, config)
        .context("creating session")?
        .with_object_map(map);

    let (summary, traces) = match args.scenario {
        ScenarioName::GitClone => {
            let mut scenario = GitCloneScenario::new();
            if let Some(url) = &args.url {
                scenario = scenario.with_url(url.clone());
            }
            if let Some(dir) = &args.clone_dir {
                scenario = scenario.with_clone_dir(dir.clone());
            }
            if !args.endings.is_empty() {
                let endings: Vec<CloneEnding> = args.endings.iter().map(|e| (*e).into()).collect();
                scenario = scenario.with_endings(&endings);
            }
            let summary = run_scenario(&scenario, &session).await;
            let traces = serde_json::to_value(scenario.traces())?;
            (summary, Some(traces))
        }
        ScenarioName::NewProject => {
            let kind = match args.kind {
                KindArg::Widgets => ProjectKind::QtWidgets,
                KindArg::Quick => ProjectKind::QtQuick,
            };
            let scenario = NewProjectScenario::new(kind).with_build_system(args.build_system.clone());
            debug!(name = scenario.name(), "scenario configured");
            (run_scenario(&scenario, &session).await, None)
        }
    };

    let records = session.outcomes().records();
    if args.json {
        let output = serde_json::json!({
            "summary": summary,
            "records": records,
            "traces": traces,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        report::display(&records, &summary);
    }
    Ok(summary.succeeded())
}

fn names_command(args: NamesArgs) -> Result<bool> {
    let map = load_map(args.map.as_ref())?;
    let failures = map.validate();

    if args.json {
        let entries: Vec<serde_json::Value> = map
            .symbolic_names()
            .map(|name| {
                let selector = map.resolve(name).ok().map(|s| s.to_string());
                serde_json::json!({
                    "name": name,
                    "real_name": map.real_name(name),
                    "selector": selector,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        report::display_names(&map, &failures);
    }
    Ok(failures.is_empty())
}
