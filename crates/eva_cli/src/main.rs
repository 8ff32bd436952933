use anyhow::{Context, Result};
use clap::Parser;
use eva_core::{Astronaut, EvaConfig, EvaError, PhysiologyProfile};
use eva_mission::{mission, LogOptions, MissionReport, MissionRunner, TaskSequence};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long, default_value = "eva.toml")]
    config: PathBuf,

    /// Mission plan CSV with one task-letter column per EVA
    #[arg(short, long)]
    mission: Option<PathBuf>,

    /// Mission column to simulate (repeatable). Defaults to every "... Type" column
    #[arg(long = "column")]
    columns: Vec<String>,

    /// Inline task sequence, e.g. "LNNHTR"
    #[arg(short, long, conflicts_with = "mission")]
    sequence: Option<String>,

    /// Minutes simulated per task letter
    #[arg(short, long, env = "EVA_GRANULARITY")]
    granularity: Option<i64>,

    /// Directory for the per-EVA log files
    #[arg(short, long, env = "EVA_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Physiology profile TOML (built-in profile when omitted)
    #[arg(short, long, env = "EVA_PROFILE")]
    profile: Option<PathBuf>,

    /// Write variables as rows and records as columns
    #[arg(long)]
    transpose: bool,

    /// Print the final state of every EVA as JSON
    #[arg(long)]
    summary: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Print the active physiology profile as TOML and exit
    #[arg(long)]
    dump_profile: bool,

    /// Print the columns of the mission file and exit
    #[arg(long)]
    list_columns: bool,
}

/// One EVA to simulate: a log name and its task letters.
#[derive(Debug)]
struct EvaJob {
    name: String,
    sequence: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.json_logs);

    let mut config = EvaConfig::load_or_default(&args.config)?;
    apply_args(&mut config, &args);

    let profile = Arc::new(config.load_profile()?);

    if args.dump_profile {
        print!("{}", profile.to_toml_string()?);
        return Ok(());
    }
    if args.list_columns {
        let path = config
            .mission
            .path
            .as_ref()
            .ok_or_else(|| EvaError::missing("mission file"))?;
        for column in mission::list_columns(path)? {
            println!("{}", column);
        }
        return Ok(());
    }

    let jobs = collect_jobs(&config)?;
    let runner = MissionRunner::new(config.simulation.granularity_minutes)?;
    let options = LogOptions {
        precision: config.simulation.precision,
        transpose: config.simulation.transpose,
    };
    info!(
        "Simulating {} EVA(s) at {} min per task",
        jobs.len(),
        runner.granularity_minutes()
    );

    let handles: Vec<_> = jobs
        .into_iter()
        .map(|job| {
            let profile = Arc::clone(&profile);
            let body = config.astronaut;
            let output_dir = config.simulation.output_dir.clone();
            tokio::task::spawn_blocking(move || run_eva(job, profile, body, runner, options, &output_dir))
        })
        .collect();

    let mut reports = Vec::with_capacity(handles.len());
    for handle in handles {
        reports.push(handle.await.context("EVA task panicked")??);
    }

    if args.summary {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Command-line flags win over the config file and its env overrides.
fn apply_args(config: &mut EvaConfig, args: &Args) {
    if let Some(g) = args.granularity {
        config.simulation.granularity_minutes = g;
    }
    if let Some(dir) = &args.output_dir {
        config.simulation.output_dir = dir.clone();
    }
    if let Some(path) = &args.profile {
        config.profile = Some(path.clone());
    }
    if args.transpose {
        config.simulation.transpose = true;
    }
    if let Some(seq) = &args.sequence {
        config.mission.sequence = Some(seq.clone());
        config.mission.path = None;
    }
    if let Some(path) = &args.mission {
        config.mission.path = Some(path.clone());
    }
    if !args.columns.is_empty() {
        config.mission.columns = args.columns.clone();
    }
}

/// A mission file yields one job per selected column; otherwise the inline
/// sequence is the only job.
fn collect_jobs(config: &EvaConfig) -> Result<Vec<EvaJob>> {
    if let Some(path) = &config.mission.path {
        let columns = if config.mission.columns.is_empty() {
            mission::list_columns(path)?
                .into_iter()
                .filter(|c| c.ends_with("Type"))
                .collect()
        } else {
            config.mission.columns.clone()
        };
        if columns.is_empty() {
            return Err(EvaError::missing(format!("EVA columns in {}", path.display())).into());
        }
        return columns
            .into_iter()
            .map(|name| {
                let sequence = mission::load_column(path, &name)?;
                Ok(EvaJob { name, sequence })
            })
            .collect();
    }

    match &config.mission.sequence {
        Some(sequence) => Ok(vec![EvaJob {
            name: "sequence".to_string(),
            sequence: sequence.clone(),
        }]),
        None => Err(EvaError::missing("mission file or task sequence").into()),
    }
}

fn run_eva(
    job: EvaJob,
    profile: Arc<PhysiologyProfile>,
    body: eva_core::Anthropometrics,
    runner: MissionRunner,
    options: LogOptions,
    output_dir: &Path,
) -> Result<MissionReport> {
    let _span = tracing::info_span!("eva", name = %job.name).entered();
    let sequence = TaskSequence::parse(&job.sequence, &profile)
        .with_context(|| format!("Invalid task sequence for '{}'", job.name))?;

    let mut astronaut = Astronaut::with_anthropometrics(profile, body);
    let log = runner.run(&mut astronaut, &sequence)?;
    log.save(output_dir.join(log_file_name(&job.name)), options)?;

    Ok(MissionReport::new(job.name, &sequence, &astronaut))
}

/// `EVA-1 Type` -> `eva_log_eva_1_type.csv`
fn log_file_name(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    format!("eva_log_{}.csv", slug.trim_matches('_'))
}
