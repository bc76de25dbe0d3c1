#![forbid(unsafe_code)]

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hospital_allocation::config::{AlgorithmSelection, EngineConfig, GeneratorConfig};
use hospital_allocation::{generator, report, Instance, Session};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Assign patients to hospitals, beds and doctors and compare allocators",
    long_about = None
)]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Generate a random sample instance",
        after_help = "EXAMPLES:\n    hospital-allocation generate --patients 30 --seed 7 --out instance.json"
    )]
    Generate(GenerateArgs),

    #[command(
        about = "Run allocators on an instance and report metrics",
        after_help = "EXAMPLES:\n    hospital-allocation run --instance instance.json\n    hospital-allocation run --instance instance.json --algorithm branch-bound --max-nodes 100000 --json"
    )]
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// JSON generator config; flags override its fields.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    hospitals: Option<u32>,
    #[arg(long)]
    patients: Option<u32>,
    #[arg(long)]
    doctors_per_hospital: Option<u32>,
    #[arg(long)]
    capacity: Option<u32>,
    /// Share of critical patients, in percent.
    #[arg(long)]
    critical: Option<u32>,
    #[arg(long)]
    urgent: Option<u32>,
    #[arg(long)]
    stable: Option<u32>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[arg(long)]
    instance: PathBuf,
    /// JSON engine config; flags override its fields.
    #[arg(long)]
    config: Option<PathBuf>,
    /// all, greedy, knapsack or branch-bound.
    #[arg(long)]
    algorithm: Option<AlgorithmSelection>,
    /// Branch-and-bound node budget (0 = unbounded).
    #[arg(long)]
    max_nodes: Option<u64>,
    /// Milliseconds to pause between runs.
    #[arg(long)]
    pacing_ms: Option<u64>,
    /// Write the instance as left by the last run.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Print metrics as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("HOSPITAL_ALLOC_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "hospital_allocation=debug,info"
        } else {
            "hospital_allocation=info,warn"
        })
    });

    let format = env::var("HOSPITAL_ALLOC_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn generate(args: GenerateArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path)
            .with_context(|| format!("loading generator config {}", path.display()))?,
        None => GeneratorConfig::default(),
    };
    if let Some(n) = args.hospitals {
        config.hospital_count = n;
    }
    if let Some(n) = args.patients {
        config.patient_count = n;
    }
    if let Some(n) = args.doctors_per_hospital {
        config.doctors_per_hospital = n;
    }
    if let Some(n) = args.capacity {
        config.hospital_capacity = n;
    }
    if let Some(p) = args.critical {
        config.urgency_mix.critical = p;
    }
    if let Some(p) = args.urgent {
        config.urgency_mix.urgent = p;
    }
    if let Some(p) = args.stable {
        config.urgency_mix.stable = p;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let instance = generator::generate(&config).context("generating instance")?;
    instance
        .save(&args.out)
        .with_context(|| format!("writing instance to {}", args.out.display()))?;
    info!(
        path = %args.out.display(),
        hospitals = instance.hospitals.len(),
        patients = instance.patients.len(),
        doctors = instance.doctors.len(),
        "instance written"
    );
    Ok(())
}

fn run(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading engine config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(selection) = args.algorithm {
        config.algorithm = selection;
    }
    if let Some(max_nodes) = args.max_nodes {
        config.branch_and_bound.max_nodes = (max_nodes > 0).then_some(max_nodes);
    }
    if let Some(pacing_ms) = args.pacing_ms {
        config.pacing_ms = pacing_ms;
    }

    let instance = Instance::load(&args.instance)
        .with_context(|| format!("loading instance {}", args.instance.display()))?;
    let mut session = Session::new(instance, config).context("starting allocation session")?;
    let results = session.run_selected();

    if args.json {
        println!("{}", serde_json::to_string_pretty(results)?);
    } else {
        print!("{}", report::render_table(results));
        println!();
        print!("{}", report::render_beds(session.instance()));
    }

    if let Some(out) = &args.out {
        session
            .instance()
            .save(out)
            .with_context(|| format!("writing instance to {}", out.display()))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate(args) => generate(args),
        Commands::Run(args) => run(args),
    }
}
