//! procgraph command line driver
//!
//! Builds node graphs from operation scripts, round-trips them through an
//! in-memory scene host and projects them into a graph store.

mod commands;
mod config;
mod constants;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use node_graph::{validate_nodes, SceneNode, TypeCatalog};

use crate::config::AppConfig;
use crate::constants::files;

#[derive(Parser, Debug)]
#[command(name = "procgraph", version)]
struct Cli {
    /// Configuration file.
    #[arg(long, global = true, default_value = files::CONFIG)]
    config: PathBuf,

    /// Node type catalog (overrides the configuration).
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply an operation script and write the resulting nodes.
    Build(BuildArgs),
    /// Materialize nodes in a scene host and extract them back.
    Roundtrip(RoundtripArgs),
    /// Project nodes into the graph store.
    Project(ProjectArgs),
    /// Print what a caller needs to keep building.
    Brief(BriefArgs),
    /// Write the effective configuration to the configuration file.
    Init(InitArgs),
}

#[derive(Parser, Debug)]
struct BuildArgs {
    /// Operation script (JSON array).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output nodes JSON; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RoundtripArgs {
    /// Nodes JSON written by `build`.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output for the extracted nodes; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Host path extraction starts from.
    #[arg(long)]
    root: Option<String>,
}

#[derive(Parser, Debug)]
struct ProjectArgs {
    /// Nodes JSON written by `build`.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// SQLite database (overrides the configuration).
    #[arg(long)]
    db: Option<PathBuf>,

    /// Print every node upstream of this path.
    #[arg(long)]
    lineage: Option<String>,
}

#[derive(Parser, Debug)]
struct BriefArgs {
    /// Operation script to apply first.
    #[arg(long = "in")]
    in_path: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct InitArgs {
    /// Replace an existing configuration file.
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(&cli.config).await?;
    if let Some(catalog) = cli.catalog {
        config.catalog_path = catalog;
    }

    match cli.cmd {
        Command::Build(args) => cmd_build(&config, args),
        Command::Roundtrip(args) => cmd_roundtrip(config, args),
        Command::Project(args) => cmd_project(config, args).await,
        Command::Brief(args) => cmd_brief(&config, args),
        Command::Init(args) => cmd_init(&config, &cli.config, args).await,
    }
}

fn load_catalog(config: &AppConfig) -> anyhow::Result<Arc<TypeCatalog>> {
    let catalog = TypeCatalog::load(&config.catalog_path).with_context(|| {
        format!("load node type catalog '{}'", config.catalog_path.display())
    })?;
    Ok(Arc::new(catalog))
}

fn write_nodes(nodes: &[SceneNode], out: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(nodes)?;
    match out {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("write '{}'", path.display()))?;
            log::info!("Wrote {} node(s) to {:?}", nodes.len(), path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn cmd_build(config: &AppConfig, args: BuildArgs) -> anyhow::Result<()> {
    let catalog = load_catalog(config)?;
    let entries = commands::load_script(&args.in_path, &config.default_location)?;
    let (outcomes, output) = commands::build(catalog, config, entries);

    for outcome in &outcomes {
        match outcome {
            Ok(outcome) => eprintln!("{}", outcome.message()),
            Err(e) => eprintln!("{}", e),
        }
    }
    if !output.is_complete() {
        eprintln!("unresolved: {} wire(s)", output.unresolved.len());
        for wire in &output.unresolved {
            eprintln!("  {}", wire);
        }
    }
    write_nodes(&output.nodes, args.out.as_deref())
}

fn cmd_roundtrip(mut config: AppConfig, args: RoundtripArgs) -> anyhow::Result<()> {
    if let Some(root) = args.root {
        config.sync.extract_root = root;
    }
    let catalog = load_catalog(&config)?;
    let nodes = commands::read_nodes(&args.in_path)?;
    for problem in validate_nodes(&nodes, Some(catalog.as_ref())) {
        log::warn!("{}", problem);
    }
    let (report, extraction) = commands::round_trip(catalog, &config, &nodes)?;

    eprintln!(
        "materialized: {} node(s), {} parameter(s), {} connection(s)",
        report.nodes_created, report.parameters_set, report.connections_made
    );
    for issue in report.issues.iter().chain(&extraction.issues) {
        eprintln!("  {}", issue);
    }
    write_nodes(&extraction.nodes, args.out.as_deref())
}

async fn cmd_project(mut config: AppConfig, args: ProjectArgs) -> anyhow::Result<()> {
    if args.db.is_some() {
        config.database_path = args.db;
    }
    let nodes = commands::read_nodes(&args.in_path)?;
    let (report, stats, lineage) =
        commands::project(&config, &nodes, args.lineage.as_deref()).await?;

    println!(
        "projected: {} node(s), {} parameter(s), {} edge(s), {} skipped",
        report.nodes_upserted, report.parameters_upserted, report.edges_upserted, report.skipped_edges
    );
    println!(
        "store: {} node(s), {} parameter(s), {} edge(s)",
        stats.nodes, stats.parameters, stats.edges
    );
    for failure in &report.failures {
        eprintln!("  {}", failure);
    }
    if let Some(path) = &args.lineage {
        println!("upstream of {}:", path);
        for source in &lineage {
            println!("  {}", source);
        }
    }

    if !report.is_complete() {
        anyhow::bail!("{} projection write(s) failed", report.failures.len());
    }
    Ok(())
}

fn cmd_brief(config: &AppConfig, args: BriefArgs) -> anyhow::Result<()> {
    let catalog = load_catalog(config)?;
    let operations = match &args.in_path {
        Some(path) => commands::readable(commands::load_script(path, &config.default_location)?),
        None => Vec::new(),
    };
    let briefing = commands::brief(catalog, config, operations);
    println!("{}", serde_json::to_string_pretty(&briefing)?);
    Ok(())
}

async fn cmd_init(config: &AppConfig, path: &Path, args: InitArgs) -> anyhow::Result<()> {
    commands::init_config(config, path, args.force).await?;
    println!("wrote {}", path.display());
    Ok(())
}
