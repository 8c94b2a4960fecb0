//! Weft CLI - run configurator for remote DAG workflows

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use weft::error::{FixSuggestion, WeftError};
use weft::{
    plan_run, FileProbe, FleetMaxima, Forest, LayoutEngine, LocalFiles, NoLocalFiles, RunConfig,
    RunPlan, WeftConfig, WorkflowVersionGraph,
};

#[derive(Parser)]
#[command(name = "weft")]
#[command(about = "Weft - run configurator for remote DAG workflows")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a run configuration to a workflow version graph
    Apply {
        /// Workflow version graph (JSON)
        graph: PathBuf,

        /// Run configuration (YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Fleet maxima (YAML); defaults to the [fleet] table of the user config
        #[arg(short, long)]
        fleet: Option<PathBuf>,

        /// Write the new graph here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Treat FILE values as URLs or uploaded files only
        #[arg(long)]
        no_local_files: bool,
    },

    /// Print the workflow as a tree, final steps first
    Tree {
        /// Workflow version graph (JSON)
        graph: PathBuf,

        /// Include literal nodes as leaves
        #[arg(short, long)]
        primitives: bool,

        /// List each node's input parameters
        #[arg(long)]
        params: bool,
    },

    /// Recompute editor coordinates
    Layout {
        /// Workflow version graph (JSON)
        graph: PathBuf,

        /// Write the laid-out graph here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check graph consistency, optionally against a run configuration
    Validate {
        /// Workflow version graph (JSON)
        graph: PathBuf,

        /// Run configuration (YAML) to resolve without writing anything
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Fleet maxima (YAML)
        #[arg(short, long)]
        fleet: Option<PathBuf>,
    },

    /// Inspect the user configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (file + environment)
    Show,
    /// Print the configuration file path
    Path,
}

fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Apply {
            graph,
            config,
            fleet,
            output,
            no_local_files,
        } => apply(&graph, &config, fleet.as_deref(), output.as_deref(), no_local_files),
        Commands::Tree {
            graph,
            primitives,
            params,
        } => tree(&graph, primitives, params),
        Commands::Layout { graph, output } => layout(&graph, output.as_deref()),
        Commands::Validate {
            graph,
            config,
            fleet,
        } => validate(&graph, config.as_deref(), fleet.as_deref()),
        Commands::Config { action } => handle_config_command(action),
    };

    if let Err(e) = result {
        report(&e);
        std::process::exit(1);
    }
}

fn report(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);
    match err.downcast_ref::<WeftError>() {
        Some(weft) => {
            if weft.to_string() != err.to_string() {
                eprintln!("  {weft}");
            }
            if let Some(suggestion) = weft.fix_suggestion() {
                eprintln!("  {} {}", "Fix:".yellow(), suggestion);
            }
        }
        None => {
            for cause in err.chain().skip(1) {
                eprintln!("  {} {}", "Caused by:".dimmed(), cause);
            }
        }
    }
}

fn apply(
    graph_path: &Path,
    config_path: &Path,
    fleet_path: Option<&Path>,
    output: Option<&Path>,
    no_local_files: bool,
) -> anyhow::Result<()> {
    let graph = load_graph(graph_path)?;
    let run = load_run_config(config_path)?;
    let settings = load_settings()?;
    let fleet = resolve_fleet(fleet_path, &settings)?;

    let probe: &dyn FileProbe = if no_local_files {
        &NoLocalFiles
    } else {
        &LocalFiles
    };
    let plan = plan_run(&graph, &run, &fleet, &settings.layout, probe)?;

    write_output(&plan.graph.to_json_pretty()?, output)?;
    print_summary(&plan);
    Ok(())
}

fn tree(graph_path: &Path, primitives: bool, params: bool) -> anyhow::Result<()> {
    let graph = load_graph(graph_path)?;
    let forest = Forest::project(&graph, primitives);

    if forest.is_empty() {
        println!("{} Workflow has no nodes", "→".cyan());
        return Ok(());
    }
    print!("{}", forest.render());

    if params {
        println!();
        for node in graph.nodes.values() {
            println!("{} {}", node.name.cyan().bold(), format!("[{}]", node.kind).dimmed());
            for (name, port) in node.params() {
                let multi = if port.multi { " (multi)" } else { "" };
                println!("  {name}: {}{multi}", port.port_type);
            }
        }
    }
    Ok(())
}

fn layout(graph_path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let mut graph = load_graph(graph_path)?;
    let settings = load_settings()?;

    let computed = LayoutEngine::new(settings.layout).compute(&Forest::project(&graph, true))?;
    graph.apply_layout(&computed);

    write_output(&graph.to_json_pretty()?, output)
}

fn validate(
    graph_path: &Path,
    config_path: Option<&Path>,
    fleet_path: Option<&Path>,
) -> anyhow::Result<()> {
    let graph = load_graph(graph_path)?;
    graph.check_connections()?;
    LayoutEngine::default().compute(&Forest::project(&graph, true))?;

    println!(
        "{} Graph '{}' is consistent",
        "✓".green(),
        graph_path.display()
    );
    println!("  Nodes: {}", graph.nodes.len());
    println!("  Literals: {}", graph.primitive_nodes.len());
    println!("  Connections: {}", graph.connections.len());

    if let Some(config_path) = config_path {
        let run = load_run_config(config_path)?;
        let settings = load_settings()?;
        let fleet = resolve_fleet(fleet_path, &settings)?;
        let plan = plan_run(&graph, &run, &fleet, &settings.layout, &LocalFiles)?;

        println!(
            "{} Run configuration '{}' applies cleanly",
            "✓".green(),
            config_path.display()
        );
        for line in plan_details(&plan) {
            println!("{line}");
        }
    }
    Ok(())
}

fn handle_config_command(action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Path => println!("{}", WeftConfig::config_path().display()),
        ConfigAction::Show => {
            let settings = load_settings()?;
            print!(
                "{}",
                toml::to_string_pretty(&settings).context("Failed to render configuration")?
            );
        }
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
// LOADING / OUTPUT HELPERS
// ═══════════════════════════════════════════════════════════════

fn load_graph(path: &Path) -> anyhow::Result<WorkflowVersionGraph> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read graph from {}", path.display()))?;
    WorkflowVersionGraph::from_json(&json)
        .with_context(|| format!("Failed to parse graph {}", path.display()))
}

fn load_run_config(path: &Path) -> anyhow::Result<RunConfig> {
    let yaml = fs::read_to_string(path)
        .with_context(|| format!("Failed to read run configuration from {}", path.display()))?;
    RunConfig::from_yaml(&yaml)
        .with_context(|| format!("Failed to parse run configuration {}", path.display()))
}

fn load_settings() -> anyhow::Result<WeftConfig> {
    Ok(WeftConfig::load()?.with_env()?)
}

fn resolve_fleet(path: Option<&Path>, settings: &WeftConfig) -> anyhow::Result<FleetMaxima> {
    if let Some(path) = path {
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("Failed to read fleet from {}", path.display()))?;
        let fleet: FleetMaxima = serde_yaml::from_str(&yaml)
            .map_err(WeftError::from)
            .with_context(|| format!("Failed to parse fleet {}", path.display()))?;
        return Ok(fleet);
    }
    match settings.fleet {
        Some(fleet) => Ok(fleet),
        None => {
            tracing::warn!("no fleet maxima configured, no machine class is offered");
            Ok(FleetMaxima::default())
        }
    }
}

fn write_output(content: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => fs::write(path, format!("{content}\n"))
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}

/// Summary goes to stderr so stdout stays valid JSON
fn print_summary(plan: &RunPlan) {
    if plan.changed {
        eprintln!("{} New workflow version required", "→".cyan());
    } else {
        eprintln!("{} Graph unchanged", "✓".green());
    }
    for line in plan_details(plan) {
        eprintln!("{line}");
    }
}

fn plan_details(plan: &RunPlan) -> Vec<String> {
    let mut lines = Vec::new();
    if !plan.outputs.is_empty() {
        lines.push(format!("  Outputs: {}", plan.outputs.join(", ")));
    }
    if plan.machines.is_empty() {
        lines.push(format!(
            "  Machines: {} (set a fleet with --fleet or [fleet] in {})",
            "none allocated".yellow(),
            WeftConfig::config_path().display()
        ));
    } else {
        lines.push(format!("  Machines: {}", plan.machines));
    }
    for upload in &plan.pending_uploads {
        lines.push(format!(
            "  {} {} → {}",
            "Upload:".yellow(),
            upload.path,
            upload.primitive
        ));
    }
    lines
}
