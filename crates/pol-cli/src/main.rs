use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "polctl")]
#[command(about = "Bulk policy reordering against a catalog snapshot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> overrides ...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print the calls a reconciliation would issue, plus current drift. No mutation.
    Plan {
        #[command(flatten)]
        target: commands::Target,

        /// Desired topology (YAML or JSON)
        #[arg(long)]
        topology: String,
    },

    /// Reconcile the catalog to the topology and write the snapshot back.
    Apply {
        #[command(flatten)]
        target: commands::Target,

        /// Desired topology (YAML or JSON)
        #[arg(long)]
        topology: String,

        /// Leave the moves staged in the draft instead of publishing them.
        #[arg(long, default_value_t = false)]
        no_publish: bool,
    },

    /// Print persisted state (recomputed indices) as JSON.
    Read {
        #[command(flatten)]
        target: commands::Target,

        /// Only report the sections and rules this topology manages.
        #[arg(long)]
        topology: Option<String>,
    },

    /// Publish whatever is staged in the snapshot's draft.
    Publish {
        #[command(flatten)]
        target: commands::Target,
    },
}

fn main() -> Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = pol_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
        Commands::Plan { target, topology } => commands::reorder::plan(&target, &topology)?,
        Commands::Apply {
            target,
            topology,
            no_publish,
        } => commands::reorder::apply(&target, &topology, no_publish)?,
        Commands::Read { target, topology } => {
            commands::reorder::read(&target, topology.as_deref())?
        }
        Commands::Publish { target } => commands::reorder::publish(&target)?,
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
