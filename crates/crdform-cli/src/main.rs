//! crdform CLI - Kubernetes CRDs as Terraform-style resources

use clap::{Args, Parser, Subcommand};
use crdform_core::SchemaFlavor;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod display;
mod error;
mod exit_codes;
mod util;

use error::Result;

#[derive(Parser)]
#[command(name = "crdform")]
#[command(author = "crdform Contributors")]
#[command(version)]
#[command(about = "Kubernetes CRDs as Terraform-style resources", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

/// Provider settings shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Provider configuration file (defaults to ~/.config/crdform/config.yaml)
    #[arg(long, global = true, env = "CRDFORM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Kubeconfig file
    #[arg(long, global = true, env = "CRDFORM_KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// Field manager for Server-Side Apply
    #[arg(long, global = true, env = "CRDFORM_FIELD_MANAGER")]
    pub field_manager: Option<String>,

    /// Extra CRD file or directory (repeatable)
    #[arg(long = "crd-path", global = true)]
    pub crd_paths: Vec<PathBuf>,

    /// Do not register the embedded CRD catalog
    #[arg(long, global = true)]
    pub no_builtin_crds: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the registered resource types
    Resources {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the schema of a resource type
    Schema {
        /// Resource type name
        type_name: String,

        /// Schema flavor: resource, data-source or manifest
        #[arg(long, default_value = "resource")]
        flavor: SchemaFlavor,
    },

    /// Validate a configuration against its resource schema
    Validate {
        /// Resource type name
        type_name: String,

        /// Configuration file (JSON or YAML, `-` for stdin)
        #[arg(short, long)]
        file: PathBuf,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Create an object from a plan
    Create {
        /// Resource type name
        type_name: String,

        /// Planned state (JSON or YAML, `-` for stdin)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Refresh a state from the cluster
    Read {
        /// Resource type name
        type_name: String,

        /// Current state (JSON or YAML, `-` for stdin)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Apply a changed plan
    Update {
        /// Resource type name
        type_name: String,

        /// Planned state (JSON or YAML, `-` for stdin)
        #[arg(short, long)]
        file: PathBuf,

        /// Prior state
        #[arg(long)]
        prior: PathBuf,
    },

    /// Delete the object described by a state
    Delete {
        /// Resource type name
        type_name: String,

        /// Current state (JSON or YAML, `-` for stdin)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Import an existing object by `namespace/name` or `name`
    Import {
        /// Resource type name
        type_name: String,

        /// Import identifier
        id: String,
    },

    /// Look up an existing object (data source)
    Get {
        /// Resource type name
        type_name: String,

        /// Configuration with metadata.name and metadata.namespace
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Render a configuration as a Kubernetes manifest without a cluster
    Manifest {
        /// Resource type name (with or without the `_manifest` suffix)
        type_name: String,

        /// Configuration file (JSON or YAML, `-` for stdin)
        #[arg(short, long)]
        file: PathBuf,

        /// Print only the rendered YAML
        #[arg(long)]
        raw: bool,
    },
}

#[tokio::main]
async fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("crdform=debug,crdform_core=debug,crdform_kube=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let global = cli.global;
    match cli.command {
        Commands::Resources { json } => commands::resources::run(&global, json),
        Commands::Schema { type_name, flavor } => {
            commands::schema::run(&global, &type_name, flavor)
        }
        Commands::Validate {
            type_name,
            file,
            strict,
        } => commands::validate::run(&global, &type_name, &file, strict),
        Commands::Create { type_name, file } => {
            commands::create::run(&global, &type_name, &file).await
        }
        Commands::Read { type_name, file } => commands::read::run(&global, &type_name, &file).await,
        Commands::Update {
            type_name,
            file,
            prior,
        } => commands::update::run(&global, &type_name, &file, &prior).await,
        Commands::Delete { type_name, file } => {
            commands::delete::run(&global, &type_name, &file).await
        }
        Commands::Import { type_name, id } => commands::import::run(&global, &type_name, &id).await,
        Commands::Get { type_name, file } => commands::get::run(&global, &type_name, &file).await,
        Commands::Manifest {
            type_name,
            file,
            raw,
        } => commands::manifest::run(&global, &type_name, &file, raw),
    }
}
