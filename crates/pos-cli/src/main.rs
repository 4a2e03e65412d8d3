mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, kitchen::KitchenSubcommand, user::UserSubcommand};
use pos_core::types::BusinessType;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pos",
    about = "Multi-vertical point of sale: store setup, users, config and the API server",
    version,
    propagate_version = true
)]
struct Cli {
    /// Store root (default: walk up from the current directory looking for .pos/)
    #[arg(long, global = true, env = "POS_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .pos/, the config file and the database
    Init {
        /// Vertical this store runs as
        #[arg(long, default_value = "retail")]
        business_type: BusinessType,

        /// Store name (default: directory name)
        #[arg(long)]
        name: Option<String>,

        /// Create an admin account with this username
        #[arg(long, requires = "admin_password")]
        admin_user: Option<String>,

        /// Password for --admin-user
        #[arg(long, requires = "admin_user")]
        admin_password: Option<String>,
    },

    /// Run the HTTP API and push server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "3141")]
        port: u16,

        /// Open the health endpoint in a browser once listening
        #[arg(long)]
        open: bool,
    },

    /// Manage user accounts
    User {
        #[command(subcommand)]
        subcommand: UserSubcommand,
    },

    /// Show or validate the store configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Print the workflow chain a vertical runs on inventory routes
    Workflows {
        /// Vertical (default: the store's)
        business_type: Option<BusinessType>,
    },

    /// Inspect the persisted kitchen board
    Kitchen {
        #[command(subcommand)]
        subcommand: KitchenSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init {
            business_type,
            name,
            admin_user,
            admin_password,
        } => cmd::init::run(
            &root,
            business_type,
            name.as_deref(),
            admin_user.as_deref().zip(admin_password.as_deref()),
        ),
        Commands::Serve { port, open } => cmd::serve::run(&root, port, open),
        Commands::User { subcommand } => cmd::user::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Workflows { business_type } => {
            cmd::workflows::run(&root, business_type, cli.json)
        }
        Commands::Kitchen { subcommand } => cmd::kitchen::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
