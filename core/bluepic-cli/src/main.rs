//! bluepic: command line driver for the BluePic session core.
//!
//! Drives the same `SessionEngine` the mobile shell embeds, with the TCP
//! probe, the file-backed feed and a scripted identity provider plugged in.
//!
//! ## Subcommands
//!
//! - `status`: Print the persisted session as JSON
//! - `sign-in`: Record a sign-in through a scripted provider
//! - `sign-out`, `later`: Sign out / choose "sign in later"
//! - `server`: Set or clear the server address
//! - `launch`: Run the connectivity precheck and one reconciliation pass
//! - `tab`: Show what tapping a tab would do

mod commands;
mod launch;
mod logging;

use std::path::PathBuf;

use bluepic_core::{ProviderKind, StorageConfig, Tab};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "bluepic")]
#[command(about = "BluePic session and launch driver")]
#[command(version)]
struct Cli {
    /// Storage root (defaults to ~/.bluepic)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current session snapshot
    Status,

    /// Sign in with a provider (credentials come from the flags)
    SignIn {
        #[arg(value_enum)]
        provider: ProviderArg,

        /// Display name returned by the provider
        #[arg(long)]
        name: String,

        /// Provider-scoped user id
        #[arg(long)]
        id: String,

        /// Profile image URL (Google only)
        #[arg(long)]
        avatar: Option<String>,
    },

    /// Sign out of the current provider
    SignOut,

    /// Skip sign-in for now
    Later,

    /// Set the server address, or clear it with --clear
    Server {
        #[arg(value_name = "URL", required_unless_present = "clear")]
        url: Option<String>,

        #[arg(long, conflicts_with = "url")]
        clear: bool,
    },

    /// Run the launch flow and print every outcome as a JSON line
    Launch {
        /// Feed file to read (defaults to <root>/feed.json)
        #[arg(long, value_name = "FILE")]
        feed: Option<PathBuf>,
    },

    /// Show the decision for tapping a tab
    Tab {
        #[arg(value_enum)]
        tab: TabArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ProviderArg {
    Facebook,
    Google,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Facebook => ProviderKind::Facebook,
            ProviderArg::Google => ProviderKind::Google,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum TabArg {
    Feed,
    Camera,
    Profile,
}

impl From<TabArg> for Tab {
    fn from(arg: TabArg) -> Self {
        match arg {
            TabArg::Feed => Tab::Feed,
            TabArg::Camera => Tab::Camera,
            TabArg::Profile => Tab::Profile,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let storage = cli
        .root
        .map(StorageConfig::with_root)
        .unwrap_or_default();
    let _logging_guard = logging::init(&storage.logs_dir());

    let result = match cli.command {
        Commands::Status => commands::status(&storage),
        Commands::SignIn {
            provider,
            name,
            id,
            avatar,
        } => commands::sign_in(&storage, provider.into(), &name, &id, avatar),
        Commands::SignOut => commands::sign_out(&storage),
        Commands::Later => commands::later(&storage),
        Commands::Server { url, clear } => {
            commands::server(&storage, if clear { None } else { url.as_deref() })
        }
        Commands::Launch { feed } => launch::run(&storage, feed),
        Commands::Tab { tab } => commands::tab(&storage, tab.into()),
    };

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            tracing::error!(error = %e, "bluepic command failed");
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
