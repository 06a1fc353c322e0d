//! wrapkit inspector
//!
//! Loads a foreign object snapshot and browses it through typed proxies.
//!
//! Usage:
//!   wrapkit --snapshot demos/drivetrain.json types
//!   wrapkit --snapshot demos/drivetrain.json list Gearbox Shafts
//!   wrapkit --snapshot demos/drivetrain.json call Input Mount '[120.0]'

use std::path::PathBuf;
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;
use wrapkit_cli::Inspector;
use wrapkit_proxy::ProxyConfig;

#[derive(Parser, Debug)]
#[command(name = "wrapkit")]
#[command(about = "Inspect foreign object snapshots through typed wrappers")]
struct Args {
    /// Snapshot file (JSON)
    #[arg(short, long)]
    snapshot: PathBuf,

    /// Proxy configuration file (TOML)
    #[arg(short, long, default_value = "wrapkit.toml")]
    config: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List roots and registered wrapper types
    Types,
    /// Show a root object and its properties
    Show { root: String },
    /// List the elements of a collection property
    List { root: String, collection: String },
    /// Look up one collection element by id or name
    Get {
        root: String,
        collection: String,
        /// Element id, or name. Use `name:42` for a name made of digits
        key: String,
    },
    /// Call a method on a root with a JSON argument array
    Call {
        root: String,
        method: String,
        #[arg(default_value = "[]")]
        args: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = ProxyConfig::load_from(&args.config);
    let inspector = Inspector::open(&args.snapshot, config)?;
    debug!(command = ?args.command, "Running command");

    match &args.command {
        Command::Types => print!("{}", inspector.types()?),
        Command::Show { root } => {
            println!("{}", serde_json::to_string_pretty(&inspector.show(root)?)?);
        }
        Command::List { root, collection } => {
            for row in inspector.list(root, collection)? {
                println!("{row}");
            }
        }
        Command::Get {
            root,
            collection,
            key,
        } => {
            let element = inspector.get(root, collection, key)?;
            println!("{}", serde_json::to_string_pretty(&element)?);
        }
        Command::Call { root, method, args } => {
            let result = inspector.call(root, method, args)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }
    Ok(())
}
