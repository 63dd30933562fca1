//! flatkv CLI
//!
//! Command-line access to a storage root, without going through the server.

use std::io::Write;

use clap::{Parser, Subcommand};
use flatkv::{Command, Store};
use tracing_subscriber::{fmt, EnvFilter};

/// flatkv CLI
#[derive(Parser, Debug)]
#[command(name = "flatkv-cli")]
#[command(about = "CLI for a flatkv storage root")]
#[command(version)]
struct Args {
    /// Storage root
    #[arg(short, long, env = "STORAGE_PATH", default_value = "/tmp")]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Print every stored entry
    Dump,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();
    let store = Store::open_path(&args.data_dir);

    let command = match args.command {
        Commands::Get { key } => Command::Get { key: key.into_bytes() },
        Commands::Set { key, value } => Command::Set {
            key: key.into_bytes(),
            value: value.into_bytes(),
        },
        Commands::Del { key } => Command::Delete { key: key.into_bytes() },
        Commands::Dump => {
            dump(&store);
            return;
        }
    };

    match store.execute(command) {
        Ok(Some(value)) => {
            if let Err(e) = print_value(&mut std::io::stdout().lock(), &value) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        Ok(None) => println!("OK"),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_value(out: &mut impl Write, value: &[u8]) -> std::io::Result<()> {
    out.write_all(value)?;
    out.write_all(b"\n")?;
    out.flush()
}

fn dump(store: &Store) {
    let mapping = match store.snapshot() {
        Ok(mapping) => mapping,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    let mut entries: Vec<_> = mapping.into_iter().collect();
    entries.sort();

    for (key, value) in entries {
        println!(
            "{} = {}",
            String::from_utf8_lossy(&key),
            String::from_utf8_lossy(&value)
        );
    }
}
