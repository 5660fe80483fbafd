use std::path::PathBuf;

use clap::{Parser, Subcommand};
use formats::map_file::MapDocument;
use reqwest::Client;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Lore map data tool")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a map file and list its problems
    Validate { file: PathBuf },

    /// Print the backend calls a save of the file would make
    Convert { file: PathBuf },

    /// Save a map file through a running server
    Import {
        file: PathBuf,

        /// Server base URL (e.g., http://127.0.0.1:9200)
        #[arg(long)]
        server: String,

        /// Admin wallet sent with the request
        #[arg(long)]
        wallet: Option<String>,
    },

    /// Download the live map as a save body
    Export {
        /// Server base URL
        #[arg(long)]
        server: String,

        /// Output file (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Args::parse()).await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), tools::ToolError> {
    match args.command {
        Command::Validate { file } => {
            let doc = MapDocument::load(&file)?;
            for line in tools::describe_issues(&doc) {
                println!("{line}");
            }
            tools::check(&doc)?;
            println!(
                "ok: {} universes, {} locations",
                doc.map.universes.len(),
                doc.map.location_count()
            );
        }
        Command::Convert { file } => {
            let doc = MapDocument::load(&file)?;
            for line in tools::describe_issues(&doc) {
                warn!("{line}");
            }
            for call in tools::storage_calls(&doc) {
                println!("{call}");
            }
        }
        Command::Import {
            file,
            server,
            wallet,
        } => {
            let doc = MapDocument::load(&file)?;
            tools::check(&doc)?;
            let answer = tools::import(&Client::new(), &server, &doc, wallet.as_deref()).await?;
            info!("server answered: {answer}");
        }
        Command::Export { server, out } => {
            let body = tools::export(&Client::new(), &server).await?;
            match out {
                Some(path) => {
                    tools::write_json(&path, &body)?;
                    info!("wrote {}", path.display());
                }
                None => println!("{body:#}"),
            }
        }
    }
    Ok(())
}
