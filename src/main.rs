use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

use menu_extract::config::{load_config, AppConfig};
use menu_extract::pipeline::scan_into;
use menu_extract::providers::ProviderFactory;
use menu_extract::session::ScanSettings;
use menu_extract::storage::{create_store, ImageUpload};
use menu_extract::{
    extract_json_array, write_csv, AnalysisType, MenuItem, Provider, Session, StorageBackend,
};

#[derive(Parser)]
#[command(name = "menu-extract", version, about = "Extract menu, product and invoice items from images")]
struct Cli {
    /// Configuration file (defaults to ./config.toml when present)
    #[arg(long, global = true, env = "MENU_EXTRACT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Address to bind, overriding server.bind
        #[arg(long)]
        bind: Option<String>,
    },
    /// Upload and analyse one or more images, accumulating the items
    Scan {
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// groq or openai
        #[arg(long)]
        provider: Option<String>,
        /// menu, menu_v2, product or nfe
        #[arg(long)]
        analysis: Option<String>,
        /// minio, aws or inline
        #[arg(long)]
        storage: Option<String>,
        /// Also write the items as CSV to this path
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Pull the JSON array out of a saved model answer (stdin when no file)
    Parse { file: Option<PathBuf> },
    /// List the analysis types and what they extract
    Prompts,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            menu_extract::server::serve(config).await?;
        }
        Commands::Scan {
            images,
            provider,
            analysis,
            storage,
            csv,
            json,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let settings = ScanSettings {
                provider: match provider {
                    Some(name) => name.parse::<Provider>()?,
                    None => config.default_provider,
                },
                analysis_type: match analysis {
                    Some(name) => name.parse::<AnalysisType>()?,
                    None => config.default_analysis,
                },
                storage_provider: match storage {
                    Some(name) => name.parse::<StorageBackend>()?,
                    None => config.default_storage,
                },
            };

            let (session, failures) = scan_all(&config, settings, &images).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(session.items())?);
            } else {
                print_table(session.items());
            }

            if let Some(path) = csv {
                let file = std::fs::File::create(&path)?;
                write_csv(file, session.items())?;
                info!("Wrote {} items to {}", session.len(), path.display());
            }

            if failures > 0 {
                error!("{} of {} images failed", failures, images.len());
                std::process::exit(1);
            }
        }
        Commands::Parse { file } => {
            let text = match file {
                Some(path) => tokio::fs::read_to_string(path).await?,
                None => {
                    let mut buffer = String::new();
                    tokio::io::stdin().read_to_string(&mut buffer).await?;
                    buffer
                }
            };
            let records = extract_json_array(&text)?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Prompts => {
            for analysis in AnalysisType::ALL {
                println!("{:<10} {}", analysis.as_str(), analysis.description());
            }
        }
    }

    Ok(())
}

/// Scan every image into one session; failed images are logged and counted
async fn scan_all(
    config: &AppConfig,
    settings: ScanSettings,
    images: &[PathBuf],
) -> Result<(Session, usize), Box<dyn std::error::Error>> {
    let store = create_store(settings.storage_provider, config)?;
    let provider = ProviderFactory::from_config(settings.provider, config)?;

    let mut session = Session::new(settings);
    let mut failures = 0;
    for path in images {
        let upload = match ImageUpload::from_path(path).await {
            Ok(upload) => upload,
            Err(e) => {
                error!("Cannot read {}: {}", path.display(), e);
                failures += 1;
                continue;
            }
        };
        match scan_into(
            &mut session,
            store.as_ref(),
            provider.as_ref(),
            settings.analysis_type,
            &upload,
        )
        .await
        {
            Ok(result) => info!(
                "{}: {} items detected, {} total items",
                path.display(),
                result.items.len(),
                session.len()
            ),
            Err(_) => failures += 1,
        }
    }
    Ok((session, failures))
}

fn print_table(items: &[MenuItem]) {
    println!("{:<10} {:<32} {:<20} {:>10}", "CODE", "NAME", "CATEGORY", "PRICE");
    for item in items {
        println!(
            "{:<10} {:<32} {:<20} {:>10}",
            item.codigo, item.name, item.category, item.price
        );
    }
    println!("{} items", items.len());
}
