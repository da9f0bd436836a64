// --- gradcheck: recálculo de elegibilidad de grado - Archivo principal ---

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use gradcheck::api_json::parse_program_definition;
use gradcheck::store::{open_store, AdvisingWriter};
use gradcheck::{recalculate_eligibility, run_server, EligibilityError, Settings};

#[derive(Parser, Debug)]
#[command(name = "gradcheck", version, about = "Degree-eligibility recalculation service")]
struct Cli {
    /// sqlite://ruta.db, postgres://..., o una ruta SQLite
    #[arg(long, global = true, env = "GRADCHECK_DB_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Levanta la API HTTP
    Serve {
        #[arg(long, env = "GRADCHECK_BIND")]
        bind: Option<String>,
    },
    /// Crea las tablas si no existen
    InitDb,
    /// Importa un programa (requisitos, catálogo y listas) desde JSON
    ImportProgram { file: PathBuf },
    /// Recalcula la elegibilidad de un usuario e imprime el reporte
    Recalculate { user_id: i64 },
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gradcheck=info,actix_web=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!("failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(url) = cli.database_url {
        settings.database_url = url;
    }

    let result = match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                settings.bind = bind;
            }
            return run_server(settings).await;
        }
        Commands::InitDb => {
            let url = settings.database_url.clone();
            blocking(move || {
                let mut store = open_store(&url)?;
                store.init_schema()
            })
            .await
            .map(|()| info!(database = %settings.database_url, "schema initialized"))
        }
        Commands::ImportProgram { file } => {
            let url = settings.database_url.clone();
            blocking(move || {
                let text = std::fs::read_to_string(&file)?;
                let program = parse_program_definition(&text)?;
                let mut store = open_store(&url)?;
                store.init_schema()?;
                store.import_program(&program)
            })
            .await
        }
        Commands::Recalculate { user_id } => {
            let url = settings.database_url.clone();
            blocking(move || {
                let mut store = open_store(&url)?;
                recalculate_eligibility(&mut store, user_id)
            })
            .await
            .and_then(|report| {
                println!("{}", serde_json::to_string_pretty(&report)?);
                Ok(())
            })
        }
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// Corre trabajo de base de datos fuera del runtime async (el cliente de
/// Postgres es síncrono).
async fn blocking<T, F>(f: F) -> Result<T, EligibilityError>
where
    F: FnOnce() -> Result<T, EligibilityError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| EligibilityError::Storage(format!("blocking task failed: {}", e)))?
}
