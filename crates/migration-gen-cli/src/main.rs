//! migration-gen CLI - generate Laravel migration files from a live database.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use migration_gen::{catalog, Config, GenError, Generator, Template};
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "migration-gen")]
#[command(about = "Generate migration files from an existing database")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate migration files for every table in the database
    Generate {
        /// Named connection to use (defaults to the config's default_connection)
        #[arg(long)]
        connection: Option<String>,

        /// Override the migrations output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Override the migration template path
        #[arg(long)]
        template: Option<PathBuf>,
    },

    /// Test the database connection
    HealthCheck {
        /// Named connection to use (defaults to the config's default_connection)
        #[arg(long)]
        connection: Option<String>,
    },

    /// Copy the embedded migration template to an editable location
    PublishTemplate {
        /// Destination path for the template
        #[arg(short, long, default_value = "stubs/migration.stub")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, GenError> {
    let cli = Cli::parse();

    // Handle publish-template separately (doesn't need a config file)
    if let Commands::PublishTemplate { output, force } = &cli.command {
        if output.exists() && !force {
            return Err(GenError::Config(format!(
                "{} already exists (use --force to overwrite)",
                output.display()
            )));
        }
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output, migration_gen::render::DEFAULT_TEMPLATE)?;
        println!("Template published to: {}", output.display());
        return Ok(ExitCode::SUCCESS);
    }

    setup_logging(&cli.verbosity, &cli.log_format);

    let config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    let cancel_token = setup_signal_handler();

    match cli.command {
        Commands::PublishTemplate { .. } => unreachable!(), // Handled above

        Commands::Generate {
            connection,
            output_dir,
            template,
        } => {
            let (name, conn) = config.resolve_connection(connection.as_deref())?;
            info!("Using connection '{}' ({})", name, conn.driver);

            let mut generator_config = config.generator.clone();
            if let Some(dir) = output_dir {
                generator_config.output_dir = dir;
            }
            if let Some(path) = template {
                generator_config.template = Some(path);
            }

            // Template is validated before any table work begins
            let template = match &generator_config.template {
                Some(path) => Template::load(path)?,
                None => Template::embedded(),
            };

            let reader = catalog::connect(conn, generator_config.workers).await?;
            let generator = Generator::new(reader, template, &generator_config);
            let result = generator.run(cancel_token).await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                for file in &result.files {
                    println!("Generated: {}", file.display());
                }
                match result.status.as_str() {
                    "completed" => println!("\nMigration files generated successfully."),
                    "cancelled" => println!("\nGeneration cancelled."),
                    _ => println!("\nGeneration finished with failures."),
                }
                println!("  Run ID: {}", result.run_id);
                println!("  Duration: {:.2}s", result.duration_seconds);
                println!(
                    "  Tables: {}/{} ({} skipped)",
                    result.tables_generated, result.tables_total, result.tables_skipped
                );
                if !result.failed_tables.is_empty() {
                    println!("  Failed tables: {:?}", result.failed_tables);
                }
            }

            if result.tables_failed > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::HealthCheck { connection } => {
            let (name, conn) = config.resolve_connection(connection.as_deref())?;
            let reader = catalog::connect(conn, 1).await?;
            let tables = reader.list_tables().await?;
            println!(
                "Connection '{}' OK ({}): {} tables visible",
                name,
                reader.dialect(),
                tables.len()
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Setup signal handlers for graceful shutdown.
/// Already-written migration files stay intact; unprocessed tables are
/// simply not dispatched after cancellation.
#[cfg(unix)]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();

    let token_int = cancel_token.clone();
    let token_term = cancel_token.clone();

    tokio::spawn(async move {
        let mut sigint = signal(SignalKind::interrupt()).expect("Failed to setup SIGINT handler");
        sigint.recv().await;
        eprintln!("\nReceived SIGINT. Finishing in-flight tables...");
        token_int.cancel();
    });

    tokio::spawn(async move {
        let mut sigterm = signal(SignalKind::terminate()).expect("Failed to setup SIGTERM handler");
        sigterm.recv().await;
        eprintln!("\nReceived SIGTERM. Finishing in-flight tables...");
        token_term.cancel();
    });

    cancel_token
}

/// Setup signal handler for Windows (only Ctrl-C).
#[cfg(not(unix))]
fn setup_signal_handler() -> CancellationToken {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to setup Ctrl-C handler");
        eprintln!("\nReceived Ctrl-C. Finishing in-flight tables...");
        token.cancel();
    });

    cancel_token
}
