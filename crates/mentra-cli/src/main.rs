mod check_cmd;
mod config;
mod generate_cmd;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use config::MentraConfig;

#[derive(Parser)]
#[command(name = "mentra", about = "Validated, prerequisite-aware learning roadmaps")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a mentra config file
    Init {
        /// Gemini API key to store in the config file
        #[arg(long)]
        api_key: Option<String>,
        /// Gemini model name
        #[arg(long)]
        model: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Sanitize and validate a learning request file
    CheckInput {
        /// Path to the request JSON
        file: PathBuf,
    },
    /// Validate a model reply file (code fences allowed)
    CheckRoadmap {
        /// Path to the reply text
        file: PathBuf,
    },
    /// Generate a roadmap for a learning request
    Generate {
        /// Path to the request JSON
        file: PathBuf,
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Override the configured model name
        #[arg(long)]
        model: Option<String>,
    },
    /// Serve the validation and generation HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
        /// Override the configured model name
        #[arg(long)]
        model: Option<String>,
    },
}

/// Execute the `mentra init` command: write config file.
fn cmd_init(api_key: Option<String>, model: Option<String>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let has_key = api_key.is_some();
    let cfg = config::ConfigFile {
        model: config::ModelSection {
            api_key,
            name: Some(model.unwrap_or_else(|| mentra_core::ModelConfig::DEFAULT_MODEL.to_string())),
            base_url: None,
            timeout_secs: Some(mentra_core::ModelConfig::DEFAULT_TIMEOUT.as_secs()),
        },
        validation: config::ValidationSection {
            hour_tolerance: Some(mentra_core::HOUR_SUM_TOLERANCE),
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    if let Some(name) = &cfg.model.name {
        println!("  model.name = {name}");
    }
    if !has_key {
        println!();
        println!("No API key stored. Set GEMINI_API_KEY or re-run with --api-key.");
    }

    Ok(())
}

fn exit_unless(ok: bool) {
    if !ok {
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            api_key,
            model,
            force,
        } => {
            cmd_init(api_key, model, force)?;
        }
        Commands::CheckInput { file } => {
            exit_unless(check_cmd::run_check_input(&file)?);
        }
        Commands::CheckRoadmap { file } => {
            let resolved = MentraConfig::resolve(None)?;
            exit_unless(check_cmd::run_check_roadmap(&file, resolved.hour_tolerance)?);
        }
        Commands::Generate {
            file,
            output,
            model,
        } => {
            let resolved = MentraConfig::resolve(model.as_deref())?;
            let generator = generate_cmd::build_generator(&resolved)?;
            exit_unless(generate_cmd::run_generate(&generator, &file, output.as_deref()).await?);
        }
        Commands::Serve { bind, port, model } => {
            let resolved = MentraConfig::resolve(model.as_deref())?;
            let generator = generate_cmd::build_generator(&resolved)?;
            serve_cmd::run_serve(generator, &bind, port).await?;
        }
    }

    Ok(())
}
