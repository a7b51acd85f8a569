//! Command-line interface for the Abdera server.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;

use crate::adapter::MULTIPART_RELATED;
use crate::config::ServerConfig;
use crate::error::Result;
use crate::http;

/// Abdera - Atom Publishing Protocol server.
#[derive(Parser)]
#[command(name = "abdera-server")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the configured collections over HTTP.
    Serve {
        /// YAML configuration file (default: built-in single collection)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Listen address, overriding the configuration (e.g., 127.0.0.1:8080)
        #[arg(short, long)]
        listen: Option<String>,
    },

    /// Validate a configuration file and print its collections.
    CheckConfig {
        /// YAML configuration file
        path: PathBuf,
    },
}

/// Run the CLI.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, listen } => serve_command(config.as_deref(), listen).await,
        Commands::CheckConfig { path } => check_config_command(&path),
    }
}

async fn serve_command(config: Option<&Path>, listen: Option<String>) -> Result<()> {
    let mut config = match config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::from_env()?,
    };
    if let Some(listen) = listen {
        config.listen = listen;
    }
    config.validate()?;

    http::serve(&config).await
}

fn check_config_command(path: &Path) -> Result<()> {
    let config = ServerConfig::load(path)?;

    println!(
        "{} {}",
        style("Configuration OK:").green().bold(),
        path.display()
    );
    println!("  Listen: {}", style(&config.listen).cyan());
    println!("  Base path: {}", style(&config.base_path).cyan());
    println!("  Max body: {} bytes", config.max_body_bytes);

    for workspace in &config.workspaces {
        println!();
        println!("  Workspace: {}", style(&workspace.title).bold());
        for collection in &workspace.collections {
            let multipart = collection
                .accepts
                .iter()
                .any(|accept| accept.alternate == MULTIPART_RELATED);
            println!(
                "    {} {} ({} accept ranges{})",
                style(&collection.name).green(),
                collection.title,
                collection.accept_map().entries().len(),
                if multipart { ", multipart" } else { "" }
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_serve() {
        let cli = Cli::parse_from(["abdera-server", "serve"]);

        let Commands::Serve { config, listen } = cli.command else {
            unreachable!("expected serve");
        };
        assert!(config.is_none());
        assert!(listen.is_none());
    }

    #[test]
    fn test_cli_parse_serve_with_options() {
        let cli = Cli::parse_from([
            "abdera-server",
            "serve",
            "--config",
            "abdera.yaml",
            "--listen",
            "127.0.0.1:9000",
        ]);

        let Commands::Serve { config, listen } = cli.command else {
            unreachable!("expected serve");
        };
        assert_eq!(config, Some(PathBuf::from("abdera.yaml")));
        assert_eq!(listen.as_deref(), Some("127.0.0.1:9000"));
    }

    #[test]
    fn test_cli_parse_check_config() {
        let cli = Cli::parse_from(["abdera-server", "check-config", "abdera.yaml"]);

        let Commands::CheckConfig { path } = cli.command else {
            unreachable!("expected check-config");
        };
        assert_eq!(path, PathBuf::from("abdera.yaml"));
    }

    #[test]
    fn test_check_config_missing_file() {
        assert!(check_config_command(Path::new("/nonexistent/abdera.yaml")).is_err());
    }
}
