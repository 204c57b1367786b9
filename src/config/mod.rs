pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use toml_config::DigestConfig;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "kino-digest")]
#[command(about = "Daily digest of what the Kraków cinemas are showing")]
pub struct CliConfig {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(long)]
    pub config: Option<String>,

    /// Gotify server origin, e.g. https://push.example.com
    #[arg(long)]
    pub origin: Option<String>,

    /// Gotify application token
    #[arg(long)]
    pub token: Option<String>,

    #[arg(long, help = "Print the summary to stdout")]
    pub log: bool,

    /// Directory receiving summary-YYYY-MM-DD.txt
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Title registry (SQLite file)
    #[arg(long)]
    pub db: Option<String>,

    #[arg(long, help = "Append booking links to showings")]
    pub links: bool,

    #[arg(long, help = "Look up newly seen titles in the film catalog")]
    pub enrich: bool,

    /// Collection window in seconds
    #[arg(long)]
    pub window: Option<u64>,

    /// Only run these venues (repeatable), e.g. --venue kika --venue multikino
    #[arg(long = "venue")]
    pub venues: Vec<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Loads the configuration file (or defaults) and lays the flags over it.
    pub fn resolve(&self) -> Result<DigestConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📋 Loading configuration from {}", path);
                DigestConfig::from_file(path)?
            }
            None => DigestConfig::default(),
        };
        self.apply_to(&mut config);
        Ok(config)
    }

    pub fn apply_to(&self, config: &mut DigestConfig) {
        if let Some(origin) = &self.origin {
            config.notify.origin = Some(origin.clone());
        }
        if let Some(token) = &self.token {
            config.notify.token = Some(token.clone());
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory = Some(dir.clone());
        }
        if let Some(db) = &self.db {
            config.store.path = db.clone();
        }
        if let Some(window) = self.window {
            config.collection.window_seconds = window;
        }
        if !self.venues.is_empty() {
            config.venues.only = Some(self.venues.clone());
        }
        config.output.log |= self.log;
        config.output.links |= self.links;
        config.catalog.enabled |= self.enrich;
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::domain::venue::Venue;

    #[test]
    fn test_flags_override_file_values() {
        let cli = CliConfig::parse_from([
            "kino-digest",
            "--db",
            "/tmp/other.db",
            "--window",
            "45",
            "--venue",
            "kika",
            "--venue",
            "sfinks",
            "--links",
        ]);
        let mut config =
            DigestConfig::from_toml_str("[store]\npath = \"/srv/movies.db\"\n[output]\nlog = true\n")
                .unwrap();

        cli.apply_to(&mut config);

        assert_eq!(config.store.path, "/tmp/other.db");
        assert_eq!(config.collection.window_seconds, 45);
        assert!(config.output.log);
        assert!(config.output.links);
        assert_eq!(
            config.selected_venues().unwrap(),
            vec![Venue::Kika, Venue::Sfinks]
        );
    }

    #[test]
    fn test_no_flags_keep_defaults() {
        let cli = CliConfig::parse_from(["kino-digest"]);
        let config = cli.resolve().unwrap();

        assert_eq!(config.store.path, "./movies.db");
        assert!(!config.catalog.enabled);
        assert!(config.venues.only.is_none());
    }
}
