//! CLI argument definitions for sshwarden-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.
//! Flags take precedence over environment variables, which take precedence
//! over the config file.

use std::path::PathBuf;

use clap::Parser;

use sshwarden_core::config::SshwardenConfig;

use crate::error::DaemonError;

/// Follows the SSH authentication log and adds the source address of every
/// successful login to a CIDR allowlist file.
#[derive(Parser, Debug)]
#[command(name = "sshwarden-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to an optional sshwarden.toml configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Authentication log to follow (e.g. /var/log/auth.log).
    #[arg(long)]
    pub log_file: Option<String>,

    /// CIDR allowlist file to record login addresses into.
    #[arg(long, visible_alias = "allowlist-file")]
    pub cidr_file: Option<String>,

    /// Log non-matching lines and every recorded address.
    #[arg(short, long)]
    pub verbose: bool,

    /// Replay the whole existing log before following new lines.
    #[arg(long)]
    pub from_beginning: bool,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration and exit without opening any file.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Resolve the effective configuration.
    ///
    /// Loads the config file (or defaults when none is given), applies
    /// environment overrides, then CLI overrides, then validates.
    ///
    /// # Errors
    ///
    /// Returns [`DaemonError::Config`] if the file cannot be loaded or the
    /// resulting configuration is invalid.
    pub async fn resolve_config(&self) -> Result<SshwardenConfig, DaemonError> {
        let mut config = match &self.config {
            Some(path) => SshwardenConfig::load(path).await?,
            None => {
                let mut config = SshwardenConfig::default();
                config.apply_env_overrides();
                config
            }
        };

        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of `config`.
    ///
    /// Boolean flags can only switch a setting on.
    pub fn apply_overrides(&self, config: &mut SshwardenConfig) {
        if let Some(log_file) = &self.log_file {
            config.watch.log_file.clone_from(log_file);
        }
        if let Some(cidr_file) = &self.cidr_file {
            config.allowlist.path.clone_from(cidr_file);
        }
        if self.verbose {
            config.general.verbose = true;
        }
        if self.from_beginning {
            config.watch.from_beginning = true;
        }
        if let Some(level) = &self.log_level {
            config.general.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            config.general.log_format.clone_from(format);
        }
    }
}
