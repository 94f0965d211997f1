//! Daemon assembly and lifecycle.
//!
//! The [`Orchestrator`] wires the configured log follower, the sshd login
//! extractor, and the CIDR allowlist store into one [`LoginPipeline`] and
//! runs it until it fails or a shutdown signal arrives.
//!
//! # Startup Order
//!
//! 1. Validate configuration (nothing is opened on failure)
//! 2. Install the metrics recorder, if enabled
//! 3. Open the log file (fatal if it cannot be opened)
//! 4. Build the allowlist store and the pipeline
//!
//! There is no drain on shutdown: each line is fully recorded before the
//! next one is read, so stopping between lines loses nothing in flight.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

use sshwarden_allowlist::CidrFileStore;
use sshwarden_core::config::SshwardenConfig;
use sshwarden_log_pipeline::{
    LogFollower, LogPipelineError, LoginPipeline, LoginPipelineBuilder, PipelineConfig,
    PipelineStats,
};

use crate::error::DaemonError;
use crate::metrics_server;

/// Why the main loop ended.
enum Outcome {
    Finished(Result<PipelineStats, LogPipelineError>),
    Signal(Result<&'static str>),
}

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Validated configuration.
    config: SshwardenConfig,
    /// The follow -> extract -> record pipeline.
    pipeline: LoginPipeline<LogFollower>,
    /// Daemon start time (for the exit log line).
    start_time: Instant,
}

impl Orchestrator {
    /// Build from an already-resolved configuration.
    ///
    /// # Errors
    ///
    /// - [`DaemonError::Config`] if validation fails
    /// - [`DaemonError::SourceUnavailable`] if the log file cannot be opened
    /// - [`DaemonError::Runtime`] if the metrics recorder cannot be installed
    pub async fn build_from_config(config: SshwardenConfig) -> Result<Self, DaemonError> {
        config.validate()?;

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
        }

        let pipeline_config = PipelineConfig::from_core(&config);
        let follower = LogFollower::open(&pipeline_config).await?;

        let store = CidrFileStore::from_config(&config.allowlist);
        tracing::info!(
            allowlist = %store.path().display(),
            lock = %store.lock_path().display(),
            "allowlist store ready"
        );

        let pipeline = LoginPipelineBuilder::new()
            .source(follower)
            .sink(Arc::new(store))
            .verbose(pipeline_config.verbose)
            .build()?;

        Ok(Self {
            config,
            pipeline,
            start_time: Instant::now(),
        })
    }

    /// Run the pipeline until a fatal error or SIGINT/SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns [`DaemonError::Sink`] when recording an address fails.
    pub async fn run(&mut self) -> Result<(), DaemonError> {
        tracing::info!(
            log_file = %self.config.watch.log_file,
            allowlist = %self.config.allowlist.path,
            "sshwarden-daemon running"
        );

        let outcome = tokio::select! {
            result = self.pipeline.run() => Outcome::Finished(result),
            signal = wait_for_shutdown_signal() => Outcome::Signal(signal),
        };

        let stats = self.pipeline.stats().clone();
        let uptime_secs = self.start_time.elapsed().as_secs();

        match outcome {
            Outcome::Signal(signal) => {
                let signal = signal?;
                tracing::info!(signal, uptime_secs, ?stats, "shutdown signal received");
                Ok(())
            }
            Outcome::Finished(Ok(stats)) => {
                tracing::warn!(uptime_secs, ?stats, "line source ended unexpectedly");
                Ok(())
            }
            Outcome::Finished(Err(e)) => {
                tracing::error!(error = %e, uptime_secs, ?stats, "pipeline halted");
                Err(e.into())
            }
        }
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> &PipelineStats {
        self.pipeline.stats()
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &SshwardenConfig {
        &self.config
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}
