use anyhow::{Context, Result};
use std::sync::Arc;

use crate::{Config, ValidationResult};

/// Main application state and lifecycle manager
pub struct App {
    config: Arc<Config>,
    validation: ValidationResult,
}

impl App {
    /// Create a new application instance from the on-disk configuration
    pub fn new() -> Result<Self> {
        let (config, validation) = Config::load_validated()?;
        Ok(Self {
            config: Arc::new(config),
            validation,
        })
    }

    /// Create an application instance from an already-built configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let validation = config.require_valid()?;

        Ok(Self {
            config: Arc::new(config),
            validation,
        })
    }

    /// Prepare the on-disk layout the application needs
    pub fn initialize(&mut self) -> Result<()> {
        tracing::info!(
            "Initializing application in {}",
            self.config.config_dir.display()
        );

        std::fs::create_dir_all(&self.config.config_dir)
            .context("Failed to create config directory")?;

        if !self.validation.warnings.is_empty() {
            tracing::debug!(
                "Application initialized with {} config warnings",
                self.validation.warnings.len()
            );
        }

        tracing::info!("Application initialized successfully");
        Ok(())
    }

    /// Shutdown the application
    pub fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Shutting down application");
        Ok(())
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }
}
