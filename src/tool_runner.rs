// Copyright (C) Brian G. Milnes 2025

//! Tool runner for apishift binaries
//!
//! Wraps a tool body with:
//! - Directory context for Emacs compile-mode
//! - Optional file logging
//! - Timing

pub mod tool_runner {
    use std::time::Instant;
    use std::path::PathBuf;
    use anyhow::Result;
    use crate::logging::logging::{Echo, ToolLogger};

    /// Anything a tool body returns that can close a run with one line
    pub trait RunSummary {
        fn summary_line(&self) -> String;
    }

    pub struct ToolConfig {
        /// Name of the tool (for the log directory)
        pub tool_name: String,
        /// Directory shown in "Entering directory"
        pub base_dir: PathBuf,
        pub enable_logging: bool,
        pub echo: Echo,
    }

    impl ToolConfig {
        pub fn new(tool_name: &str, base_dir: PathBuf) -> Self {
            ToolConfig {
                tool_name: tool_name.to_string(),
                base_dir,
                enable_logging: false,
                echo: Echo::Stdout,
            }
        }

        pub fn with_logging(mut self, enable: bool) -> Self {
            self.enable_logging = enable;
            self
        }

        pub fn with_echo(mut self, echo: Echo) -> Self {
            self.echo = echo;
            self
        }
    }

    /// Run a tool body with standard context, timing and optional logging.
    /// The body's value is handed back to the caller.
    pub fn run_tool<T, F>(config: ToolConfig, tool_fn: F) -> Result<T>
    where
        T: RunSummary,
        F: FnOnce(&mut ToolLogger) -> Result<T>,
    {
        let start = Instant::now();

        let mut logger = if config.enable_logging {
            ToolLogger::new(&config.tool_name)
        } else {
            ToolLogger::new_disabled()
        }
        .with_echo(config.echo);

        logger.log(&format!("Entering directory '{}'", config.base_dir.display()));
        logger.log("");

        let outcome = tool_fn(&mut logger)?;
        let summary = outcome.summary_line();

        if config.enable_logging {
            logger.finalize(&summary);
        } else {
            logger.log("");
            logger.log(&summary);
        }
        logger.log(&format!("Completed in {}ms", start.elapsed().as_millis()));

        Ok(outcome)
    }
}
