// Copyright (C) Brian G. Milnes 2025

//! Run logging for apishift tools
//!
//! Every line is echoed to the console and, when file logging is on, appended
//! to `logs/<tool-name>/<date>/run-<timestamp>.log`. Multiple runs on the same
//! day create separate timestamped files.

pub mod logging {
    use std::fs;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use chrono::{Local, DateTime};
    use anyhow::Result;

    /// Where console output of the logger goes
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Echo {
        Stdout,
        /// Keeps stdout clean for machine-readable output
        Stderr,
        Silent,
    }

    pub struct ToolLogger {
        log_file: Option<fs::File>,
        log_path: Option<PathBuf>,
        tool_name: String,
        start_time: DateTime<Local>,
        echo: Echo,
    }

    impl ToolLogger {
        /// Console-only logger
        pub fn new_disabled() -> Self {
            ToolLogger {
                log_file: None,
                log_path: None,
                tool_name: String::new(),
                start_time: Local::now(),
                echo: Echo::Stdout,
            }
        }

        /// Logger that neither prints nor writes a file
        pub fn silent() -> Self {
            Self::new_disabled().with_echo(Echo::Silent)
        }

        /// Logger writing under `logs/` in the current directory
        pub fn new(tool_name: &str) -> Self {
            Self::in_dir(tool_name, Path::new("logs"))
        }

        /// Logger writing under `<log_root>/<tool-name>/<YYYY-MM-DD>/run-<HH-MM-SS>.log`.
        /// If the file cannot be created the logger keeps going console-only.
        pub fn in_dir(tool_name: &str, log_root: &Path) -> Self {
            let start_time = Local::now();

            let (log_file, log_path) = match Self::create_log_file(log_root, tool_name, &start_time) {
                Ok((file, path)) => (Some(file), Some(path)),
                Err(e) => {
                    eprintln!("Warning: Could not create log file: {e}");
                    eprintln!("Continuing without logging...");
                    (None, None)
                }
            };

            ToolLogger {
                log_file,
                log_path,
                tool_name: tool_name.to_string(),
                start_time,
                echo: Echo::Stdout,
            }
        }

        pub fn with_echo(mut self, echo: Echo) -> Self {
            self.echo = echo;
            self
        }

        fn create_log_file(log_root: &Path, tool_name: &str, start_time: &DateTime<Local>) -> Result<(fs::File, PathBuf)> {
            let date_str = start_time.format("%Y-%m-%d").to_string();
            let time_str = start_time.format("%H-%M-%S").to_string();

            let log_dir = log_root.join(tool_name).join(&date_str);
            fs::create_dir_all(&log_dir)?;

            let log_path = log_dir.join(format!("run-{time_str}.log"));
            let log_file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)?;

            Ok((log_file, log_path))
        }

        pub fn tool_name(&self) -> &str {
            &self.tool_name
        }

        /// Log a message to the console and the log file
        pub fn log(&mut self, message: &str) {
            match self.echo {
                Echo::Stdout => println!("{message}"),
                Echo::Stderr => eprintln!("{message}"),
                Echo::Silent => {}
            }
            self.log_silent(message);
        }

        /// Log a problem; goes to stderr unless the logger is silent
        pub fn log_error(&mut self, message: &str) {
            if self.echo != Echo::Silent {
                eprintln!("{message}");
            }
            self.log_silent(message);
        }

        /// Log file only
        pub fn log_silent(&mut self, message: &str) {
            if let Some(ref mut file) = self.log_file {
                let _ = writeln!(file, "{message}");
            }
        }

        pub fn log_path(&self) -> Option<&Path> {
            self.log_path.as_deref()
        }

        /// Close the run with summary and timing lines
        pub fn finalize(&mut self, summary: &str) {
            let end_time = Local::now();
            let duration = end_time.signed_duration_since(self.start_time);

            self.log("");
            self.log("=== Run Summary ===");
            self.log(summary);
            self.log(&format!("Started: {}", self.start_time.format("%Y-%m-%d %H:%M:%S")));
            self.log(&format!("Ended: {}", end_time.format("%Y-%m-%d %H:%M:%S")));
            self.log(&format!("Duration: {}ms", duration.num_milliseconds()));

            if let Some(path) = self.log_path.clone() {
                self.log(&format!("Log saved to: {}", path.display()));
            }
        }
    }

    impl Drop for ToolLogger {
        fn drop(&mut self) {
            if let Some(ref mut file) = self.log_file {
                let _ = file.flush();
            }
        }
    }
}
