//! Settings file persistence and the interactive first-run prompt
//!
//! The file is a `[Settings]` table with a `Timeout` key:
//!
//! ```toml
//! [Settings]
//! Timeout = 0.5
//! ```

use crate::error::{NetpulseError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, ErrorKind, Write};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Seconds between probes
    #[serde(rename = "Timeout", alias = "timeout")]
    pub timeout: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(rename = "Settings")]
    settings: Settings,
}

impl Settings {
    /// Read `path`; `Ok(None)` when the file does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let file: SettingsFile = toml::from_str(&text).map_err(|e| {
            NetpulseError::Settings(format!("{}: {}", path.display(), e.message()))
        })?;
        validate_timeout(file.settings.timeout)?;

        debug!(path = %path.display(), timeout = file.settings.timeout, "Settings loaded");
        Ok(Some(file.settings))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string(&SettingsFile { settings: *self })
            .map_err(|e| NetpulseError::Settings(e.to_string()))?;
        fs::write(path, text)?;
        debug!(path = %path.display(), "Settings saved");
        Ok(())
    }
}

/// A probe interval must be a finite number of seconds above zero
pub fn validate_timeout(seconds: f64) -> Result<f64> {
    if seconds.is_finite() && seconds > 0.0 {
        Ok(seconds)
    } else {
        Err(NetpulseError::Config(format!(
            "timeout must be a positive number of seconds, got {}",
            seconds
        )))
    }
}

/// Ask on `output` until `input` yields a valid timeout
pub fn prompt_timeout<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prefix: &str,
) -> Result<f64> {
    loop {
        write!(
            output,
            "{} >> Enter the timeout value in seconds (e.g., 0.1): ",
            prefix
        )?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(NetpulseError::Config(
                "no timeout entered before end of input".into(),
            ));
        }

        match line
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|t| validate_timeout(*t).is_ok())
        {
            Some(timeout) => return Ok(timeout),
            None => writeln!(
                output,
                "{} >> Invalid input. Please enter a valid number.",
                prefix
            )?,
        }
    }
}
