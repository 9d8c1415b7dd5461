//! Map deep-linking for the question on screen.

use std::{
    process::{Command, Stdio},
    thread,
};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use url::Url;

use crate::models::RouteRequest;

/// Directions endpoint used for route links.
pub const DIRECTIONS_URL: &str = "https://www.google.com/maps/dir/";

/// Qualifier appended to station names when none is configured.
pub const DEFAULT_STATION_SUFFIX: &str = "駅";

impl RouteRequest {
    /// Directions link with `suffix` appended to both station names.
    pub fn directions_url(&self, suffix: &str) -> Result<Url> {
        let origin = format!("{}{}", self.origin, suffix);
        let destination = format!("{}{}", self.destination, suffix);
        Url::parse_with_params(
            DIRECTIONS_URL,
            [
                ("api", "1"),
                ("origin", origin.as_str()),
                ("destination", destination.as_str()),
            ],
        )
        .context("failed to build directions url")
    }
}

/// Hands route requests to something that can show a map.
pub trait MapLauncher {
    /// Open directions for `request`. Does not wait for the viewer.
    fn launch(&self, request: &RouteRequest) -> Result<()>;
}

/// Opens directions in the desktop's default URL handler.
#[derive(Debug, Clone)]
pub struct SystemMapLauncher {
    suffix: String,
    command: Option<String>,
}

impl SystemMapLauncher {
    /// `command` overrides the platform opener (e.g. `firefox`).
    pub fn new(suffix: impl Into<String>, command: Option<String>) -> Self {
        Self {
            suffix: suffix.into(),
            command: command.filter(|value| !value.trim().is_empty()),
        }
    }

    fn opener(&self, url: &str) -> Command {
        if let Some(custom) = &self.command {
            let mut parts = custom.split_whitespace();
            let program = parts.next().unwrap_or(custom.as_str());
            let mut command = Command::new(program);
            command.args(parts).arg(url);
            return command;
        }
        platform_opener(url)
    }
}

impl Default for SystemMapLauncher {
    fn default() -> Self {
        Self::new(DEFAULT_STATION_SUFFIX, None)
    }
}

impl MapLauncher for SystemMapLauncher {
    fn launch(&self, request: &RouteRequest) -> Result<()> {
        let url = request.directions_url(&self.suffix)?;
        let mut command = self.opener(url.as_str());
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        let mut child = command
            .spawn()
            .with_context(|| format!("failed to launch {:?}", command.get_program()))?;
        // Reaped off-thread; callers never wait on the opener.
        thread::spawn(move || match child.wait() {
            Ok(status) => debug!(%status, "Map opener exited"),
            Err(err) => warn!(%err, "Failed to wait for map opener"),
        });
        info!(origin = %request.origin, destination = %request.destination, "Route opened");
        Ok(())
    }
}

#[cfg(target_os = "macos")]
fn platform_opener(url: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(url);
    command
}

#[cfg(target_os = "windows")]
fn platform_opener(url: &str) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", ""]).arg(url);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn platform_opener(url: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(url);
    command
}
