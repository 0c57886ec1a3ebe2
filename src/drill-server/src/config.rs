// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support for drill-server.
//!
//! Config is loaded from the `[drill-server]` section of `drill-rs.toml`.
//! Default search order:
//! 1. Path specified via `--config` CLI argument
//! 2. `./drill-rs.toml`
//! 3. `~/.config/drill-rs/drill-rs.toml`
//! 4. `/etc/drill-rs/drill-rs.toml`

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use drill_app::ConfigFile;
use drill_backend::GridSpec;
use drill_core::{LogLevel, LogPolicy, PlatformLayout, WinchLayout};

/// Top-level server configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub general: GeneralConfig,
    /// TCP listener configuration
    pub listen: ListenConfig,
    /// Persisted RPC log panel
    pub log: LogConfig,
    pub platform: PlatformConfig,
    pub winch: WinchConfig,
    /// Simulated grid
    pub grid: GridSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub enabled: bool,
    pub listen: IpAddr,
    pub port: u16,
    pub auth: AuthConfig,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 4560,
            auth: AuthConfig::default(),
        }
    }
}

/// Authentication configuration for the TCP listener.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Valid authentication tokens (empty = no auth required)
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Text file backing the log panel. Kept in memory when unset.
    pub panel_file: Option<PathBuf>,
    /// Most verbose level written to the panel.
    pub max_level: LogLevel,
    /// Oldest lines beyond this count are dropped.
    pub max_lines: Option<usize>,
}

impl Default for LogConfig {
    fn default() -> Self {
        let policy = LogPolicy::default();
        Self {
            panel_file: None,
            max_level: policy.max_level,
            max_lines: policy.max_lines,
        }
    }
}

impl LogConfig {
    pub fn policy(&self) -> LogPolicy {
        LogPolicy {
            max_level: self.max_level,
            max_lines: self.max_lines,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub enabled: bool,
    pub layout: PlatformLayout,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            layout: PlatformLayout::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WinchConfig {
    pub enabled: bool,
    pub layout: WinchLayout,
}

impl Default for WinchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            layout: WinchLayout::default(),
        }
    }
}

impl ServerConfig {
    pub fn platform_layout(&self) -> Option<&PlatformLayout> {
        self.platform.enabled.then_some(&self.platform.layout)
    }

    pub fn winch_layout(&self) -> Option<&WinchLayout> {
        self.winch.enabled.then_some(&self.winch.layout)
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_log_level(self.general.log_level.as_deref())?;

        validate_tokens("[listen.auth].tokens", &self.listen.auth.tokens)?;
        if self.listen.enabled && self.listen.port == 0 {
            return Err("[listen].port must be > 0 when listener is enabled".to_string());
        }

        if self.log.max_lines == Some(0) {
            return Err("[log].max_lines must be > 0 when set".to_string());
        }

        if !self.platform.enabled && !self.winch.enabled {
            return Err("at least one of [platform] and [winch] must be enabled".to_string());
        }

        if self.grid.tick_ms == 0 {
            return Err("[grid].tick_ms must be > 0".to_string());
        }
        if self.platform.enabled && self.grid.platform.piston_count == 0 {
            return Err("[grid.platform].piston_count must be > 0".to_string());
        }
        if self.winch.enabled {
            let winch = &self.grid.winch;
            if winch.drill_ready_angle <= 0.0 {
                return Err("[grid.winch].drill_ready_angle must be > 0".to_string());
            }
            if winch.rolled_down_angle <= winch.drill_ready_angle {
                return Err(
                    "[grid.winch].rolled_down_angle must be greater than drill_ready_angle"
                        .to_string(),
                );
            }
        }
        Ok(())
    }

    /// Generate an example configuration wrapped under the `[drill-server]`
    /// section header, suitable for use in a combined `drill-rs.toml` file.
    pub fn example_combined_toml() -> String {
        #[derive(serde::Serialize)]
        struct Wrapper {
            #[serde(rename = "drill-server")]
            inner: ServerConfig,
        }
        let example = ServerConfig {
            general: GeneralConfig {
                log_level: Some("info".to_string()),
            },
            log: LogConfig {
                panel_file: Some(PathBuf::from("drill-panel.txt")),
                max_level: LogLevel::Info,
                max_lines: Some(500),
            },
            ..Default::default()
        };
        toml::to_string_pretty(&Wrapper { inner: example }).unwrap_or_default()
    }
}

fn validate_log_level(level: Option<&str>) -> Result<(), String> {
    if let Some(level) = level {
        match level {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(format!(
                    "[general].log_level '{}' is invalid (expected one of: trace, debug, info, warn, error)",
                    level
                ))
            }
        }
    }
    Ok(())
}

fn validate_tokens(path: &str, tokens: &[String]) -> Result<(), String> {
    if tokens.iter().any(|t| t.trim().is_empty()) {
        return Err(format!("{path} must not contain empty tokens"));
    }
    Ok(())
}

impl ConfigFile for ServerConfig {
    fn section_key() -> &'static str {
        "drill-server"
    }
}
