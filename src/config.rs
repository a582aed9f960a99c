/*
 *  config.rs
 *
 *  pumphouse - four pumps, one panel
 *  (c) 2023-26 pumphouse authors
 *
 *  Layered configuration: YAML file, CLI overrides, validation
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

/// Buttons wired on BCM 27/22/23/24 (header pins 13, 15, 16, 18).
const DEFAULT_BUTTON_PINS: [u8; 4] = [27, 22, 23, 24];
/// Relays wired on BCM 12/13/16/26 (header pins 32, 33, 36, 37).
const DEFAULT_RELAY_PINS: [u8; 4] = [12, 13, 16, 26];
const DEFAULT_POLL_MS: u64 = 150;
const DEFAULT_BUS: &str = "/dev/i2c-1";
const DEFAULT_TEXT_ADDRESS: u8 = 0x3E;
const DEFAULT_RGB_ADDRESS: u8 = 0x62;
const DEFAULT_REFRESH_MS: u64 = 200;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration. All fields are Options so the YAML file and
/// the CLI can each fill in only what they care about.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,
    pub panel: Option<PanelConfig>,
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PanelConfig {
    /// BCM numbers of the button inputs, index-paired with the relays.
    pub button_pins: Option<Vec<u8>>,
    /// BCM numbers of the relay outputs.
    pub relay_pins: Option<Vec<u8>>,
    pub poll_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    pub driver: Option<DriverKind>,
    pub bus: Option<String>,
    pub text_address: Option<u8>,
    pub rgb_address: Option<u8>,
    /// Set false for a panel without the RGB driver chip.
    pub backlight: Option<bool>,
    pub refresh_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Grove RGB LCD over I2C.
    Grove,
    /// Recording in-memory sinks, no hardware required.
    Mock,
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone)]
#[command(name = "pumphouse", version, about = "Garden pump control panel")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Display driver: grove (hardware) or mock (desktop testing)
    #[arg(long, value_enum)]
    pub driver: Option<DriverKind>,
    /// I2C bus device path (e.g. /dev/i2c-1)
    #[arg(long)]
    pub i2c_bus: Option<String>,
    /// Display repaint period in milliseconds
    #[arg(long)]
    pub refresh_ms: Option<u64>,
    /// Button poll period in milliseconds
    #[arg(long)]
    pub poll_ms: Option<u64>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<Config, ConfigError> {
    let cli = Cli::parse();

    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, &cli);

    // 4) Validate
    validate(&cfg)?;

    if cli.dump_config {
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    if let Some(home) = home_dir() {
        let p = home.join(".config/pumphouse/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/pumphouse.yaml");
        if p.exists() { return Some(p) }
    }
    for candidate in &["pumphouse.yaml", "config.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some() { dst.log_level = src.log_level; }
    match (&mut dst.panel, src.panel) {
        (None, Some(p)) => dst.panel = Some(p),
        (Some(d), Some(s)) => merge_panel(d, s),
        _ => {}
    }
    match (&mut dst.display, src.display) {
        (None, Some(c)) => dst.display = Some(c),
        (Some(d), Some(s)) => merge_display(d, s),
        _ => {}
    }
}

fn merge_panel(dst: &mut PanelConfig, src: PanelConfig) {
    if src.button_pins.is_some() { dst.button_pins = src.button_pins; }
    if src.relay_pins.is_some()  { dst.relay_pins = src.relay_pins; }
    if src.poll_ms.is_some()     { dst.poll_ms = src.poll_ms; }
}

fn merge_display(dst: &mut DisplayConfig, src: DisplayConfig) {
    if src.driver.is_some()       { dst.driver = src.driver; }
    if src.bus.is_some()          { dst.bus = src.bus; }
    if src.text_address.is_some() { dst.text_address = src.text_address; }
    if src.rgb_address.is_some()  { dst.rgb_address = src.rgb_address; }
    if src.backlight.is_some()    { dst.backlight = src.backlight; }
    if src.refresh_ms.is_some()   { dst.refresh_ms = src.refresh_ms; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some() { cfg.log_level = cli.log_level.clone(); }

    let any_display = cli.driver.is_some() || cli.i2c_bus.is_some() || cli.refresh_ms.is_some();
    if any_display && cfg.display.is_none() {
        cfg.display = Some(DisplayConfig::default());
    }
    if let Some(display) = cfg.display.as_mut() {
        if cli.driver.is_some()     { display.driver = cli.driver; }
        if cli.i2c_bus.is_some()    { display.bus = cli.i2c_bus.clone(); }
        if cli.refresh_ms.is_some() { display.refresh_ms = cli.refresh_ms; }
    }

    if cli.poll_ms.is_some() {
        cfg.panel.get_or_insert_with(PanelConfig::default).poll_ms = cli.poll_ms;
    }
}

/// Invariants the rest of the app relies on.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(panel) = cfg.panel.as_ref() {
        let buttons = panel.button_pins.as_deref().unwrap_or(&DEFAULT_BUTTON_PINS);
        let relays = panel.relay_pins.as_deref().unwrap_or(&DEFAULT_RELAY_PINS);
        if buttons.is_empty() || buttons.len() != relays.len() {
            return Err(ConfigError::Validation(
                "button_pins and relay_pins must be nonempty and index-paired".into(),
            ));
        }
        if panel.poll_ms == Some(0) {
            return Err(ConfigError::Validation("poll_ms must be > 0".into()));
        }
    }
    if let Some(display) = cfg.display.as_ref() {
        for addr in [display.text_address, display.rgb_address].into_iter().flatten() {
            if addr >= 0x80 {
                return Err(ConfigError::Validation(format!(
                    "I2C address 0x{addr:02x} is not a 7-bit address"
                )));
            }
        }
        if display.refresh_ms == Some(0) {
            return Err(ConfigError::Validation("refresh_ms must be > 0".into()));
        }
    }
    Ok(())
}

impl Config {
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn button_pins(&self) -> Vec<u8> {
        self.panel
            .as_ref()
            .and_then(|p| p.button_pins.clone())
            .unwrap_or_else(|| DEFAULT_BUTTON_PINS.to_vec())
    }

    pub fn relay_pins(&self) -> Vec<u8> {
        self.panel
            .as_ref()
            .and_then(|p| p.relay_pins.clone())
            .unwrap_or_else(|| DEFAULT_RELAY_PINS.to_vec())
    }

    pub fn poll_period(&self) -> Duration {
        let ms = self
            .panel
            .as_ref()
            .and_then(|p| p.poll_ms)
            .unwrap_or(DEFAULT_POLL_MS);
        Duration::from_millis(ms)
    }

    pub fn driver(&self) -> DriverKind {
        self.display
            .as_ref()
            .and_then(|d| d.driver)
            .unwrap_or(DriverKind::Grove)
    }

    pub fn i2c_bus(&self) -> String {
        self.display
            .as_ref()
            .and_then(|d| d.bus.clone())
            .unwrap_or_else(|| DEFAULT_BUS.to_string())
    }

    pub fn text_address(&self) -> u8 {
        self.display
            .as_ref()
            .and_then(|d| d.text_address)
            .unwrap_or(DEFAULT_TEXT_ADDRESS)
    }

    /// None when the backlight capability is disabled.
    pub fn rgb_address(&self) -> Option<u8> {
        let display = self.display.as_ref();
        if display.and_then(|d| d.backlight) == Some(false) {
            return None;
        }
        Some(
            display
                .and_then(|d| d.rgb_address)
                .unwrap_or(DEFAULT_RGB_ADDRESS),
        )
    }

    pub fn refresh_period(&self) -> Duration {
        let ms = self
            .display
            .as_ref()
            .and_then(|d| d.refresh_ms)
            .unwrap_or(DEFAULT_REFRESH_MS);
        Duration::from_millis(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve() {
        let cfg = Config::default();
        assert_eq!(cfg.button_pins(), vec![27, 22, 23, 24]);
        assert_eq!(cfg.relay_pins(), vec![12, 13, 16, 26]);
        assert_eq!(cfg.driver(), DriverKind::Grove);
        assert_eq!(cfg.text_address(), 0x3E);
        assert_eq!(cfg.rgb_address(), Some(0x62));
        assert_eq!(cfg.refresh_period(), Duration::from_millis(200));
        assert_eq!(cfg.poll_period(), Duration::from_millis(150));
    }

    #[test]
    fn yaml_layer_merges_over_defaults() {
        let mut cfg = Config::default();
        let file: Config = serde_yaml::from_str(
            "log_level: debug\ndisplay:\n  driver: mock\n  refresh_ms: 50\n",
        )
        .unwrap();
        merge(&mut cfg, file);
        assert_eq!(cfg.log_level(), "debug");
        assert_eq!(cfg.driver(), DriverKind::Mock);
        assert_eq!(cfg.refresh_period(), Duration::from_millis(50));
        // untouched fields still fall back
        assert_eq!(cfg.text_address(), 0x3E);
    }

    #[test]
    fn backlight_false_disables_rgb() {
        let cfg: Config =
            serde_yaml::from_str("display:\n  backlight: false\n  rgb_address: 98\n").unwrap();
        assert_eq!(cfg.rgb_address(), None);
    }

    #[test]
    fn validate_rejects_mismatched_pin_lists() {
        let cfg: Config =
            serde_yaml::from_str("panel:\n  button_pins: [1, 2]\n  relay_pins: [3]\n").unwrap();
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_zero_periods_and_bad_addresses() {
        let cfg: Config = serde_yaml::from_str("display:\n  refresh_ms: 0\n").unwrap();
        assert!(validate(&cfg).is_err());
        let cfg: Config = serde_yaml::from_str("panel:\n  poll_ms: 0\n").unwrap();
        assert!(validate(&cfg).is_err());
        let cfg: Config = serde_yaml::from_str("display:\n  text_address: 144\n").unwrap();
        assert!(validate(&cfg).is_err());
    }
}
