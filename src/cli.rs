/*
 * This file is part of hwid.
 *
 * Copyright (C) 2025 hwid contributors
 *
 * hwid is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * hwid is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with hwid. If not, see <https://www.gnu.org/licenses/>.
 */

//! Command Line Interface
//!
//! Argument definitions only; execution lives in `commands`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hwid")]
#[command(version)]
#[command(about = "hwid - Tolerant machine fingerprints")]
#[command(long_about = "hwid - Tolerant machine fingerprints

Builds a compact fingerprint from the CPU signature, host name, network
adapters and volume UUIDs, and verifies fingerprints against this machine.
The CPU must match; any one other component may change.

EXAMPLES:
    hwid show                          Print this machine's fingerprint (base64)
    hwid show --format json            Fingerprint with its decoded blocks
    hwid components                    Readings and blocks per component
    hwid decode qZk+NA==               List the blocks of a fingerprint
    hwid verify <FINGERPRINT>          Exit 0 if it belongs to this machine
    hwid enroll --label workstation    Store this machine's fingerprint
    hwid check                         Verify against the stored fingerprint
    hwid config show                   Effective settings as JSON

ENVIRONMENT VARIABLES:
    RUST_LOG=debug         Enable debug logging (overrides settings)
    HWID_CONFIG_DIR=DIR    Use DIR instead of ~/.config/hwid

FILES:
    ~/.config/hwid/settings.json           Settings
    ~/.config/hwid/fingerprint_store.json  Enrolled fingerprint")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config directory (settings.json, fingerprint_store.json)
    #[arg(long, global = true, value_name = "DIR")]
    pub config: Option<PathBuf>,

    /// Append enrollment and verification events to FILE as JSON lines
    #[arg(long, global = true, value_name = "FILE")]
    pub audit_log: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Log level used until the settings file has been read
pub const DEFAULT_LOG_LEVEL: &str = "info";

impl Cli {
    /// Log level requested with `-v`, if any
    pub fn verbosity_level(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and print this machine's fingerprint
    Show {
        #[arg(long, value_enum, default_value_t = OutputFormat::Base64)]
        format: OutputFormat,
    },

    /// Show every reading offered to the fingerprint and what became of it
    Components,

    /// Decode a base64 fingerprint and list its blocks
    Decode {
        fingerprint: String,
    },

    /// Check a fingerprint against this machine (exit status 1 on reject)
    Verify {
        fingerprint: String,
    },

    /// Store this machine's fingerprint as the reference
    Enroll {
        /// Name recorded with the enrollment
        #[arg(long)]
        label: Option<String>,

        /// Replace an existing enrollment
        #[arg(long)]
        force: bool,
    },

    /// Verify this machine against the enrolled fingerprint and record it
    Check,

    /// Settings inspection
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print effective settings as JSON
    Show,
    /// Print config, settings and store paths
    Path,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Base64,
    Hex,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::parse_from(["hwid", "-vv", "--config", "/tmp/x", "show", "--format", "hex"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(cli.command, Commands::Show { format: OutputFormat::Hex }));
    }

    #[test]
    fn test_verbosity_level() {
        assert_eq!(Cli::parse_from(["hwid", "check"]).verbosity_level(), None);
        assert_eq!(Cli::parse_from(["hwid", "-v", "check"]).verbosity_level(), Some("debug"));
        assert_eq!(Cli::parse_from(["hwid", "check", "-vvv"]).verbosity_level(), Some("trace"));
    }

    #[test]
    fn test_parse_enroll() {
        let cli = Cli::parse_from(["hwid", "enroll", "--label", "lab", "--force"]);
        match cli.command {
            Commands::Enroll { label, force } => {
                assert_eq!(label.as_deref(), Some("lab"));
                assert!(force);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_path() {
        let cli = Cli::parse_from(["hwid", "config", "path"]);
        assert!(matches!(cli.command, Commands::Config(ConfigCommands::Path)));
    }
}
