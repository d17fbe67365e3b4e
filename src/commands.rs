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

//! Command execution
//!
//! Each command writes its report to `out` and returns the process exit
//! status. Verification failures are a status of 1, not an error.

use anyhow::{bail, Context as _, Result};
use serde_json::json;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use hwid_core::constants::paths::{user_config_dir, SETTINGS_FILE};
use hwid_core::fingerprint::{BuildPhase, FingerprintBuilder};
use hwid_core::{
    from_base64, Block, BlockSet, CollectorSet, Fingerprint, FingerprintStore, MatchEngine,
    MatchReport, Settings,
};

use crate::cli::{Cli, Commands, ConfigCommands, OutputFormat};
use crate::logger::log_event;

pub const EXIT_OK: u8 = 0;
pub const EXIT_REJECTED: u8 = 1;

/// Resolved settings, paths and the machine's collectors
pub struct Context {
    pub settings: Settings,
    pub config_dir: Option<PathBuf>,
    pub store_path: PathBuf,
    builder: FingerprintBuilder,
}

impl Context {
    /// Context for the running machine, honoring `--config`
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config_dir = cli.config.clone().or_else(user_config_dir);
        let settings = match config_dir.as_deref() {
            Some(dir) => Settings::load_from_dir(dir)
                .with_context(|| format!("loading settings from {}", dir.display()))?,
            None => Settings::default(),
        };
        Self::new(settings, config_dir, CollectorSet::system())
    }

    pub fn new(settings: Settings, config_dir: Option<PathBuf>, collectors: CollectorSet) -> Result<Self> {
        let store_path = settings.resolve_store_path(config_dir.as_deref())?;
        let builder = FingerprintBuilder::with_options(collectors, settings.builder_options());
        Ok(Self {
            settings,
            config_dir,
            store_path,
            builder,
        })
    }

    fn engine(&self) -> MatchEngine {
        MatchEngine::with_policy(self.settings.policy)
    }

    /// Reference blocks for verification
    fn reference<'a>(&self, set: &'a BlockSet) -> &'a [Block] {
        if self.settings.accept_legacy_formats {
            set.blocks()
        } else {
            set.current()
        }
    }

    fn verify_bytes(&self, set: &BlockSet, candidate: &[u8]) -> MatchReport {
        self.engine().evaluate(self.reference(set), candidate)
    }
}

/// Run `command`, returning the exit status
pub fn execute(command: &Commands, ctx: &Context, out: &mut dyn Write) -> Result<u8> {
    match command {
        Commands::Show { format } => cmd_show(ctx, *format, out),
        Commands::Components => cmd_components(ctx, out),
        Commands::Decode { fingerprint } => cmd_decode(fingerprint, out),
        Commands::Verify { fingerprint } => cmd_verify(ctx, fingerprint, out),
        Commands::Enroll { label, force } => cmd_enroll(ctx, label.clone(), *force, out),
        Commands::Check => cmd_check(ctx, out),
        Commands::Config(sub) => cmd_config(ctx, sub, out),
    }
}

// ============================================================================
// Fingerprint Commands
// ============================================================================

fn cmd_show(ctx: &Context, format: OutputFormat, out: &mut dyn Write) -> Result<u8> {
    let set = ctx.builder.build();
    let fingerprint = set.fingerprint();
    if fingerprint.is_empty() {
        bail!("no hardware components could be read");
    }

    match format {
        OutputFormat::Base64 => writeln!(out, "{}", fingerprint)?,
        OutputFormat::Hex => writeln!(out, "{}", fingerprint.to_hex())?,
        OutputFormat::Json => {
            let value = json!({
                "fingerprint": fingerprint.to_base64(),
                "blocks": blocks_json(set.current()),
                "legacy_blocks": blocks_json(set.legacy()),
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        }
    }
    Ok(EXIT_OK)
}

fn cmd_components(ctx: &Context, out: &mut dyn Write) -> Result<u8> {
    let (set, trace) = ctx.builder.build_traced();

    writeln!(out, "Components")?;
    writeln!(out, "==========")?;
    for entry in &trace {
        let phase = match entry.phase {
            BuildPhase::Legacy => "legacy",
            BuildPhase::Current => "current",
        };
        let block = entry
            .block
            .map(|b| format!("{:08x}", b.value()))
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "  {:<7} {:<4} {:>3} bytes  {}  {:?}",
            phase,
            entry.component,
            entry.raw.len(),
            block,
            entry.outcome
        )?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "Blocks: {} current, {} legacy (max {})",
        set.current().len(),
        set.legacy().len(),
        set.max_blocks()
    )?;
    Ok(EXIT_OK)
}

fn cmd_decode(text: &str, out: &mut dyn Write) -> Result<u8> {
    let fingerprint = Fingerprint::parse(text).context("decoding fingerprint")?;
    writeln!(out, "{} blocks", fingerprint.block_count())?;
    for (i, block) in fingerprint.blocks().iter().enumerate() {
        writeln!(out, "  [{:2}] {:08x}  {}", i, block.value(), block.component())?;
    }
    Ok(EXIT_OK)
}

fn cmd_verify(ctx: &Context, text: &str, out: &mut dyn Write) -> Result<u8> {
    let set = ctx.builder.build();
    let report = match from_base64(text) {
        Ok(candidate) => ctx.verify_bytes(&set, &candidate),
        Err(e) => {
            debug!(error = %e, "Presented fingerprint unreadable");
            MatchReport::malformed()
        }
    };

    write_report(&report, out)?;
    log_event("verify", json!({ "verdict": report.verdict }));
    Ok(exit_status(&report))
}

// ============================================================================
// Enrollment Commands
// ============================================================================

fn cmd_enroll(ctx: &Context, label: Option<String>, force: bool, out: &mut dyn Write) -> Result<u8> {
    let mut store = match FingerprintStore::load_from(&ctx.store_path) {
        Ok(store) => store,
        Err(e) if force => {
            warn!(path = ?ctx.store_path, error = %e, "Unreadable store replaced by forced enrollment");
            FingerprintStore::new()
        }
        Err(e) => {
            return Err(e).with_context(|| format!("reading {}", ctx.store_path.display()));
        }
    };
    if store.is_enrolled() && !force {
        bail!(
            "a fingerprint is already enrolled in {} (use --force to replace it)",
            ctx.store_path.display()
        );
    }

    let fingerprint = ctx.builder.build().fingerprint();
    if fingerprint.is_empty() {
        bail!("no hardware components could be read");
    }
    let blocks = fingerprint.block_count();
    store.enroll(fingerprint, label)?;
    store.save_to(&ctx.store_path)?;

    info!(path = ?ctx.store_path, blocks, "Enrollment saved");
    log_event("enroll", json!({ "blocks": blocks, "label": store.label }));
    writeln!(out, "Enrolled {} blocks in {}", blocks, ctx.store_path.display())?;
    Ok(EXIT_OK)
}

fn cmd_check(ctx: &Context, out: &mut dyn Write) -> Result<u8> {
    let mut store = FingerprintStore::load_from(&ctx.store_path)?;
    let enrolled = store.reference()?.clone();

    let set = ctx.builder.build();
    let report = ctx.verify_bytes(&set, enrolled.as_bytes());

    store.record_verification(report.verdict)?;
    store.save_to(&ctx.store_path)?;

    write_report(&report, out)?;
    log_event(
        "check",
        json!({ "verdict": report.verdict, "verify_count": store.verify_count }),
    );
    Ok(exit_status(&report))
}

// ============================================================================
// Config Commands
// ============================================================================

fn cmd_config(ctx: &Context, sub: &ConfigCommands, out: &mut dyn Write) -> Result<u8> {
    match sub {
        ConfigCommands::Show => {
            writeln!(out, "{}", serde_json::to_string_pretty(&ctx.settings)?)?;
        }
        ConfigCommands::Path => {
            let dir = ctx.config_dir.as_deref();
            writeln!(out, "config:   {}", display_opt(dir))?;
            writeln!(
                out,
                "settings: {}",
                display_opt(dir.map(|d| d.join(SETTINGS_FILE)).as_deref())
            )?;
            writeln!(out, "store:    {}", ctx.store_path.display())?;
        }
    }
    Ok(EXIT_OK)
}

// ============================================================================
// Helpers
// ============================================================================

fn blocks_json(blocks: &[Block]) -> serde_json::Value {
    blocks
        .iter()
        .map(|b| json!({ "value": format!("{:08x}", b.value()), "component": b.component() }))
        .collect()
}

fn write_report(report: &MatchReport, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Verdict: {}", report.verdict)?;
    writeln!(
        out,
        "Matched: {}/{} component types",
        report.matched_count(),
        report.found_count()
    )?;
    let changed = report.changed_components();
    if !changed.is_empty() {
        let names: Vec<String> = changed.iter().map(|c| c.to_string()).collect();
        writeln!(out, "Changed: {}", names.join(", "))?;
    }
    Ok(())
}

fn exit_status(report: &MatchReport) -> u8 {
    if report.is_accepted() {
        EXIT_OK
    } else {
        EXIT_REJECTED
    }
}

fn display_opt(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".to_string())
}
