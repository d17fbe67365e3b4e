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

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use hwid::cli::{Cli, DEFAULT_LOG_LEVEL};
use hwid::commands::{execute, Context};
use hwid::logger::init_audit_log;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v, which wins over the settings file. The settings
    // are not loaded yet, so start at the default level and reload below.
    let from_env = EnvFilter::try_from_default_env().ok();
    let explicit = from_env.is_some() || cli.verbosity_level().is_some();
    let filter = from_env.unwrap_or_else(|| {
        EnvFilter::new(cli.verbosity_level().unwrap_or(DEFAULT_LOG_LEVEL))
    });

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_filter_reloading();
    let reload = builder.reload_handle();
    builder.init();

    let ctx = match Context::from_cli(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(2);
        }
    };

    if !explicit && ctx.settings.log_level != DEFAULT_LOG_LEVEL {
        if let Err(e) = reload.reload(EnvFilter::new(&ctx.settings.log_level)) {
            warn!(error = %e, "Cannot apply configured log level");
        }
    }

    if let Some(ref path) = cli.audit_log {
        if let Err(e) = init_audit_log(path) {
            error!(path = ?path, error = %e, "Cannot open audit log");
        }
    }

    let mut stdout = io::stdout().lock();
    match execute(&cli.command, &ctx, &mut stdout) {
        Ok(status) => ExitCode::from(status),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
