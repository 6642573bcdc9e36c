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
//! Runs the identification lifecycle and the operator diagnostics.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;

use hwid_core::constants::paths;
use hwid_core::{
    bloom_report, probe_cpu_serial, verify_report, IdentityConfig, IdentityContext,
    IdentityOrigin, PlatformSource, Plausibility,
};

#[derive(Parser, Debug)]
#[command(name = "hwid")]
#[command(version)]
#[command(about = "hwid - Drift-tolerant hardware-bound device identifiers")]
#[command(long_about = "hwid - Drift-tolerant hardware-bound device identifiers

Derives a persistent device identifier from CPU serials, network
addresses, card ids and platform ids, tolerating one or two devices
changing between runs.

EXAMPLES:
    hwid id                            Print the public identifier
    hwid id --raw                      Also print the raw fingerprint
    hwid bloom b827eb123456 1234abcd   Encode strings into one filter
    hwid verify 4f1c8d2e9a7b40c3b5d6e7f809a1b2c3
    hwid status --json                 Full lifecycle report

ENVIRONMENT VARIABLES:
    HWID_LOG=debug         Log filter (default: warn)
    HWID_CONFIG=<path>     Identity config file

FILES:
    ~/.config/hwid/.hwid_id            Stored fingerprint (system scope)
    <package_dir>/.hwid_id             Stored fingerprint (package scope)")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Identity config file (JSON); overrides HWID_CONFIG
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless HWID_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the public identifier of this device
    Id {
        /// Also print the raw fingerprint and where it came from
        #[arg(long)]
        raw: bool,
    },

    /// Encode strings and print "<weight> <value>" of their union
    Bloom {
        /// Strings to encode
        inputs: Vec<String>,
    },

    /// Check whether a string looks like a genuine serial
    Verify {
        candidate: String,

        /// Only require hex digits with some variety
        #[arg(long)]
        lenient: bool,
    },

    /// Probe the CPU serial collector
    Cpuinfo,

    /// Run the lifecycle and report every step
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

// ============================================================================
// CLI Execution
// ============================================================================

pub fn run_cli<W: Write>(cli: &Cli, out: &mut W) -> anyhow::Result<()> {
    debug!(command = ?cli.command, "Running command");
    match &cli.command {
        Commands::Id { raw } => cmd_id(cli, *raw, out),
        Commands::Bloom { inputs } => cmd_bloom(inputs, out),
        Commands::Verify { candidate, lenient } => cmd_verify(candidate, *lenient, out),
        Commands::Cpuinfo => cmd_cpuinfo(cli, out),
        Commands::Status { json } => cmd_status(cli, *json, out),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<IdentityConfig> {
    IdentityConfig::load(cli.config.as_deref()).context("Failed to load identity config")
}

fn describe_origin(origin: &IdentityOrigin) -> String {
    match origin {
        IdentityOrigin::Stored(record) => format!("stored ({:?}) {}", record.scope, record.origin),
        IdentityOrigin::Generated => "generated".to_string(),
    }
}

// ============================================================================
// Identity Commands
// ============================================================================

fn cmd_id<W: Write>(cli: &Cli, raw: bool, out: &mut W) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    let ctx = IdentityContext::from_config(&config);

    writeln!(out, "{}", ctx.public_id())?;
    if raw {
        writeln!(out, "raw:    {} (weight {})", ctx.raw(), ctx.raw().weight())?;
        writeln!(out, "origin: {}", describe_origin(ctx.origin()))?;
    }

    ctx.teardown();
    Ok(())
}

fn cmd_status<W: Write>(cli: &Cli, json: bool, out: &mut W) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    let ctx = IdentityContext::from_config(&config);
    let status = ctx.status();

    if json {
        let text = serde_json::to_string_pretty(&status)?;
        writeln!(out, "{}", text)?;
        return Ok(());
    }

    writeln!(out, "hwid Status")?;
    writeln!(out, "===========")?;
    writeln!(out)?;
    writeln!(out, "State:     {:?}", status.state)?;
    writeln!(out, "Public id: {}", status.public_id)?;
    writeln!(out, "Raw:       {} (weight {})", status.raw, status.weight)?;
    writeln!(out, "Origin:    {}", describe_origin(&status.origin))?;
    writeln!(out, "Elevated:  {}", if paths::is_elevated() { "yes" } else { "no" })?;
    if let Some(check) = status.last_check {
        writeln!(
            out,
            "Check:     {} of {} matches required ({})",
            check.matches,
            check.required,
            if check.accepted { "accepted" } else { "rejected" }
        )?;
    }
    writeln!(out)?;
    writeln!(out, "Persisted to {} location(s):", status.persisted_to.len())?;
    for location in &status.persisted_to {
        writeln!(out, "  {}", location)?;
    }

    Ok(())
}

// ============================================================================
// Diagnostic Commands
// ============================================================================

fn cmd_bloom<W: Write>(inputs: &[String], out: &mut W) -> anyhow::Result<()> {
    writeln!(out, "{}", bloom_report(inputs))?;
    Ok(())
}

fn cmd_verify<W: Write>(candidate: &str, lenient: bool, out: &mut W) -> anyhow::Result<()> {
    let mode = if lenient {
        Plausibility::Lenient
    } else {
        Plausibility::Strict
    };
    writeln!(out, "{}", verify_report(candidate, mode))?;
    Ok(())
}

fn cmd_cpuinfo<W: Write>(cli: &Cli, out: &mut W) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    let source = PlatformSource::from_config(&config);
    writeln!(out, "{}", probe_cpu_serial(&source))?;
    Ok(())
}
