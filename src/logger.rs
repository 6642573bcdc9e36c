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

//! Logging setup
//!
//! Log lines go to stderr so command output on stdout stays machine readable.
//! The filter comes from `HWID_LOG` and defaults to warnings only.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive
pub const LOG_ENV: &str = "HWID_LOG";

const DEFAULT_LEVEL: &str = "warn";
const VERBOSE_LEVEL: &str = "debug";

/// Filter built from `HWID_LOG`, falling back to `warn` or `debug`
pub fn build_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose { VERBOSE_LEVEL } else { DEFAULT_LEVEL };
    match std::env::var(LOG_ENV) {
        Ok(directive) if !directive.trim().is_empty() => {
            EnvFilter::try_new(&directive).unwrap_or_else(|e| {
                eprintln!("Ignoring invalid {}: {}", LOG_ENV, e);
                EnvFilter::new(fallback)
            })
        }
        _ => EnvFilter::new(fallback),
    }
}

/// Install the global subscriber; later calls are no-ops
pub fn init_logging(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_env_filter(build_filter(verbose))
        .try_init();
}
