/* This file is part of dbft-core
 *
 * Copyright (C) 2024-2026 dbft-core Contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Daemon-level errors: configuration and database setup failures that
//! the library's own [`dbft_core::Error`] doesn't model, since those are
//! specific to how `bin/dbftd` wires things together (§6 exit codes: 0 on
//! clean shutdown, non-zero on config or database open failure).

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("failed reading config file {path}: {source}")]
    ConfigRead { path: String, source: std::io::Error },

    #[error("failed parsing config file {path}: {source}")]
    ConfigParse { path: String, source: toml::de::Error },

    #[error("node core error: {0}")]
    Core(#[from] dbft_core::Error),
}

impl DaemonError {
    /// Process exit code for this failure (§6).
    pub fn exit_code(&self) -> i32 {
        match self {
            DaemonError::ConfigRead { .. } | DaemonError::ConfigParse { .. } => 1,
            DaemonError::Core(_) => 2,
        }
    }
}
