// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! tyscale command-line front end.
//!
//! # Quick Start
//!
//! ```bash
//! # Show the registry built from a type file
//! tyscale parse --types chain.tys
//!
//! # Encode a JSON value
//! tyscale encode --types chain.tys --type Account --value '{"nonce": 1, "owner": "ann"}'
//!
//! # Decode hex back to JSON
//! tyscale decode --types chain.tys --type Account --hex 0x040c616e6e
//!
//! # Using a configuration file
//! tyscale --config tyscale.toml encode --type 0 --value 7
//! ```
//!
//! # Configuration File
//!
//! ```toml
//! types = ["types/chain.tys"]
//! output = "hex"
//! log_level = "warn"
//! ```

pub mod commands;
pub mod config;

pub use config::{CliConfig, ConfigError, OutputFormat};
