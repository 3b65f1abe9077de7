// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tollgate-bin
//!
//! CLI binary for the tollgate authentication service.
//!
//! - CLI argument parsing with clap
//! - Server runtime with graceful shutdown
//! - Logging initialization
//! - Command implementations (run, validate, version, gen-secret, hash-password)
//!
//! ## Usage
//!
//! ```bash
//! # Start the server (default command)
//! tollgate -c /etc/tollgate/config.yaml
//!
//! # Validate configuration
//! tollgate validate -c config.yaml --strict
//!
//! # Generate a signing secret
//! tollgate gen-secret
//!
//! # Hash a password for a seed user
//! tollgate hash-password --stdin < password.txt
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;

// =============================================================================
// Re-exports
// =============================================================================

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::{RuntimeBuilder, ServiceRuntime};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
