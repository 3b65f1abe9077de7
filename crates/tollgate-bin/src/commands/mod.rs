// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.

mod run;
mod secrets;
mod validate;
mod version;

pub use run::run;
pub use secrets::{encode_secret, gen_secret, hash_password};
pub use validate::{collect_warnings, validate};
pub use version::version;

use crate::cli::{Cli, Commands};
use crate::error::BinResult;

/// Executes the appropriate command based on CLI arguments.
pub async fn execute(cli: Cli) -> BinResult<()> {
    match cli.effective_command() {
        Commands::Run(args) => run::run(&cli, args).await,
        Commands::Validate(args) => validate::validate(&cli, args),
        Commands::Version => version::version(&cli),
        Commands::GenSecret(args) => secrets::gen_secret(&cli, args),
        Commands::HashPassword(args) => secrets::hash_password(&cli, args),
    }
}
