// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `version` command.

use crate::cli::Cli;
use crate::error::BinResult;

/// Prints version and build information.
pub fn version(_cli: &Cli) -> BinResult<()> {
    println!("tollgate - stateless session tokens and role-based access control");
    println!();
    println!("Version Information:");
    println!("  tollgate-bin: {}", crate::VERSION);
    println!("  tollgate-api: {}", tollgate_api::VERSION);
    println!();
    println!("Build Information:");
    println!("  Target:       {}", std::env::consts::ARCH);
    println!("  OS:           {}", std::env::consts::OS);
    println!("  Token format: base64(claims).base64(HMAC-SHA256)");
    println!();
    println!("License: PolyForm Noncommercial License 1.0.0");
    println!("Copyright (c) 2025 Sylvex. All rights reserved.");

    Ok(())
}
