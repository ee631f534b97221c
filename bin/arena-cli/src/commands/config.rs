// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `arena config` command: print the effective configuration.

use ring_arena::ArenaConfig;

pub fn execute(config: &ArenaConfig) -> anyhow::Result<()> {
    let (capacity, budget) = config.validate()?;
    println!("# capacity {capacity}, budget {budget}");
    print!("{}", config.to_toml()?);
    Ok(())
}
