// main.rs Copyright 2018 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use log::error;

use kaprekar_engine::{driver, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    cli.validate()?;

    if let Err(err) = driver::run(&cli) {
        error!("{}", err);
        return Err(err.into());
    }

    Ok(())
}
