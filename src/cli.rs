// cli.rs Copyright 2018 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use clap::Parser;

use crate::error::{EngineError, EngineResult};

/// Generate Kaprekar summary data with smart parallelization.
#[derive(Parser, Debug, Clone)]
#[command(name = "kaprekar-engine", version, about)]
pub struct Cli {
    /// Minimum base (inclusive)
    #[arg(long, default_value_t = 2)]
    pub min_base: u64,

    /// Maximum base (inclusive)
    #[arg(long)]
    pub max_base: u64,

    /// Minimum digit count (inclusive)
    #[arg(long, default_value_t = 2)]
    pub min_digits: u64,

    /// Maximum digit count (inclusive)
    #[arg(long)]
    pub max_digits: u64,

    /// Number of worker threads for parallel (b, d) pairs
    #[arg(long, default_value_t = 1)]
    pub cpu_cores: usize,

    /// Output directory; CSVs are written under <data-dir>/csv/
    #[arg(long, default_value = ".")]
    pub data_dir: PathBuf,

    /// Digit-count threshold; advisory only, does not affect results
    #[arg(long, default_value_t = 13)]
    pub digit_threshold: u64,

    /// Emit diagnostic log lines (raises log level to debug)
    #[arg(long)]
    pub verbose: bool,

    /// Use the token-passing shared-memo path instead of the direct-write path
    #[arg(long)]
    pub high_mem: bool,
}

impl Cli {
    /// Validates the numeric ranges that `clap` cannot express declaratively.
    pub fn validate(&self) -> EngineResult<()> {
        if self.min_base < 2 {
            return Err(EngineError::InvalidArgument {
                message: format!("--min-base must be >= 2, got {}", self.min_base),
            });
        }
        if self.max_base < self.min_base {
            return Err(EngineError::InvalidArgument {
                message: format!(
                    "--max-base ({}) must be >= --min-base ({})",
                    self.max_base, self.min_base
                ),
            });
        }
        if self.min_digits < 2 {
            return Err(EngineError::InvalidArgument {
                message: format!("--min-digits must be >= 2, got {}", self.min_digits),
            });
        }
        if self.max_digits < self.min_digits {
            return Err(EngineError::InvalidArgument {
                message: format!(
                    "--max-digits ({}) must be >= --min-digits ({})",
                    self.max_digits, self.min_digits
                ),
            });
        }
        if self.cpu_cores == 0 {
            return Err(EngineError::InvalidArgument {
                message: "--cpu-cores must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}
