// error.rs Copyright 2018 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Errors surfaced by the engine's public API and CLI entry point.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("worker fault while processing base {base} digits {digits}: {detail}")]
    WorkerFault {
        base: u64,
        digits: u64,
        detail: String,
    },

    #[error("output I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
