//! Common error types for regpoll.
//!
//! This module provides a centralized Error enum using thiserror, covering
//! everything that can stop the daemon from starting.

use thiserror::Error;

use crate::context::InitError;
use crate::hw_trait::I2cError;

/// Main error type for regpoll operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Bus controller could not be opened
    #[error("I2C error: {0}")]
    I2c(#[from] I2cError),

    /// Bus or device setup failed
    #[error(transparent)]
    Init(#[from] InitError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for Results using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
