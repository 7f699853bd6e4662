//! regpoll: initialize an I2C bus, attach one register-mapped peripheral and
//! poll its registers forever, logging every access.

pub mod config;
pub mod context;
pub mod error;
pub mod hw_trait;
pub mod peripheral;
pub mod poll;
pub mod tracing;
pub mod transport;
