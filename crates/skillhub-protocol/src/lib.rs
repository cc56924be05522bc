//! Wire types for the skillhub remote-procedure API.

pub mod frames;
pub mod methods;
