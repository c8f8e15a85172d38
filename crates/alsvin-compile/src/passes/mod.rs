//! Built-in compilation passes.

pub mod routing;

pub use routing::{SabreConfig, SabreRouting};
