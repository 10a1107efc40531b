pub mod config;
pub mod constants;
pub mod types;
pub mod wire;

pub use config::*;
pub use constants::*;
pub use types::*;
pub use wire::*;
