pub mod actions;
pub mod controllers;
pub mod episode;
pub mod geometry;
pub mod learning;
pub mod policy;
pub mod recorder;
pub mod rewards;
pub mod state;
pub mod transport;

pub use actions::*;
pub use episode::*;
pub use learning::*;
pub use policy::*;
pub use rewards::*;
pub use state::*;
pub use transport::*;
