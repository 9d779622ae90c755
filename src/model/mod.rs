pub mod config;
pub mod forecast;
pub mod group;
pub mod record;
pub mod task;

pub use config::*;
pub use forecast::*;
pub use group::*;
pub use record::*;
pub use task::*;
