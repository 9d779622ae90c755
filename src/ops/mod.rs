pub mod build;
pub mod chain;
pub mod reschedule;
pub mod session;
pub mod weather;
