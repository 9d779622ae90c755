pub mod config_io;
pub mod record_io;
