pub mod config;
pub mod device;
pub mod error;
pub mod lock;
pub mod media;
pub mod profile;
pub mod state;
