pub mod controller;
pub mod preview;
pub mod recording;
pub mod stream_manager;
