pub mod cancel;
pub mod compression;
pub mod duration;
pub mod frame_scaler;
pub mod pipeline;
pub mod thumbnail;
pub mod validation;
