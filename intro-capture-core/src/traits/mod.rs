pub mod capture_backend;
pub mod capture_delegate;
pub mod clock;
pub mod duration_estimator;
pub mod media_codec;
pub mod persistence;
