pub mod capability_provider;
pub mod capture_delegate;
pub mod encoder_pipeline;
