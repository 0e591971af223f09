pub mod config;
pub mod error;
pub mod handles;
pub mod recording_result;
pub mod state;
