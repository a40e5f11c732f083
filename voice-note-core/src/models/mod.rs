pub mod config;
pub mod error;
pub mod levels;
pub mod state;
pub mod voice_note;
