pub mod audio_session;
pub mod driver;
pub mod level_sampler;
