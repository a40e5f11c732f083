pub mod capture_provider;
pub mod engine;
pub mod output_provider;
pub mod session_observer;
