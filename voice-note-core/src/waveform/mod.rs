pub mod reducer;
pub mod render;
pub mod scrub;
