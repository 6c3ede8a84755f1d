pub mod ansi;
pub mod screen_color;
pub mod screen_mono;
