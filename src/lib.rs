//! Library surface for the binary in `main.rs` and for the integration
//! tests under `tests/`. Kept as a thin set of `pub mod` re-exports; the
//! orchestration logic itself lives in the binary crate.

pub mod audio;
pub mod calibration;
pub mod charset;
pub mod color;
pub mod diff;
pub mod error;
pub mod frame;
pub mod logging;
pub mod pipeline;
pub mod render;
