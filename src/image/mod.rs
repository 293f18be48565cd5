//! Image normalization for storyboard clips
//!
//! Generated images are exposed as PNG data URLs. Payloads in any other
//! format are re-encoded to PNG before they are attached to a clip.

pub mod processor;

pub use processor::{decode_data_url, to_png_data_url};
