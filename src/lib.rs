//! Storyboard generator - turns a short story into an illustrated, narrated storyboard
//!
//! A single structure request produces four scenes of three clips each
//! (narration plus an image prompt). Every clip then gets a generated image
//! and synthesized speech, requested together and attached in order.

pub mod ai;
pub mod app;
pub mod audio;
pub mod error;
pub mod export;
pub mod image;
pub mod models;
pub mod pipeline;
pub mod prompts;

pub use error::{Error, Result};
