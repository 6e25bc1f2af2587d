// Coordinated inauthentic behavior detection over a batch of posts.
//
// This is the library root. `engine::run` is the single entry point: it
// builds the read-only indexes, runs the ten indicator detectors in their
// fixed order, and aggregates the evidence into a `Report`.

pub mod embedding;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod model;
pub mod progress;
pub mod scoring;
pub mod stats;
pub mod temporal;

pub use engine::run;
pub use error::{EngineError, Result};
pub use model::{Params, Post, RawPost, Report};
