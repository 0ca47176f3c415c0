//! DSP Engine — sample-clocked additive synthesis.
//!
//! Every node is plain owned state moved forward by `advance(dt)` and read
//! without mutation, so rendering is deterministic and sample-exact.

pub mod engine;
pub mod envelope;
pub mod harmonics;
pub mod interpolation;
pub mod mixer;
pub mod oscillator;
pub mod renderer;
pub mod varying;
pub mod voice;
