//! Aspectra is a deterministic generative-art loop engine.
//!
//! A text seed and six named aspect values in [0,1] map to one reproducible
//! image; saved aspect-sets ("landmarks") become control points of a
//! seamlessly looping animation that can be pre-rendered and exported as a
//! video or a lossless frame sequence.
//!
//! - Seed a [`rng::RngStream`] hierarchy and render a still with
//!   [`render_still`]
//! - Interpolate landmarks over loop time with [`interp::evaluate`]
//! - Pre-render a loop with [`pre_render`] into a [`FrameBuffer`]
//! - Export with [`encode`] (negotiated video codec or PNG sequence)
#![forbid(unsafe_code)]

pub mod blur;
pub mod core;
pub mod encode;
pub mod error;
pub mod interp;
pub mod manifest;
pub mod params;
pub mod pipeline;
pub mod render;
pub mod rng;
pub mod surface;

pub use blur::MotionBlur;
pub use crate::core::{AspectSet, Canvas, Landmark};
pub use encode::{CodecCandidate, EncodeOpts, ExportPayload, ExportResult, encode};
pub use error::{AspectraError, AspectraResult};
pub use interp::DEFAULT_TIME_WARP;
pub use manifest::{AnimationManifest, MotionBlurManifest, StillManifest};
pub use params::DerivedParams;
pub use pipeline::{FrameBuffer, LoopOpts, PreRender, pre_render};
pub use render::{RenderTuning, generate_title, render_still};
pub use surface::Frame;
