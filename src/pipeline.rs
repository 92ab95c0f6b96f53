//! Frame buffer pipeline.
//!
//! `pre_render` orchestrates one animation session: pre-roll warm-up, then
//! per frame interpolate → render → accumulate blur → capture, with
//! progress reporting, periodic yields to the host scheduler, and a
//! cooperative cancellation check at every frame boundary. Frames are
//! produced and captured in strictly increasing index order because each
//! frame mutates the shared motion-blur buffer.

use tracing::debug;

use crate::blur::MotionBlur;
use crate::core::{Canvas, Landmark};
use crate::error::{AspectraError, AspectraResult};
use crate::interp;
use crate::render::{self, RenderTuning};
use crate::surface::Frame;

/// Progress sink: `(frames_done, frames_total)`.
pub type ProgressFn<'a> = &'a mut dyn FnMut(usize, usize);
/// Cancellation predicate, polled once per frame boundary.
pub type CancelFn<'a> = &'a mut dyn FnMut() -> bool;
/// Host-scheduler yield point, invoked between frames for responsiveness.
pub type YieldFn<'a> = &'a mut dyn FnMut();

/// Options for one loop render session.
#[derive(Clone, Debug)]
pub struct LoopOpts {
    pub canvas: Canvas,
    pub fps: u32,
    pub duration_ms: u32,
    /// Warm-up samples rendered immediately before t=0 and not captured, so
    /// the exported loop already carries trail history at frame 0. The
    /// default of 12 is an empirical tuning value, not a protocol constant.
    pub pre_roll_frames: u32,
    pub time_warp_strength: f64,
    /// Yield to the host scheduler every N captured frames.
    pub yield_every: u32,
    pub tuning: RenderTuning,
}

impl LoopOpts {
    pub fn new(canvas: Canvas, fps: u32, duration_ms: u32) -> Self {
        Self {
            canvas,
            fps,
            duration_ms,
            pre_roll_frames: 12,
            time_warp_strength: interp::DEFAULT_TIME_WARP,
            yield_every: 4,
            tuning: RenderTuning::default(),
        }
    }

    pub fn validate(&self) -> AspectraResult<()> {
        self.canvas.validate()?;
        if self.fps == 0 {
            return Err(AspectraError::validation("loop fps must be non-zero"));
        }
        if self.duration_ms == 0 {
            return Err(AspectraError::validation(
                "loop duration_ms must be non-zero",
            ));
        }
        Ok(())
    }

    pub fn total_frames(&self) -> usize {
        let exact = f64::from(self.duration_ms) / 1000.0 * f64::from(self.fps);
        (exact.round() as usize).max(1)
    }
}

/// A pre-rendered, captured frame sequence for one loop.
///
/// Frames are a scarce resource owned by the caller; [`FrameBuffer::release`]
/// drops every captured image. A buffer must be released and re-rendered
/// whenever landmarks, duration, or seed change.
#[derive(Debug)]
pub struct FrameBuffer {
    frames: Vec<Frame>,
    pub fps: u32,
    pub duration_ms: u32,
    pub seed: String,
}

impl FrameBuffer {
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn total_frames(&self) -> usize {
        self.frames.len()
    }

    /// Explicitly drop every captured frame image.
    pub fn release(&mut self) {
        self.frames.clear();
        self.frames.shrink_to_fit();
    }
}

/// Outcome of a pre-render: cancellation is a first-class result, distinct
/// from both success and failure.
#[derive(Debug)]
pub enum PreRender {
    Completed(FrameBuffer),
    Cancelled,
}

/// Pre-render a full loop into a [`FrameBuffer`].
///
/// The accumulator is cleared at session start; exactly one session may
/// drive a given accumulator at a time. On cancellation every frame
/// captured so far is released and `Cancelled` is returned, never a
/// partial buffer.
pub fn pre_render(
    landmarks: &[Landmark],
    seed: &str,
    opts: &LoopOpts,
    blur: &mut MotionBlur,
    progress: ProgressFn<'_>,
    cancelled: CancelFn<'_>,
    yield_hook: YieldFn<'_>,
) -> AspectraResult<PreRender> {
    opts.validate()?;
    if landmarks.len() < 2 {
        return Err(AspectraError::validation(format!(
            "pre-render requires at least 2 landmarks, got {}",
            landmarks.len()
        )));
    }

    let total = opts.total_frames();
    debug!(total, fps = opts.fps, "starting loop pre-render");

    // Fresh trail for this session.
    blur.clear();

    // Pre-roll: negative-time samples wrap onto the loop tail, driven
    // through the renderer and accumulator but never captured.
    for i in (1..=opts.pre_roll_frames).rev() {
        let t = -(f64::from(i) / total as f64);
        let aspects = interp::evaluate(t, landmarks, opts.time_warp_strength)?;
        let frame = render::render_still(seed, &aspects, opts.canvas, &opts.tuning)?;
        blur.apply(&frame)?;
    }

    let mut captured: Vec<Frame> = Vec::with_capacity(total);
    for f in 0..total {
        if cancelled() {
            debug!(frames_done = f, "pre-render cancelled, releasing frames");
            drop(captured);
            return Ok(PreRender::Cancelled);
        }

        let t = f as f64 / total as f64;
        let aspects = interp::evaluate(t, landmarks, opts.time_warp_strength)?;
        let frame = render::render_still(seed, &aspects, opts.canvas, &opts.tuning)?;
        let composited = blur.apply(&frame)?;
        captured.push(composited);

        progress(f + 1, total);
        if opts.yield_every > 0 && (f as u32 + 1).is_multiple_of(opts.yield_every) {
            yield_hook();
        }
    }

    debug!(total, "loop pre-render complete");
    Ok(PreRender::Completed(FrameBuffer {
        frames: captured,
        fps: opts.fps,
        duration_ms: opts.duration_ms,
        seed: seed.to_string(),
    }))
}
