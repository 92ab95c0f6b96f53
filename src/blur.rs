//! Motion blur accumulator.
//!
//! A stateful premultiplied RGBA8 buffer shared by every render in one
//! animation session. Each `apply` decays the buffer, composites the fresh
//! frame over it at `add` opacity, and returns the buffer contents as the
//! visible output. Decay alone governs trail length; add alone governs
//! per-frame contribution. Exactly one live session may drive an
//! accumulator at a time.

use crate::core::Canvas;
use crate::error::{AspectraError, AspectraResult};
use crate::surface::Frame;

#[derive(Debug)]
pub struct MotionBlur {
    width: u32,
    height: u32,
    decay: f64,
    add: f64,
    enabled: bool,
    buffer: Vec<u8>,
}

impl MotionBlur {
    /// `decay` and `add` must lie in (0,1); with source-over accumulation
    /// the buffer opacity then stays bounded below 1 for transparent input
    /// and saturates at 1 for opaque input, never above.
    pub fn new(canvas: Canvas, decay: f64, add: f64) -> AspectraResult<Self> {
        canvas.validate()?;
        if !(0.0..1.0).contains(&decay) || decay == 0.0 {
            return Err(AspectraError::validation(
                "motion blur decay must be in (0,1)",
            ));
        }
        if !(0.0..1.0).contains(&add) || add == 0.0 {
            return Err(AspectraError::validation(
                "motion blur add strength must be in (0,1)",
            ));
        }
        Ok(Self {
            width: canvas.width,
            height: canvas.height,
            decay,
            add,
            enabled: true,
            buffer: vec![0u8; canvas.pixel_bytes()],
        })
    }

    pub fn decay(&self) -> f64 {
        self.decay
    }

    pub fn add_strength(&self) -> f64 {
        self.add
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Reset the accumulation buffer to fully transparent.
    pub fn clear(&mut self) {
        self.buffer.fill(0);
    }

    /// Disabling clears immediately so toggling off never leaves a stale
    /// trail; while disabled `apply` passes frames through untouched.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.clear();
        }
        self.enabled = enabled;
    }

    /// Blend `frame` into the trail and return the composited output.
    pub fn apply(&mut self, frame: &Frame) -> AspectraResult<Frame> {
        if frame.width != self.width || frame.height != self.height {
            return Err(AspectraError::validation(format!(
                "motion blur frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }
        if !self.enabled {
            return Ok(frame.clone());
        }
        if frame.data.len() != self.buffer.len() {
            return Err(AspectraError::validation(
                "motion blur frame buffer length mismatch",
            ));
        }

        // Uniform scale keeps the buffer premultiplied. Truncation (not
        // rounding) guarantees every nonzero byte strictly decreases, so the
        // trail always reaches zero.
        let keep = 1.0 - self.decay;
        for b in &mut self.buffer {
            *b = (f64::from(*b) * keep) as u8;
        }

        // Source-over at `add` opacity: out = s*add + d*(1 - sa*add).
        for (d, s) in self
            .buffer
            .chunks_exact_mut(4)
            .zip(frame.data.chunks_exact(4))
        {
            let sa = (f64::from(s[3]) / 255.0) * self.add;
            let inv = 1.0 - sa;
            for c in 0..4 {
                let sv = f64::from(s[c]) / 255.0 * self.add;
                let dv = f64::from(d[c]) / 255.0;
                d[c] = ((sv + dv * inv) * 255.0 + 0.5).min(255.0) as u8;
            }
        }

        Ok(Frame {
            width: self.width,
            height: self.height,
            data: self.buffer.clone(),
        })
    }
}
