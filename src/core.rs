use crate::error::{AspectraError, AspectraResult};

pub use kurbo::{Point, Vec2};

/// Number of named aspect fields in an [`AspectSet`].
pub const ASPECT_COUNT: usize = 6;

/// The six named [0,1] values that describe one generated image.
///
/// An `AspectSet` is immutable once produced for a given frame: the UI owns
/// the set for a still, the loop interpolator owns it for an animation frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AspectSet {
    pub coherence: f64,
    pub tension: f64,
    pub recursion: f64,
    pub motion: f64,
    pub vulnerability: f64,
    pub radiance: f64,
}

impl AspectSet {
    /// Build a set with every field clamped into [0,1].
    pub fn clamped(
        coherence: f64,
        tension: f64,
        recursion: f64,
        motion: f64,
        vulnerability: f64,
        radiance: f64,
    ) -> Self {
        Self {
            coherence: coherence.clamp(0.0, 1.0),
            tension: tension.clamp(0.0, 1.0),
            recursion: recursion.clamp(0.0, 1.0),
            motion: motion.clamp(0.0, 1.0),
            vulnerability: vulnerability.clamp(0.0, 1.0),
            radiance: radiance.clamp(0.0, 1.0),
        }
    }

    /// Field order used everywhere fields are treated positionally
    /// (interpolation splines, tests).
    pub fn to_array(self) -> [f64; ASPECT_COUNT] {
        [
            self.coherence,
            self.tension,
            self.recursion,
            self.motion,
            self.vulnerability,
            self.radiance,
        ]
    }

    /// Inverse of [`AspectSet::to_array`].
    pub fn from_array(v: [f64; ASPECT_COUNT]) -> Self {
        Self {
            coherence: v[0],
            tension: v[1],
            recursion: v[2],
            motion: v[3],
            vulnerability: v[4],
            radiance: v[5],
        }
    }

    /// Linear blend between two sets, `u` in [0,1].
    pub fn lerp(self, other: Self, u: f64) -> Self {
        let a = self.to_array();
        let b = other.to_array();
        let mut out = [0.0; ASPECT_COUNT];
        for i in 0..ASPECT_COUNT {
            out[i] = a[i] + (b[i] - a[i]) * u;
        }
        Self::from_array(out)
    }
}

impl Default for AspectSet {
    fn default() -> Self {
        Self {
            coherence: 0.5,
            tension: 0.5,
            recursion: 0.5,
            motion: 0.5,
            vulnerability: 0.5,
            radiance: 0.5,
        }
    }
}

/// A saved, named aspect-set used as a spline control point for animation.
///
/// Landmarks come from external profile storage and are consumed read-only;
/// the core never mutates them. Ordering in a landmark list is significant.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Landmark {
    pub name: String,
    pub seed: String,
    pub aspects: AspectSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> AspectraResult<Self> {
        let c = Self { width, height };
        c.validate()?;
        Ok(c)
    }

    pub fn validate(self) -> AspectraResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(AspectraError::validation(
                "canvas width/height must be non-zero",
            ));
        }
        Ok(())
    }

    pub fn pixel_bytes(self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}
