//! Manifest records handed to the external packager.
//!
//! Field names are part of the packaging contract and serialize exactly as
//! written here.

use crate::core::{AspectSet, Canvas, Landmark};
use crate::pipeline::LoopOpts;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct MotionBlurManifest {
    pub enabled: bool,
    pub decay: f64,
    pub add: f64,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct AnimationManifest {
    pub kind: String,
    pub fps: u32,
    pub duration_ms: u32,
    pub total_frames: usize,
    pub time_warp_strength: f64,
    pub motion_blur: MotionBlurManifest,
    pub landmarks: Vec<String>,
}

impl AnimationManifest {
    pub fn new(opts: &LoopOpts, motion_blur: MotionBlurManifest, landmarks: &[Landmark]) -> Self {
        Self {
            kind: "animation".to_string(),
            fps: opts.fps,
            duration_ms: opts.duration_ms,
            total_frames: opts.total_frames(),
            time_warp_strength: opts.time_warp_strength,
            motion_blur,
            landmarks: landmarks.iter().map(|l| l.name.clone()).collect(),
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CanvasManifest {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct StillManifest {
    pub kind: String,
    pub seed: String,
    pub aspects: AspectSet,
    pub title: String,
    /// Unix epoch seconds.
    pub generated_at: u64,
    pub canvas: CanvasManifest,
}

impl StillManifest {
    pub fn new(seed: &str, aspects: AspectSet, title: &str, canvas: Canvas) -> Self {
        let generated_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            kind: "still".to_string(),
            seed: seed.to_string(),
            aspects,
            title: title.to_string(),
            generated_at,
            canvas: CanvasManifest {
                width: canvas.width,
                height: canvas.height,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn animation_manifest_field_names_are_exact() {
        let canvas = Canvas {
            width: 64,
            height: 64,
        };
        let opts = LoopOpts::new(canvas, 30, 2000);
        let landmarks = vec![
            Landmark {
                name: "dawn".to_string(),
                seed: "s".to_string(),
                aspects: AspectSet::default(),
                note: None,
            },
            Landmark {
                name: "dusk".to_string(),
                seed: "s".to_string(),
                aspects: AspectSet::default(),
                note: None,
            },
        ];
        let m = AnimationManifest::new(
            &opts,
            MotionBlurManifest {
                enabled: true,
                decay: 0.12,
                add: 0.55,
            },
            &landmarks,
        );
        let v: serde_json::Value = serde_json::to_value(&m).unwrap();
        assert_eq!(v["kind"], "animation");
        assert_eq!(v["fps"], 30);
        assert_eq!(v["duration_ms"], 2000);
        assert_eq!(v["total_frames"], 60);
        assert!(v["time_warp_strength"].is_f64());
        assert_eq!(v["motion_blur"]["enabled"], true);
        assert_eq!(v["motion_blur"]["decay"], 0.12);
        assert_eq!(v["motion_blur"]["add"], 0.55);
        assert_eq!(v["landmarks"][0], "dawn");
        assert_eq!(v["landmarks"][1], "dusk");
    }

    #[test]
    fn still_manifest_field_names_are_exact() {
        let m = StillManifest::new(
            "emberline",
            AspectSet::default(),
            "Vesper Lattice",
            Canvas {
                width: 640,
                height: 480,
            },
        );
        let v: serde_json::Value = serde_json::to_value(&m).unwrap();
        assert_eq!(v["kind"], "still");
        assert_eq!(v["seed"], "emberline");
        assert_eq!(v["title"], "Vesper Lattice");
        assert!(v["generated_at"].is_u64());
        assert_eq!(v["canvas"]["width"], 640);
        assert_eq!(v["canvas"]["height"], 480);
        assert!(v["aspects"]["coherence"].is_f64());
    }
}
