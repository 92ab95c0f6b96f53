//! Loop interpolation over landmark aspect-sets.
//!
//! The evaluator is a pure function of normalized loop time and the landmark
//! list. Two landmarks produce an A→B→A oscillation with zero slope at both
//! turning points; three or more become control points of a closed
//! Catmull-Rom spline with wrap-around indices, so the loop closes with
//! value- and slope-continuity at the t=0/t=1 seam.

use std::f64::consts::PI;

use crate::core::{ASPECT_COUNT, AspectSet, Landmark};
use crate::error::{AspectraError, AspectraResult};

/// Default time-warp strength. Empirically chosen tuning value, exposed as a
/// parameter rather than a hard invariant.
pub const DEFAULT_TIME_WARP: f64 = 0.65;

/// Fraction of the full warp strength applied in the two-landmark
/// oscillation path.
const TWO_LANDMARK_WARP_SCALE: f64 = 0.55;

/// `t³(t(6t−15)+10)`, pinned exactly at 0 and 1.
pub fn smootherstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * t * (t * (6.0 * t - 15.0) + 10.0)
}

/// Blend a raw linear fraction toward [`smootherstep`] by `strength`.
///
/// The warp causes the path to linger near each landmark and accelerate
/// through segment midpoints while staying pinned at t=0 and t=1, which
/// keeps loop closure exact to machine precision.
pub fn time_warp(t: f64, strength: f64) -> f64 {
    t + (smootherstep(t) - t) * strength.clamp(0.0, 1.0)
}

/// Evaluate the aspect-set at normalized loop time `t`.
///
/// `t` is taken mod 1, so negative pre-roll times wrap onto the tail of the
/// loop. Fewer than two landmarks is a configuration error, reported
/// synchronously.
pub fn evaluate(
    t: f64,
    landmarks: &[Landmark],
    warp_strength: f64,
) -> AspectraResult<AspectSet> {
    if landmarks.len() < 2 {
        return Err(AspectraError::validation(format!(
            "loop interpolation requires at least 2 landmarks, got {}",
            landmarks.len()
        )));
    }
    let t = t.rem_euclid(1.0);

    if landmarks.len() == 2 {
        return Ok(eval_oscillation(
            t,
            landmarks[0].aspects,
            landmarks[1].aspects,
            warp_strength,
        ));
    }
    Ok(eval_closed_spline(t, landmarks, warp_strength))
}

fn eval_oscillation(t: f64, a: AspectSet, b: AspectSet, warp_strength: f64) -> AspectSet {
    // Triangular fold: rising for t<0.5, falling for t>=0.5. The cosine
    // ease gives zero slope at both turning points.
    let tri = if t < 0.5 { t * 2.0 } else { 2.0 - t * 2.0 };
    let warped = time_warp(tri, warp_strength * TWO_LANDMARK_WARP_SCALE);
    let u = 0.5 - 0.5 * (PI * warped).cos();
    a.lerp(b, u)
}

fn eval_closed_spline(t: f64, landmarks: &[Landmark], warp_strength: f64) -> AspectSet {
    let n = landmarks.len();
    let x = t * n as f64;
    let seg = (x.floor() as usize) % n;
    let frac = x - x.floor();
    let u = time_warp(frac, warp_strength);

    let at = |offset: isize| -> [f64; ASPECT_COUNT] {
        let i = (seg as isize + offset).rem_euclid(n as isize) as usize;
        landmarks[i].aspects.to_array()
    };
    let p0 = at(-1);
    let p1 = at(0);
    let p2 = at(1);
    let p3 = at(2);

    let mut out = [0.0; ASPECT_COUNT];
    for i in 0..ASPECT_COUNT {
        // Catmull-Rom can overshoot near aspect extremes; clamp after
        // evaluation since it is not range-preserving.
        out[i] = catmull_rom(p0[i], p1[i], p2[i], p3[i], u).clamp(0.0, 1.0);
    }
    AspectSet::from_array(out)
}

fn catmull_rom(p0: f64, p1: f64, p2: f64, p3: f64, u: f64) -> f64 {
    let u2 = u * u;
    let u3 = u2 * u;
    0.5 * ((2.0 * p1)
        + (-p0 + p2) * u
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * u2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * u3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lm(name: &str, v: f64) -> Landmark {
        Landmark {
            name: name.to_string(),
            seed: "test".to_string(),
            aspects: AspectSet::clamped(v, 1.0 - v, v * 0.5, v, 0.5, 1.0 - v * 0.5),
            note: None,
        }
    }

    #[test]
    fn rejects_fewer_than_two_landmarks() {
        assert!(evaluate(0.0, &[], DEFAULT_TIME_WARP).is_err());
        assert!(evaluate(0.0, &[lm("a", 0.2)], DEFAULT_TIME_WARP).is_err());
    }

    #[test]
    fn two_landmarks_hit_endpoints() {
        let a = lm("a", 0.9);
        let b = lm("b", 0.1);
        let marks = vec![a.clone(), b.clone()];

        let at0 = evaluate(0.0, &marks, DEFAULT_TIME_WARP).unwrap();
        assert_eq!(at0, a.aspects);

        let at_half = evaluate(0.5, &marks, DEFAULT_TIME_WARP).unwrap();
        let d = (at_half.coherence - b.aspects.coherence).abs();
        assert!(d < 1e-12);

        // Just before wrap the value approaches A again.
        let near_wrap = evaluate(0.999_999, &marks, DEFAULT_TIME_WARP).unwrap();
        assert!((near_wrap.coherence - a.aspects.coherence).abs() < 1e-3);
    }

    #[test]
    fn two_landmarks_have_zero_slope_at_turning_points() {
        let marks = vec![lm("a", 0.9), lm("b", 0.1)];
        let eps = 1e-6;
        for t0 in [0.0, 0.5] {
            let v0 = evaluate(t0 + eps, &marks, DEFAULT_TIME_WARP)
                .unwrap()
                .coherence;
            let v1 = evaluate((t0 - eps).rem_euclid(1.0), &marks, DEFAULT_TIME_WARP)
                .unwrap()
                .coherence;
            let slope = (v0 - v1) / (2.0 * eps);
            assert!(slope.abs() < 1e-3, "slope at t={t0} was {slope}");
        }
    }

    #[test]
    fn spline_reproduces_landmarks_at_segment_boundaries() {
        let marks = vec![lm("a", 0.9), lm("b", 0.2), lm("c", 0.6), lm("d", 0.4)];
        let n = marks.len();
        for (i, mark) in marks.iter().enumerate() {
            let t = i as f64 / n as f64;
            let got = evaluate(t, &marks, DEFAULT_TIME_WARP).unwrap();
            let want = mark.aspects.to_array();
            for (g, w) in got.to_array().iter().zip(want.iter()) {
                assert!((g - w).abs() < 1e-12, "landmark {i} not reproduced");
            }
        }
    }

    #[test]
    fn spline_seam_is_value_and_slope_continuous() {
        let marks = vec![lm("a", 0.8), lm("b", 0.1), lm("c", 0.65)];
        let eps = 1e-7;

        let left = evaluate(1.0 - eps, &marks, DEFAULT_TIME_WARP).unwrap();
        let right = evaluate(eps, &marks, DEFAULT_TIME_WARP).unwrap();
        let at0 = evaluate(0.0, &marks, DEFAULT_TIME_WARP).unwrap();

        for i in 0..ASPECT_COUNT {
            assert!((left.to_array()[i] - at0.to_array()[i]).abs() < 1e-4);
            let slope_l = (at0.to_array()[i] - left.to_array()[i]) / eps;
            let slope_r = (right.to_array()[i] - at0.to_array()[i]) / eps;
            assert!(
                (slope_l - slope_r).abs() < 1e-2,
                "seam slope discontinuity in field {i}: {slope_l} vs {slope_r}"
            );
        }
    }

    #[test]
    fn spline_outputs_are_clamped() {
        // Construct landmarks that force Catmull-Rom overshoot past 1.
        let mut marks = vec![lm("a", 0.0), lm("b", 1.0), lm("c", 1.0), lm("d", 0.0)];
        marks[1].aspects.coherence = 1.0;
        marks[2].aspects.coherence = 1.0;
        for i in 0..200 {
            let t = f64::from(i) / 200.0;
            let v = evaluate(t, &marks, DEFAULT_TIME_WARP).unwrap();
            for field in v.to_array() {
                assert!((0.0..=1.0).contains(&field));
            }
        }
    }

    #[test]
    fn negative_time_wraps_onto_loop_tail() {
        let marks = vec![lm("a", 0.9), lm("b", 0.2), lm("c", 0.6)];
        let a = evaluate(-0.25, &marks, DEFAULT_TIME_WARP).unwrap();
        let b = evaluate(0.75, &marks, DEFAULT_TIME_WARP).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn warp_is_pinned_at_endpoints() {
        for s in [0.0, 0.3, 0.65, 1.0] {
            assert_eq!(time_warp(0.0, s), 0.0);
            assert_eq!(time_warp(1.0, s), 1.0);
        }
        // Mid-segment the warp lags the raw fraction below 0.5.
        assert!(time_warp(0.25, 1.0) < 0.25);
    }
}
