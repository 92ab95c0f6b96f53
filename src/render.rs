//! Deterministic frame renderer.
//!
//! `render_still` is a pure function of (seed, aspects, canvas, tuning):
//! identical inputs produce pixel-identical output. Each visual phase draws
//! from its own child stream spawned off one base stream in a fixed order,
//! so a change in how many values one phase consumes cannot reshuffle the
//! randomness of any other phase.
//!
//! Fractional counts are rendered as `ceil(count)` elements with the last
//! element's opacity scaled by `frac(count)`; this is what keeps element
//! counts from popping while aspects sweep continuously.

use std::f64::consts::TAU;

use crate::core::{AspectSet, Canvas, Point};
use crate::error::AspectraResult;
use crate::params::{self, DerivedParams};
use crate::rng::RngStream;
use crate::surface::{Color, Frame, Pixmap};

/// Aesthetic tuning knobs with empirically chosen defaults. None of these
/// affect determinism; they scale the renderer's geometry.
#[derive(Clone, Copy, Debug)]
pub struct RenderTuning {
    /// Scale applied to node radii.
    pub node_radius_scale: f64,
    /// Ceiling on flow-field polylines at flow = 1.
    pub max_flow_lines: u32,
    /// Advection step length in pixels for flow-field polylines.
    pub flow_step_px: f64,
}

impl Default for RenderTuning {
    fn default() -> Self {
        Self {
            node_radius_scale: 1.0,
            max_flow_lines: 24,
            flow_step_px: 3.0,
        }
    }
}

/// Child streams for every visual phase, spawned in a fixed order from one
/// base stream.
struct PhaseStreams {
    params: RngStream,
    title: RngStream,
    glow: RngStream,
    nodes: RngStream,
    shards: RngStream,
    flow: RngStream,
    grain: RngStream,
}

impl PhaseStreams {
    fn from_seed(seed: &str) -> Self {
        let mut base = RngStream::from_seed_str(seed);
        // Spawn order is part of the determinism contract.
        Self {
            params: base.child(),
            title: base.child(),
            glow: base.child(),
            nodes: base.child(),
            shards: base.child(),
            flow: base.child(),
            grain: base.child(),
        }
    }
}

/// Render one frame. Pure and deterministic in all inputs.
pub fn render_still(
    seed: &str,
    aspects: &AspectSet,
    canvas: Canvas,
    tuning: &RenderTuning,
) -> AspectraResult<Frame> {
    canvas.validate()?;
    let mut streams = PhaseStreams::from_seed(seed);
    let p = params::derive(aspects, &mut streams.params);

    let mut pm = Pixmap::new(canvas)?;
    draw_background(&mut pm, &p);
    draw_glow(&mut pm, &p, &mut streams.glow);
    draw_nodes(&mut pm, &p, &mut streams.nodes, tuning);
    draw_shards(&mut pm, &p, &mut streams.shards);
    draw_flow_field(&mut pm, &p, &mut streams.flow, tuning);
    draw_grain(&mut pm, &p, &mut streams.grain);

    Ok(pm.to_frame())
}

/// Deterministic title for a seed: the title phase owns its own child
/// stream, so generating (or not generating) a title never perturbs pixels.
pub fn generate_title(seed: &str) -> String {
    let mut streams = PhaseStreams::from_seed(seed);
    let adjectives = [
        "Vesper", "Hollow", "Gilded", "Quiet", "Fervent", "Latent", "Umbral", "Tidal", "Keen",
        "Solar",
    ];
    let nouns = [
        "Lattice", "Meridian", "Refrain", "Caldera", "Tessera", "Aperture", "Drift", "Veil",
        "Chorus", "Prism",
    ];
    let a = (streams.title.next_f64() * adjectives.len() as f64) as usize;
    let n = (streams.title.next_f64() * nouns.len() as f64) as usize;
    format!(
        "{} {}",
        adjectives[a.min(adjectives.len() - 1)],
        nouns[n.min(nouns.len() - 1)]
    )
}

fn center(pm: &Pixmap) -> Point {
    Point::new(f64::from(pm.width()) / 2.0, f64::from(pm.height()) / 2.0)
}

fn min_dim(pm: &Pixmap) -> f64 {
    f64::from(pm.width().min(pm.height()))
}

fn draw_background(pm: &mut Pixmap, p: &DerivedParams) {
    let top = Color::from_hsl(
        p.hue + 14.0 * p.bleed,
        0.28 + 0.3 * p.bleed,
        0.08 + 0.22 * p.luminance,
        1.0,
    );
    let bottom = Color::from_hsl(
        p.hue - 22.0 * p.bleed,
        0.22 + 0.25 * p.bleed,
        0.03 + 0.12 * p.luminance,
        1.0,
    );
    pm.fill_vertical_gradient(top, bottom);
}

fn draw_glow(pm: &mut Pixmap, p: &DerivedParams, rng: &mut RngStream) {
    let c = center(pm);
    let dim = min_dim(pm);
    let (whole, frac) = params::split_count(2.0 + p.multi_axis * 3.0);
    let total = fractional_total(whole, frac);
    for i in 0..total {
        // Boundary disc fades in with the fractional count so sweeping
        // multi_axis across an integer never pops a disc.
        let alpha_scale = fractional_alpha(i, whole, frac);
        let angle = rng.next_f64() * TAU;
        let dist = rng.next_f64() * dim * 0.28;
        let radius = dim * (0.18 + 0.3 * rng.next_f64()) * (0.5 + 0.5 * p.luminance);
        let pos = Point::new(c.x + angle.cos() * dist, c.y + angle.sin() * dist);
        let color = Color::from_hsl(
            p.hue + rng.in_range(-30.0, 30.0),
            0.5,
            0.45 + 0.25 * p.luminance,
            (0.10 + 0.12 * p.luminance) * alpha_scale,
        );
        pm.soft_disc(pos, radius, color);
    }
}

/// Alpha multiplier for element `i` out of a fractional count: whole
/// elements get 1.0, the single boundary element gets `frac`.
fn fractional_alpha(i: u32, whole: u32, frac: f64) -> f64 {
    if i < whole { 1.0 } else { frac }
}

/// Total elements to draw for a fractional count: `ceil(whole + frac)`.
fn fractional_total(whole: u32, frac: f64) -> u32 {
    whole + u32::from(frac > 0.0)
}

fn draw_nodes(pm: &mut Pixmap, p: &DerivedParams, rng: &mut RngStream, tuning: &RenderTuning) {
    let c = center(pm);
    let dim = min_dim(pm);
    let axes = 1.0 + 5.0 * p.multi_axis;
    let (axes_whole, axes_frac) = params::split_count(axes);
    let total = fractional_total(p.node_count, p.node_count_frac);

    for i in 0..total {
        let alpha_scale = fractional_alpha(i, p.node_count, p.node_count_frac);

        // Per-node draws happen for the boundary node too, so the stream
        // position does not depend on the fractional remainder.
        let ring = rng.next_f64();
        let jitter = rng.in_range(-1.0, 1.0) * p.fracture;
        let base_angle = rng.next_f64() * TAU;
        let radius_draw = rng.next_f64();

        let orbit = dim * (0.12 + 0.32 * ring * p.density);
        let radius =
            tuning.node_radius_scale * dim * (0.012 + 0.03 * radius_draw * (1.0 - p.density));
        let color = Color::from_hsl(
            p.hue + 40.0 * ring - 20.0,
            0.55 + 0.25 * p.symmetry,
            0.55 + 0.3 * p.luminance,
            (0.5 + 0.4 * p.edge_sharpness) * alpha_scale,
        );

        // Symmetry replicates each node around the rotational axes. The
        // axis count is fractional: the boundary replica fades in with the
        // fractional part so sweeping multi_axis across an integer never
        // pops a whole replica ring, and replica spacing follows the
        // continuous count so positions glide rather than jump.
        for axis in 0..fractional_total(axes_whole, axes_frac) {
            let replica_scale = if axis == 0 { 1.0 } else { p.symmetry };
            let replica_alpha = replica_scale * fractional_alpha(axis, axes_whole, axes_frac);
            if replica_alpha <= 0.0 {
                continue;
            }
            let angle = base_angle + TAU * f64::from(axis) / axes + jitter * 0.4;
            let pos = Point::new(c.x + angle.cos() * orbit, c.y + angle.sin() * orbit);
            pm.soft_disc(pos, radius, color.with_alpha(color.a * replica_alpha));
        }
    }
}

fn draw_shards(pm: &mut Pixmap, p: &DerivedParams, rng: &mut RngStream) {
    let c = center(pm);
    let dim = min_dim(pm);
    let layer_total = fractional_total(p.shard_layers, p.shard_layers_frac);
    let shard_total = fractional_total(p.shards_per_layer, p.shards_per_layer_frac);

    for layer in 0..layer_total {
        // Each layer owns a child stream, so when the shard count crosses
        // an integer the extra shard's draws are appended to that layer's
        // stream instead of shifting every later layer's randomness.
        let mut layer_rng = rng.child();
        let layer_alpha = fractional_alpha(layer, p.shard_layers, p.shard_layers_frac);
        let inner = dim * (0.08 + 0.09 * f64::from(layer));
        let spread = dim * (0.1 + 0.16 * p.fracture);

        for shard in 0..shard_total {
            let shard_alpha = fractional_alpha(shard, p.shards_per_layer, p.shards_per_layer_frac);

            let angle = layer_rng.next_f64() * TAU;
            let skew = layer_rng.in_range(-0.5, 0.5) * p.fracture;
            let len_draw = layer_rng.next_f64();
            let hue_draw = layer_rng.in_range(-24.0, 24.0);

            let len = spread * (0.4 + 0.6 * len_draw);
            let a = Point::new(c.x + angle.cos() * inner, c.y + angle.sin() * inner);
            let out_angle = angle + skew;
            let b = Point::new(a.x + out_angle.cos() * len, a.y + out_angle.sin() * len);
            let width = 1.0 + 2.5 * (1.0 - p.edge_sharpness);
            let color = Color::from_hsl(
                p.hue + hue_draw,
                0.45 + 0.3 * p.fracture,
                0.5 + 0.25 * p.luminance,
                p.shard_alpha * layer_alpha * shard_alpha,
            );
            pm.stroke_segment(a, b, width, color);
        }
    }
}

fn draw_flow_field(pm: &mut Pixmap, p: &DerivedParams, rng: &mut RngStream, tuning: &RenderTuning) {
    let w = f64::from(pm.width());
    let h = f64::from(pm.height());
    let dim = min_dim(pm);
    let (lines_whole, lines_frac) =
        params::split_count(2.0 + p.flow * f64::from(tuning.max_flow_lines));
    let steps = (dim * 0.25 / tuning.flow_step_px).max(4.0) as u32;
    let field_scale = TAU * (1.5 + 2.0 * p.density) / dim;
    let phase = p.hue.to_radians();

    for line in 0..fractional_total(lines_whole, lines_frac) {
        // Fractional line count: the boundary polyline fades in instead of
        // popping when flow crosses an integer threshold.
        let alpha_scale = fractional_alpha(line, lines_whole, lines_frac);
        let mut pos = Point::new(rng.next_f64() * w, rng.next_f64() * h);
        let alpha = (0.04 + 0.10 * p.flow * rng.next_f64()) * alpha_scale;
        let color = Color::from_hsl(p.hue + 150.0 * p.bleed, 0.35, 0.6, alpha);

        for _ in 0..steps {
            // Sine-keyed advection field; fully deterministic in the derived
            // params.
            let angle = (pos.x * field_scale + phase).sin() * 2.1
                + (pos.y * field_scale - phase).cos() * 2.1;
            let next = Point::new(
                pos.x + angle.cos() * tuning.flow_step_px,
                pos.y + angle.sin() * tuning.flow_step_px,
            );
            pm.stroke_segment(pos, next, 1.0, color);
            pos = next;
            if pos.x < -w * 0.2 || pos.x > w * 1.2 || pos.y < -h * 0.2 || pos.y > h * 1.2 {
                break;
            }
        }
    }
}

fn draw_grain(pm: &mut Pixmap, p: &DerivedParams, rng: &mut RngStream) {
    if p.grain <= 0.0 {
        return;
    }
    // One draw fixes the pixel-hash seed; the overlay itself is a pure hash
    // of (seed, x, y) so grain cost never depends on element counts.
    let seed = (rng.next_f64() * 4_294_967_296.0) as u32;
    let strength = p.grain * 0.16;
    for y in 0..pm.height() {
        for x in 0..pm.width() {
            let v = f64::from(hash_u32(seed, x, y)) / f64::from(u32::MAX);
            let delta = (v - 0.5) * strength;
            let (tone, alpha) = if delta >= 0.0 {
                (1.0, delta)
            } else {
                (0.0, -delta)
            };
            pm.blend_px(
                i64::from(x),
                i64::from(y),
                Color::new(tone, tone, tone, alpha),
            );
        }
    }
}

fn hash_u32(seed: u32, x: u32, y: u32) -> u32 {
    let mut v = seed ^ x.wrapping_mul(0x9E37_79B9) ^ y.wrapping_mul(0x85EB_CA6B);
    v ^= v >> 16;
    v = v.wrapping_mul(0x7FEB_352D);
    v ^= v >> 15;
    v = v.wrapping_mul(0x846C_A68B);
    v ^ (v >> 16)
}
