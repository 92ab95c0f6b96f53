//! End-to-end coverage: landmarks → pre-render → export, plus the
//! cancellation and fallback contracts.

use aspectra::{
    AspectSet, Canvas, EncodeOpts, ExportPayload, Landmark, LoopOpts, MotionBlur, PreRender,
    encode, pre_render,
};

fn canvas() -> Canvas {
    Canvas {
        width: 24,
        height: 24,
    }
}

fn landmarks() -> Vec<Landmark> {
    let mk = |name: &str, v: f64| Landmark {
        name: name.to_string(),
        seed: "integration".to_string(),
        aspects: AspectSet::clamped(v, 1.0 - v, v * 0.7, 0.4, 0.3, 1.0 - v * 0.4),
        note: Some("from profile storage".to_string()),
    };
    vec![mk("rise", 0.85), mk("fall", 0.15), mk("drift", 0.5)]
}

fn opts() -> LoopOpts {
    let mut o = LoopOpts::new(canvas(), 8, 1000);
    o.pre_roll_frames = 4;
    o
}

fn render_buffer(o: &LoopOpts) -> aspectra::FrameBuffer {
    let mut blur = MotionBlur::new(o.canvas, 0.12, 0.55).unwrap();
    match pre_render(
        &landmarks(),
        "integration",
        o,
        &mut blur,
        &mut |_, _| {},
        &mut || false,
        &mut || {},
    )
    .unwrap()
    {
        PreRender::Completed(buf) => buf,
        PreRender::Cancelled => panic!("unexpected cancellation"),
    }
}

#[test]
fn full_pipeline_to_frame_sequence() {
    let o = opts();
    let buffer = render_buffer(&o);
    assert_eq!(buffer.total_frames(), o.total_frames());

    // Empty candidate list forces the fallback path deterministically,
    // regardless of whether the host has ffmpeg.
    let enc_opts = EncodeOpts {
        candidates: Vec::new(),
        ..EncodeOpts::default()
    };
    let result = encode(&buffer, &enc_opts, &mut |_, _| {}, &mut || {}).unwrap();

    assert_eq!(result.total_frames, o.total_frames());
    assert_eq!(result.fps, 8);
    assert_eq!(result.duration_ms, 1000);
    assert_eq!(result.seed, "integration");
    match result.payload {
        ExportPayload::FrameSequence(frames) => {
            assert_eq!(frames.len(), o.total_frames());
            let indices: Vec<usize> = frames.iter().map(|(i, _)| *i).collect();
            let expected: Vec<usize> = (0..frames.len()).collect();
            assert_eq!(indices, expected);
        }
        ExportPayload::Video { .. } => panic!("expected frame-sequence fallback"),
    }
}

#[test]
fn cancellation_mid_pipeline_releases_everything() {
    let o = opts();
    let mut blur = MotionBlur::new(o.canvas, 0.12, 0.55).unwrap();
    let mut progress_calls = 0usize;
    let mut frame_no = 0usize;
    let outcome = pre_render(
        &landmarks(),
        "integration",
        &o,
        &mut blur,
        &mut |_, _| progress_calls += 1,
        &mut || {
            frame_no += 1;
            frame_no > 3
        },
        &mut || {},
    )
    .unwrap();
    assert!(matches!(outcome, PreRender::Cancelled));
    // Progress stops at the cancellation boundary; no partial list escapes.
    assert_eq!(progress_calls, 3);
}

#[test]
fn repeated_pipeline_runs_are_bit_identical() {
    let o = opts();
    let a = render_buffer(&o);
    let b = render_buffer(&o);
    assert_eq!(a.total_frames(), b.total_frames());
    for (x, y) in a.frames().iter().zip(b.frames()) {
        assert_eq!(x.data, y.data);
    }
}

#[test]
fn changing_seed_changes_every_frame() {
    let o = opts();
    let a = render_buffer(&o);

    let mut blur = MotionBlur::new(o.canvas, 0.12, 0.55).unwrap();
    let b = match pre_render(
        &landmarks(),
        "different-seed",
        &o,
        &mut blur,
        &mut |_, _| {},
        &mut || false,
        &mut || {},
    )
    .unwrap()
    {
        PreRender::Completed(buf) => buf,
        PreRender::Cancelled => panic!("unexpected cancellation"),
    };
    for (x, y) in a.frames().iter().zip(b.frames()) {
        assert_ne!(x.data, y.data);
    }
}

#[test]
fn disabled_blur_session_still_completes() {
    let o = opts();
    let mut blur = MotionBlur::new(o.canvas, 0.12, 0.55).unwrap();
    blur.set_enabled(false);
    let buf = match pre_render(
        &landmarks(),
        "integration",
        &o,
        &mut blur,
        &mut |_, _| {},
        &mut || false,
        &mut || {},
    )
    .unwrap()
    {
        PreRender::Completed(buf) => buf,
        PreRender::Cancelled => panic!("unexpected cancellation"),
    };
    // Without accumulation every captured frame is the raw opaque render.
    assert!(
        buf.frames()
            .iter()
            .all(|f| f.data.chunks_exact(4).all(|px| px[3] == 255))
    );
}
