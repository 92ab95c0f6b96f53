//! Export encoder.
//!
//! Consumes a captured frame buffer and produces either a negotiated-codec
//! video or a lossless image-sequence fallback. Video encoding drives the
//! system `ffmpeg` binary over stdin with raw RGBA frames (no native FFmpeg
//! dev headers/libs required). Codec negotiation failure is recovered
//! locally by the fallback path and never surfaced as an error.

use std::io::Write as _;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::error::{AspectraError, AspectraResult};
use crate::pipeline::FrameBuffer;
use crate::surface::Frame;

/// One codec the encoder may negotiate, ordered most-compatible first.
#[derive(Clone, Copy, Debug)]
pub struct CodecCandidate {
    /// ffmpeg encoder name (`-c:v`).
    pub encoder: &'static str,
    /// Container format (`-f`).
    pub container: &'static str,
    /// Output file extension for the produced payload.
    pub extension: &'static str,
}

/// Default negotiation order: broadly-compatible h264/mp4 first.
pub const DEFAULT_CANDIDATES: &[CodecCandidate] = &[
    CodecCandidate {
        encoder: "libx264",
        container: "mp4",
        extension: "mp4",
    },
    CodecCandidate {
        encoder: "libvpx-vp9",
        container: "webm",
        extension: "webm",
    },
    CodecCandidate {
        encoder: "mpeg4",
        container: "mp4",
        extension: "mp4",
    },
];

#[derive(Clone, Debug)]
pub struct EncodeOpts {
    pub candidates: Vec<CodecCandidate>,
    /// A finalized video smaller than this is treated as a failed attempt
    /// and falls through to the image-sequence path.
    pub min_video_bytes: u64,
    /// Yield to the host scheduler every N frames streamed.
    pub yield_every: u32,
}

impl Default for EncodeOpts {
    fn default() -> Self {
        Self {
            candidates: DEFAULT_CANDIDATES.to_vec(),
            min_video_bytes: 1024,
            yield_every: 4,
        }
    }
}

/// Encoded artifact payload.
#[derive(Debug)]
pub enum ExportPayload {
    Video {
        payload: Vec<u8>,
        extension: String,
    },
    /// Ordered `(frame_index, png_bytes)` pairs.
    FrameSequence(Vec<(usize, Vec<u8>)>),
}

/// Export artifact plus the metadata downstream manifesting needs.
#[derive(Debug)]
pub struct ExportResult {
    pub payload: ExportPayload,
    pub fps: u32,
    pub duration_ms: u32,
    pub seed: String,
    pub total_frames: usize,
}

/// Check whether `ffmpeg` is invocable on PATH.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Probe the host for the first supported codec candidate.
///
/// A candidate is supported when ffmpeg lists its encoder and the frame
/// dimensions fit the codec's constraints (yuv420p output needs even
/// dimensions). Returns `None` when nothing can be negotiated.
fn negotiate_codec(candidates: &[CodecCandidate], width: u32, height: u32) -> Option<CodecCandidate> {
    if !is_ffmpeg_on_path() {
        debug!("ffmpeg not on PATH, skipping video negotiation");
        return None;
    }
    if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
        debug!(width, height, "odd frame dimensions, skipping video negotiation");
        return None;
    }

    let listing = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !listing.status.success() {
        return None;
    }
    let listing = String::from_utf8_lossy(&listing.stdout).into_owned();
    find_supported(candidates, &listing)
}

/// First candidate whose encoder appears in an `ffmpeg -encoders` listing.
/// Each listing line is `<flags> <name> <description>`; the second token is
/// the encoder name.
fn find_supported(candidates: &[CodecCandidate], listing: &str) -> Option<CodecCandidate> {
    candidates
        .iter()
        .find(|c| {
            listing
                .lines()
                .any(|line| line.split_whitespace().nth(1) == Some(c.encoder))
        })
        .copied()
}

/// Encode a captured frame buffer.
///
/// Tries the negotiated video codec first; on any failure (no codec, spawn
/// or stream error, implausibly small payload) falls back to an ordered
/// lossless PNG sequence. Both paths report per-frame progress and yield
/// periodically. Progress counts are per attempt: a fallback after a failed
/// video attempt restarts at `(1, total)`, since the frames are streamed
/// again from the start.
pub fn encode(
    buffer: &FrameBuffer,
    opts: &EncodeOpts,
    progress: &mut dyn FnMut(usize, usize),
    yield_hook: &mut dyn FnMut(),
) -> AspectraResult<ExportResult> {
    let frames = buffer.frames();
    if frames.is_empty() {
        return Err(AspectraError::validation(
            "encode requires a non-empty frame buffer",
        ));
    }
    let (width, height) = (frames[0].width, frames[0].height);

    if let Some(codec) = negotiate_codec(&opts.candidates, width, height) {
        debug!(encoder = codec.encoder, "negotiated video codec");
        match encode_video(buffer, codec, opts, progress, yield_hook) {
            Ok(payload) if payload.len() as u64 >= opts.min_video_bytes => {
                return Ok(ExportResult {
                    payload: ExportPayload::Video {
                        payload,
                        extension: codec.extension.to_string(),
                    },
                    fps: buffer.fps,
                    duration_ms: buffer.duration_ms,
                    seed: buffer.seed.clone(),
                    total_frames: frames.len(),
                });
            }
            Ok(payload) => {
                warn!(
                    bytes = payload.len(),
                    "video payload below sanity threshold, falling back to frame sequence"
                );
            }
            Err(e) => {
                warn!(error = %e, "video encode failed, falling back to frame sequence");
            }
        }
    }

    let pngs = encode_frame_sequence(frames, progress, yield_hook, opts.yield_every)?;
    Ok(ExportResult {
        payload: ExportPayload::FrameSequence(pngs),
        fps: buffer.fps,
        duration_ms: buffer.duration_ms,
        seed: buffer.seed.clone(),
        total_frames: frames.len(),
    })
}

fn encode_video(
    buffer: &FrameBuffer,
    codec: CodecCandidate,
    opts: &EncodeOpts,
    progress: &mut dyn FnMut(usize, usize),
    yield_hook: &mut dyn FnMut(),
) -> AspectraResult<Vec<u8>> {
    let frames = buffer.frames();
    let (width, height) = (frames[0].width, frames[0].height);
    let fps = buffer.fps;

    let out_path = std::env::temp_dir().join(format!(
        "aspectra_loop_{}_{}.{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0),
        codec.extension
    ));
    let _guard = TempFileGuard(Some(out_path.clone()));

    let mut cmd = Command::new("ffmpeg");
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    cmd.args([
        "-y",
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-s",
        &format!("{width}x{height}"),
        "-r",
        &fps.to_string(),
        "-i",
        "pipe:0",
        "-an",
        "-c:v",
        codec.encoder,
        "-pix_fmt",
        "yuv420p",
        // 2-second GOP: one sync frame every fps*2 frames.
        "-g",
        &(fps * 2).to_string(),
        "-f",
        codec.container,
    ]);
    if codec.container == "mp4" {
        cmd.args(["-movflags", "+faststart"]);
    }
    cmd.arg(&out_path);

    let mut child = cmd
        .spawn()
        .map_err(|e| AspectraError::encode(format!("failed to spawn ffmpeg: {e}")))?;
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| AspectraError::encode("failed to open ffmpeg stdin (unexpected)"))?;

    let mut scratch = vec![0u8; (width as usize) * (height as usize) * 4];
    let total = frames.len();
    let mut write_err: Option<AspectraError> = None;
    for (i, frame) in frames.iter().enumerate() {
        flatten_to_opaque_rgba8(&mut scratch, frame)?;
        if let Err(e) = stdin.write_all(&scratch) {
            write_err = Some(AspectraError::encode(format!(
                "failed to write frame {i} to ffmpeg stdin: {e}"
            )));
            break;
        }
        progress(i + 1, total);
        if opts.yield_every > 0 && ((i as u32) + 1).is_multiple_of(opts.yield_every) {
            yield_hook();
        }
    }
    drop(stdin);

    let output = child
        .wait_with_output()
        .map_err(|e| AspectraError::encode(format!("failed to wait for ffmpeg: {e}")))?;
    if let Some(e) = write_err {
        return Err(e);
    }
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AspectraError::encode(format!(
            "ffmpeg exited with status {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    std::fs::read(&out_path)
        .map_err(|e| AspectraError::encode(format!("failed to read encoded video: {e}")))
}

fn encode_frame_sequence(
    frames: &[Frame],
    progress: &mut dyn FnMut(usize, usize),
    yield_hook: &mut dyn FnMut(),
    yield_every: u32,
) -> AspectraResult<Vec<(usize, Vec<u8>)>> {
    let total = frames.len();
    let mut scratch = vec![0u8; frames[0].data.len()];
    let mut out = Vec::with_capacity(total);
    for (i, frame) in frames.iter().enumerate() {
        if scratch.len() != frame.data.len() {
            scratch.resize(frame.data.len(), 0);
        }
        flatten_to_opaque_rgba8(&mut scratch, frame)?;

        let mut png = Vec::new();
        let enc = image::codecs::png::PngEncoder::new(&mut png);
        image::ImageEncoder::write_image(
            enc,
            &scratch,
            frame.width,
            frame.height,
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| AspectraError::encode(format!("png encode failed for frame {i}: {e}")))?;
        out.push((i, png));

        progress(i + 1, total);
        if yield_every > 0 && ((i as u32) + 1).is_multiple_of(yield_every) {
            yield_hook();
        }
    }
    Ok(out)
}

/// Flatten premultiplied RGBA over opaque black for the encoders.
fn flatten_to_opaque_rgba8(dst: &mut [u8], frame: &Frame) -> AspectraResult<()> {
    if dst.len() != frame.data.len() || !dst.len().is_multiple_of(4) {
        return Err(AspectraError::encode(
            "flatten expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(frame.data.chunks_exact(4)) {
        // Premultiplied over black: color channels pass through.
        d[0] = s[0];
        d[1] = s[1];
        d[2] = s[2];
        d[3] = 255;
    }
    Ok(())
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}
