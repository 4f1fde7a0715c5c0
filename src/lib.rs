//! Reelgen renders a fixed-length procedural animation and assembles it into
//! a portrait MP4, entirely on the local machine.
//!
//! # Pipeline overview
//!
//! 1. **Synthesize**: `ClipParams + FrameIndex -> ScenePlan`, a
//!    deterministic list of draw operations for one instant of the animation
//! 2. **Rasterize**: `ScenePlan -> FrameRGBA` (CPU backend)
//! 3. **Stage**: PNG-encoded frames registered with the encoding engine
//!    under sequential zero-padded names
//! 4. **Assemble**: one engine invocation producing an H.264/yuv420p MP4
//!
//! Key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic synthesis**: a frame's plan is a pure function of the
//!   clip constants and the frame index; no frame depends on prior frames.
//! - **Injected engine**: the encoding engine is a trait object with an
//!   explicit load/is-loaded lifecycle, so tests can substitute a fake.
//! - **Unconditional cleanup**: staged images never leak into the next run,
//!   whether a run succeeds or fails.
#![forbid(unsafe_code)]

mod encode;
mod foundation;
mod render;
mod scene;

pub mod pipeline;

pub use encode::assembler::{OUTPUT_NAME, VideoAssembler, encode_args, frame_file_name};
pub use encode::engine::{EncodeEngine, FfmpegEngine, is_ffmpeg_on_path};
pub use foundation::core::{Canvas, ClipParams, FrameIndex, Rgba8};
pub use foundation::error::{ReelError, ReelResult};
pub use pipeline::{
    GenerateOpts, Generator, LogBuffer, NullObserver, RunObserver, RunStats, Threading,
    ensure_parent_dir,
};
pub use render::backend::{FrameRGBA, RenderBackend, RenderSettings};
pub use render::cpu::CpuBackend;
pub use render::png::encode_frame_png;
pub use render::text::{TextBrush, TextLayoutEngine, find_default_font, resolve_font_bytes};
pub use scene::globe::synthesize_frame;
pub use scene::plan::{DrawOp, Paint, ScenePlan, TextAnchor};
