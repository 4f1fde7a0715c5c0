//! Render a single frame of the reel to a PNG next to the current directory.
//!
//! ```sh
//! cargo run --example render_frame -- 42
//! ```

use std::sync::Arc;

use reelgen::{
    ClipParams, CpuBackend, FrameIndex, RenderBackend, RenderSettings, encode_frame_png,
    resolve_font_bytes, synthesize_frame,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let frame = FrameIndex(
        std::env::args()
            .nth(1)
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or(0),
    );

    let params = ClipParams::portrait_reel();
    let plan = synthesize_frame(&params, frame)?;
    tracing::info!(ops = plan.ops.len(), "frame plan synthesized");

    let font_bytes = Arc::new(resolve_font_bytes(None)?);
    let mut backend = CpuBackend::new(RenderSettings::default(), font_bytes)?;
    let pixels = backend.render_plan(&plan)?;
    let png = encode_frame_png(&pixels, [0, 0, 0, 255])?;

    let out = format!("frame{:04}.png", frame.0 + 1);
    std::fs::write(&out, png)?;
    tracing::info!(out, "frame written");
    Ok(())
}
