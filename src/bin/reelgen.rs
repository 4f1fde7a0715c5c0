use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "reelgen", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single synthesized frame as a PNG.
    Frame(FrameArgs),
    /// Generate the full reel MP4 (requires `ffmpeg` on PATH).
    Generate(GenerateArgs),
    /// Print the clip parameters and derived frame count as JSON.
    Params,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Font file for the text layers; system fonts are scanned when unset.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Output MP4 path.
    #[arg(long, default_value = "reel.mp4")]
    out: PathBuf,

    /// Font file for the text layers; system fonts are scanned when unset.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Synthesize frames in parallel (staging order is preserved).
    #[arg(long)]
    parallel: bool,

    /// Print the engine's diagnostic log after the run.
    #[arg(long)]
    show_log: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Generate(args) => cmd_generate(args),
        Command::Params => cmd_params(),
    }
}

fn cmd_params() -> anyhow::Result<()> {
    let params = reelgen::ClipParams::portrait_reel();
    let mut doc = serde_json::to_value(params).context("serialize clip parameters")?;
    doc["frame_count"] = serde_json::json!(params.frame_count());
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let params = reelgen::ClipParams::portrait_reel();
    let plan = reelgen::synthesize_frame(&params, reelgen::FrameIndex(args.frame))?;

    let font_bytes = reelgen::resolve_font_bytes(args.font.as_deref())?;
    let mut backend = reelgen::CpuBackend::new(
        reelgen::RenderSettings::default(),
        std::sync::Arc::new(font_bytes),
    )?;
    let frame = reelgen::RenderBackend::render_plan(&mut backend, &plan)?;
    let png = reelgen::encode_frame_png(&frame, [0, 0, 0, 255])?;

    reelgen::ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

struct CliObserver {
    log: reelgen::LogBuffer,
}

impl reelgen::RunObserver for CliObserver {
    fn on_log(&mut self, line: &str) {
        self.log.push(line);
    }

    fn on_progress(&mut self, percent: u8) {
        eprint!("\rprogress: {percent:3}%");
        if percent == 100 {
            eprintln!();
        }
    }
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let params = reelgen::ClipParams::portrait_reel();
    let mut engine = reelgen::FfmpegEngine::new();
    let mut generator = reelgen::Generator::new(&mut engine, params);

    let opts = reelgen::GenerateOpts {
        out_path: args.out.clone(),
        font: args.font,
        threading: reelgen::Threading {
            parallel: args.parallel,
            ..reelgen::Threading::default()
        },
        ..reelgen::GenerateOpts::default()
    };

    let mut observer = CliObserver {
        log: reelgen::LogBuffer::default(),
    };

    let result = generator.generate(&opts, &mut observer);

    if args.show_log || result.is_err() {
        for line in observer.log.lines() {
            eprintln!("{line}");
        }
    }

    let stats = result?;
    eprintln!(
        "wrote {} ({} frames, {} bytes)",
        args.out.display(),
        stats.frames_staged,
        stats.output_bytes
    );
    Ok(())
}
