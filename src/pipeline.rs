use std::{collections::VecDeque, path::PathBuf, sync::Arc};

use rayon::prelude::*;

use crate::{
    encode::assembler::VideoAssembler,
    encode::engine::EncodeEngine,
    foundation::core::{ClipParams, FrameIndex},
    foundation::error::{ReelError, ReelResult},
    render::backend::{RenderBackend, RenderSettings},
    render::cpu::CpuBackend,
    render::png::encode_frame_png,
    render::text::resolve_font_bytes,
    scene::globe::synthesize_frame,
};

/// Staging maps linearly onto `0..=40`; the engine exposes no granular encode
/// progress, so completion jumps to 85 and artifact readback closes at 100.
const STAGING_PROGRESS_MAX: u8 = 40;
const ENCODE_PROGRESS_CHECKPOINT: u8 = 85;

/// Background used when flattening alpha for the staged PNGs.
const FLATTEN_BG: [u8; 4] = [0, 0, 0, 255];

/// Observer for a generation run, decoupling the pipeline from presentation.
pub trait RunObserver {
    fn on_log(&mut self, line: &str);
    fn on_progress(&mut self, percent: u8);
}

/// Observer that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl RunObserver for NullObserver {
    fn on_log(&mut self, _line: &str) {}
    fn on_progress(&mut self, _percent: u8) {}
}

/// Append-only bounded log of diagnostic lines; oldest entries are dropped
/// beyond the cap.
#[derive(Clone, Debug)]
pub struct LogBuffer {
    cap: usize,
    lines: VecDeque<String>,
}

impl LogBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            lines: VecDeque::new(),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.cap {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        // Matches the cap of the published generator's on-screen log.
        Self::new(200)
    }
}

/// Monotone progress: values never decrease within a run and are clamped to
/// `0..=100`.
struct ProgressTracker {
    last: Option<u8>,
}

impl ProgressTracker {
    fn new() -> Self {
        Self { last: None }
    }

    fn set(&mut self, percent: u8, observer: &mut dyn RunObserver) {
        let p = percent.min(100);
        if self.last.is_some_and(|last| p <= last) {
            return;
        }
        self.last = Some(p);
        observer.on_progress(p);
    }

    fn reset(&mut self, observer: &mut dyn RunObserver) {
        self.last = Some(0);
        observer.on_progress(0);
    }
}

#[derive(Clone, Debug)]
pub struct Threading {
    pub parallel: bool,
    pub chunk_size: usize,
    pub threads: Option<usize>,
}

impl Default for Threading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 24,
            threads: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GenerateOpts {
    /// Where the MP4 byte stream is written.
    pub out_path: PathBuf,
    /// Explicit font file; system font directories are scanned when unset.
    pub font: Option<PathBuf>,
    /// Cooperative yield cadence during sequential staging, in frames.
    /// Zero disables yielding.
    pub yield_every: usize,
    pub threading: Threading,
}

impl Default for GenerateOpts {
    fn default() -> Self {
        Self {
            out_path: PathBuf::from("reel.mp4"),
            font: None,
            yield_every: 12,
            threading: Threading::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub frames_staged: u64,
    pub output_bytes: u64,
}

/// Drives one full generation run: synthesize and stage every frame, encode
/// once, read back the artifact, and always clean up the staging area.
pub struct Generator<'e> {
    engine: &'e mut dyn EncodeEngine,
    params: ClipParams,
    running: bool,
}

impl<'e> Generator<'e> {
    pub fn new(engine: &'e mut dyn EncodeEngine, params: ClipParams) -> Self {
        Self {
            engine,
            params,
            running: false,
        }
    }

    pub fn params(&self) -> ClipParams {
        self.params
    }

    /// Run the whole pipeline once. Re-entrancy-guarded: only one run may be
    /// in flight. There is no cancellation mid-run; once started, the run
    /// proceeds to completion or failure, and cleanup executes either way.
    #[tracing::instrument(skip_all, fields(out = %opts.out_path.display()))]
    pub fn generate(
        &mut self,
        opts: &GenerateOpts,
        observer: &mut dyn RunObserver,
    ) -> ReelResult<RunStats> {
        if self.running {
            return Err(ReelError::validation(
                "a generation run is already in flight",
            ));
        }
        self.running = true;
        let result = self.run(opts, observer);
        self.running = false;
        result
    }

    fn run(&mut self, opts: &GenerateOpts, observer: &mut dyn RunObserver) -> ReelResult<RunStats> {
        let mut progress = ProgressTracker::new();
        progress.reset(observer);
        self.params.validate()?;

        // Engine load must precede any staging; a load failure leaves the
        // run with nothing staged and progress at 0.
        self.engine.load()?;

        let font_bytes = Arc::new(resolve_font_bytes(opts.font.as_deref())?);
        let params = self.params;
        let mut assembler = VideoAssembler::new(self.engine, params)?;

        let result = stage_and_encode(
            &mut assembler,
            &params,
            font_bytes,
            opts,
            observer,
            &mut progress,
        );

        // Unconditional: staged images must not leak into the next run.
        let warnings = assembler.cleanup();
        for w in &warnings {
            tracing::warn!("{w}");
            observer.on_log(w);
        }

        result
    }
}

fn stage_and_encode(
    assembler: &mut VideoAssembler<'_>,
    params: &ClipParams,
    font_bytes: Arc<Vec<u8>>,
    opts: &GenerateOpts,
    observer: &mut dyn RunObserver,
    progress: &mut ProgressTracker,
) -> ReelResult<RunStats> {
    let frame_count = params.frame_count();

    if opts.threading.parallel {
        stage_parallel(assembler, params, font_bytes, opts, observer, progress)?;
    } else {
        stage_sequential(assembler, params, font_bytes, opts, observer, progress)?;
    }

    assembler.encode(&mut |line| observer.on_log(line))?;
    progress.set(ENCODE_PROGRESS_CHECKPOINT, observer);

    let bytes = assembler.read_result()?;
    ensure_parent_dir(&opts.out_path)?;
    std::fs::write(&opts.out_path, &bytes).map_err(|e| {
        ReelError::read(format!(
            "failed to write output '{}': {e}",
            opts.out_path.display()
        ))
    })?;
    progress.set(100, observer);

    Ok(RunStats {
        frames_staged: frame_count,
        output_bytes: bytes.len() as u64,
    })
}

fn stage_sequential(
    assembler: &mut VideoAssembler<'_>,
    params: &ClipParams,
    font_bytes: Arc<Vec<u8>>,
    opts: &GenerateOpts,
    observer: &mut dyn RunObserver,
    progress: &mut ProgressTracker,
) -> ReelResult<()> {
    let frame_count = params.frame_count();
    let mut backend = CpuBackend::new(RenderSettings::default(), font_bytes)?;

    for i in 0..frame_count {
        let frame = FrameIndex(i);
        let plan = synthesize_frame(params, frame)?;
        let pixels = backend.render_plan(&plan)?;
        let png = encode_frame_png(&pixels, FLATTEN_BG)?;
        assembler.stage_image(frame, &png)?;
        progress.set(staging_percent(i + 1, frame_count), observer);

        // Scheduled yield point so a single-threaded host stays responsive;
        // this is also where a future cancellation token would be checked.
        if opts.yield_every > 0 && (i + 1).is_multiple_of(opts.yield_every as u64) {
            std::thread::yield_now();
        }
    }
    Ok(())
}

/// Frames are pure functions of their index, so chunks may be synthesized in
/// parallel as long as staging happens in index order.
fn stage_parallel(
    assembler: &mut VideoAssembler<'_>,
    params: &ClipParams,
    font_bytes: Arc<Vec<u8>>,
    opts: &GenerateOpts,
    observer: &mut dyn RunObserver,
    progress: &mut ProgressTracker,
) -> ReelResult<()> {
    let frame_count = params.frame_count();
    let chunk_size = opts.threading.chunk_size.max(1) as u64;
    let pool = build_thread_pool(opts.threading.threads)?;

    let mut chunk_start = 0u64;
    while chunk_start < frame_count {
        let chunk_end = (chunk_start + chunk_size).min(frame_count);
        let indices: Vec<u64> = (chunk_start..chunk_end).collect();

        let rendered: Vec<ReelResult<Vec<u8>>> = pool.install(|| {
            indices
                .par_iter()
                .map_init(
                    || CpuBackend::new(RenderSettings::default(), font_bytes.clone()).ok(),
                    |backend, &i| -> ReelResult<Vec<u8>> {
                        let backend = backend.as_mut().ok_or_else(|| {
                            ReelError::validation("worker backend initialization failed")
                        })?;
                        let plan = synthesize_frame(params, FrameIndex(i))?;
                        let pixels = backend.render_plan(&plan)?;
                        encode_frame_png(&pixels, FLATTEN_BG)
                    },
                )
                .collect()
        });

        for (offset, png) in rendered.into_iter().enumerate() {
            let i = chunk_start + offset as u64;
            assembler.stage_image(FrameIndex(i), &png?)?;
            progress.set(staging_percent(i + 1, frame_count), observer);
        }
        chunk_start = chunk_end;
    }
    Ok(())
}

fn staging_percent(staged: u64, total: u64) -> u8 {
    ((staged as f64 / total as f64) * f64::from(STAGING_PROGRESS_MAX)).round() as u8
}

fn build_thread_pool(threads: Option<usize>) -> ReelResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(ReelError::validation(
            "threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ReelError::validation(format!("failed to build rayon thread pool: {e}")))
}

pub fn ensure_parent_dir(path: &std::path::Path) -> ReelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/pipeline/run.rs"]
mod tests;
