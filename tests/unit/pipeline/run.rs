use super::*;
use crate::foundation::core::Canvas;
use crate::render::text;

#[path = "../support/fake_engine.rs"]
mod fake_engine;
use fake_engine::FakeEngine;

#[derive(Default)]
struct Recorder {
    progress: Vec<u8>,
    log: Vec<String>,
}

impl RunObserver for Recorder {
    fn on_log(&mut self, line: &str) {
        self.log.push(line.to_string());
    }

    fn on_progress(&mut self, percent: u8) {
        self.progress.push(percent);
    }
}

fn tiny_params() -> ClipParams {
    ClipParams {
        canvas: Canvas {
            width: 16,
            height: 16,
        },
        fps: 2,
        duration_secs: 1,
    }
}

fn out_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("reelgen_test_{}_{name}.mp4", std::process::id()))
}

fn fonts_available() -> bool {
    text::resolve_font_bytes(None).is_ok()
}

#[test]
fn log_buffer_drops_oldest_beyond_cap() {
    let mut log = LogBuffer::new(3);
    for i in 0..5 {
        log.push(format!("line {i}"));
    }
    assert_eq!(log.len(), 3);
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines, ["line 2", "line 3", "line 4"]);

    assert_eq!(LogBuffer::default().cap, 200);
}

#[test]
fn progress_never_decreases_and_clamps_at_100() {
    let mut rec = Recorder::default();
    let mut p = ProgressTracker::new();
    p.reset(&mut rec);
    p.set(10, &mut rec);
    p.set(5, &mut rec);
    p.set(10, &mut rec);
    p.set(40, &mut rec);
    p.set(250, &mut rec);
    p.set(100, &mut rec);
    assert_eq!(rec.progress, [0, 10, 40, 100]);
}

#[test]
fn staging_maps_onto_the_first_forty_percent() {
    assert_eq!(staging_percent(1, 120), 0);
    assert_eq!(staging_percent(60, 120), 20);
    assert_eq!(staging_percent(120, 120), 40);
    assert_eq!(staging_percent(2, 2), 40);
}

#[test]
fn zero_worker_threads_are_rejected() {
    assert!(build_thread_pool(None).is_ok());
    assert!(matches!(
        build_thread_pool(Some(0)),
        Err(ReelError::Validation(_))
    ));
}

#[test]
fn engine_load_failure_stages_nothing() {
    let mut engine = FakeEngine::new();
    engine.fail_load = true;
    let mut rec = Recorder::default();
    {
        let mut generator = Generator::new(&mut engine, tiny_params());
        let err = generator
            .generate(&GenerateOpts::default(), &mut rec)
            .unwrap_err();
        assert!(matches!(err, ReelError::EngineLoad(_)));
    }
    assert_eq!(rec.progress, [0]);
    assert!(engine.files.is_empty());
    assert!(engine.exec_calls.is_empty());
}

#[test]
fn only_one_run_may_be_in_flight() {
    let mut engine = FakeEngine::new();
    let mut generator = Generator::new(&mut engine, tiny_params());
    generator.running = true;
    let err = generator
        .generate(&GenerateOpts::default(), &mut NullObserver)
        .unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
}

#[test]
fn full_run_reports_monotone_progress_and_writes_the_artifact() {
    if !fonts_available() {
        return;
    }

    let out = out_path("full_run");
    let mut engine = FakeEngine::new();
    let mut rec = Recorder::default();
    let stats = {
        let mut generator = Generator::new(&mut engine, tiny_params());
        let opts = GenerateOpts {
            out_path: out.clone(),
            ..GenerateOpts::default()
        };
        generator.generate(&opts, &mut rec).unwrap()
    };

    assert_eq!(stats.frames_staged, 2);
    let written = std::fs::read(&out).unwrap();
    assert_eq!(written.len() as u64, stats.output_bytes);
    std::fs::remove_file(&out).unwrap();

    assert_eq!(rec.progress.first(), Some(&0));
    assert_eq!(rec.progress.last(), Some(&100));
    assert!(rec.progress.contains(&40));
    assert!(rec.progress.contains(&85));
    assert!(rec.progress.windows(2).all(|w| w[0] < w[1]));

    assert_eq!(engine.exec_calls.len(), 1);
    assert!(engine.files.is_empty(), "cleanup must empty the staging area");
}

#[test]
fn parallel_staging_matches_the_sequential_contract() {
    if !fonts_available() {
        return;
    }

    let out = out_path("parallel_run");
    let mut engine = FakeEngine::new();
    let mut rec = Recorder::default();
    let stats = {
        let mut generator = Generator::new(&mut engine, tiny_params());
        let opts = GenerateOpts {
            out_path: out.clone(),
            threading: Threading {
                parallel: true,
                chunk_size: 1,
                threads: Some(2),
            },
            ..GenerateOpts::default()
        };
        generator.generate(&opts, &mut rec).unwrap()
    };

    assert_eq!(stats.frames_staged, 2);
    std::fs::remove_file(&out).unwrap();
    assert_eq!(rec.progress.last(), Some(&100));
    assert!(rec.progress.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(engine.exec_calls.len(), 1);
    assert!(engine.files.is_empty());
}

#[test]
fn encode_failure_still_cleans_the_staging_area() {
    if !fonts_available() {
        return;
    }

    let mut engine = FakeEngine::new();
    engine.fail_exec = true;
    let mut rec = Recorder::default();
    {
        let mut generator = Generator::new(&mut engine, tiny_params());
        let opts = GenerateOpts {
            out_path: out_path("encode_failure"),
            ..GenerateOpts::default()
        };
        let err = generator.generate(&opts, &mut rec).unwrap_err();
        assert!(matches!(err, ReelError::Encode(_)));
    }

    // Staging completed, but the encode checkpoint was never reached.
    assert_eq!(rec.progress.last(), Some(&40));
    assert!(engine.files.is_empty());
    // Engine diagnostics were forwarded to the observer.
    assert!(rec.log.iter().any(|l| l.contains("fake engine")));
}
