use super::*;
use crate::foundation::core::Canvas;

#[path = "../support/fake_engine.rs"]
mod fake_engine;
use fake_engine::{FakeEngine, test_png};

fn tiny_params() -> ClipParams {
    // 2 frames keeps full-sequence tests cheap.
    ClipParams {
        canvas: Canvas {
            width: 8,
            height: 6,
        },
        fps: 2,
        duration_secs: 1,
    }
}

#[test]
fn frame_names_are_one_based_and_zero_padded() {
    assert_eq!(frame_file_name(FrameIndex(0)), "frame0001.png");
    assert_eq!(frame_file_name(FrameIndex(9)), "frame0010.png");
    assert_eq!(frame_file_name(FrameIndex(119)), "frame0120.png");
}

#[test]
fn encode_args_match_the_published_recipe() {
    let args = encode_args(&ClipParams::portrait_reel());
    let expected: Vec<String> = [
        "-r",
        "24",
        "-f",
        "image2",
        "-i",
        "frame%04d.png",
        "-vcodec",
        "libx264",
        "-pix_fmt",
        "yuv420p",
        "-preset",
        "veryfast",
        "-crf",
        "23",
        "-movflags",
        "+faststart",
        "output.mp4",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    assert_eq!(args, expected);
}

#[test]
fn stage_rejects_unloaded_engine_bad_frames_and_wrong_sizes() {
    let params = tiny_params();

    let mut engine = FakeEngine::new();
    let mut asm = VideoAssembler::new(&mut engine, params).unwrap();
    let err = asm.stage_image(FrameIndex(0), &test_png(8, 6)).unwrap_err();
    assert!(matches!(err, ReelError::Staging(_)));

    let mut engine = FakeEngine::loaded_engine();
    let mut asm = VideoAssembler::new(&mut engine, params).unwrap();

    let err = asm.stage_image(FrameIndex(2), &test_png(8, 6)).unwrap_err();
    assert!(matches!(err, ReelError::Staging(_)));

    let err = asm.stage_image(FrameIndex(0), b"not a png").unwrap_err();
    assert!(matches!(err, ReelError::Staging(_)));

    let err = asm.stage_image(FrameIndex(0), &test_png(4, 6)).unwrap_err();
    assert!(matches!(err, ReelError::Staging(_)));

    assert_eq!(asm.staged_count(), 0);
}

#[test]
fn encode_requires_a_complete_sequence() {
    let params = tiny_params();
    let mut engine = FakeEngine::loaded_engine();
    let mut asm = VideoAssembler::new(&mut engine, params).unwrap();
    let mut sink = |_: &str| {};

    let err = asm.encode(&mut sink).unwrap_err();
    assert!(matches!(err, ReelError::Encode(_)));
    assert!(err.to_string().contains("no frames staged"));

    asm.stage_image(FrameIndex(0), &test_png(8, 6)).unwrap();
    let err = asm.encode(&mut sink).unwrap_err();
    assert!(matches!(err, ReelError::Encode(_)));
    assert!(err.to_string().contains("staged 1 of 2"));
}

#[test]
fn full_stage_encode_read_flow() {
    let params = tiny_params();
    let mut engine = FakeEngine::loaded_engine();
    {
        let mut asm = VideoAssembler::new(&mut engine, params).unwrap();
        // Out-of-order staging is allowed.
        asm.stage_image(FrameIndex(1), &test_png(8, 6)).unwrap();
        asm.stage_image(FrameIndex(0), &test_png(8, 6)).unwrap();
        assert_eq!(asm.staged_count(), 2);

        let err = asm.read_result().unwrap_err();
        assert!(matches!(err, ReelError::Read(_)));

        let mut lines = Vec::new();
        asm.encode(&mut |line| lines.push(line.to_string())).unwrap();
        assert!(!lines.is_empty());
        assert_eq!(asm.read_result().unwrap(), b"mp4-bytes");
    }
    assert_eq!(engine.exec_calls.len(), 1);
    assert_eq!(engine.exec_calls[0], encode_args(&params));
}

#[test]
fn cleanup_removes_everything_and_is_idempotent() {
    let params = tiny_params();
    let mut engine = FakeEngine::loaded_engine();
    {
        let mut asm = VideoAssembler::new(&mut engine, params).unwrap();
        asm.stage_image(FrameIndex(0), &test_png(8, 6)).unwrap();
        asm.stage_image(FrameIndex(1), &test_png(8, 6)).unwrap();
        asm.encode(&mut |_| {}).unwrap();

        assert!(asm.cleanup().is_empty());
        assert!(asm.cleanup().is_empty());
    }
    assert!(engine.files.is_empty());
}

#[test]
fn cleanup_removes_a_partial_artifact_after_a_failed_encode() {
    let params = tiny_params();
    let mut engine = FakeEngine::loaded_engine();
    engine.fail_exec = true;
    engine.partial_artifact = true;
    {
        let mut asm = VideoAssembler::new(&mut engine, params).unwrap();
        asm.stage_image(FrameIndex(0), &test_png(8, 6)).unwrap();
        asm.stage_image(FrameIndex(1), &test_png(8, 6)).unwrap();
        let err = asm.encode(&mut |_| {}).unwrap_err();
        assert!(matches!(err, ReelError::Encode(_)));

        // The truncated output must not survive cleanup, and its absence on
        // a later pass is not a warning.
        assert!(asm.cleanup().is_empty());
        assert!(asm.cleanup().is_empty());
    }
    assert!(engine.files.is_empty(), "leftover files: {:?}", engine.files);
}

#[test]
fn cleanup_reports_failures_as_warnings() {
    let params = tiny_params();
    let mut engine = FakeEngine::loaded_engine();
    engine.fail_delete = true;
    let mut asm = VideoAssembler::new(&mut engine, params).unwrap();
    asm.stage_image(FrameIndex(0), &test_png(8, 6)).unwrap();
    asm.stage_image(FrameIndex(1), &test_png(8, 6)).unwrap();

    let warnings = asm.cleanup();
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|w| w.starts_with("cleanup:")));
    // Staged names are consumed even when deletion fails.
    assert!(asm.cleanup().is_empty());
}
