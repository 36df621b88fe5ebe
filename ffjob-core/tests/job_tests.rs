// ffjob-core/tests/job_tests.rs
//
// End-to-end job runs against small shell scripts standing in for ffmpeg.
// The scripts print the same carriage-return terminated status lines the
// real encoder does and write their last argument as the output file.

#![cfg(unix)]

use ffjob_core::{
    CancellationToken, CoreError, FixedDuration, Job, JobConfig, JobConfigBuilder, JobEvents,
    JobState, ParseError, ProgressRecord,
};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::{TempDir, tempdir};

const LINE_10: &str = "frame=  100 fps= 25 q=28.0 size=  2048KiB time=00:00:04.00 bitrate= 500.0kbits/s dup=0 drop=0 speed=1.0x";
const LINE_50: &str = "frame=  500 fps= 25 q=28.0 size= 10240KiB time=00:00:20.00 bitrate= 500.0kbits/s dup=0 drop=0 speed=1.0x";
const LINE_100: &str = "frame= 1000 fps= 25 q=-1.0 Lsize= 20480KiB time=00:00:40.00 bitrate= 500.0kbits/s dup=0 drop=0 speed=1.0x";

/// Writes an executable shell script into `dir`.
fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let script = format!("#!/bin/sh\nfor out; do :; done\n{body}\n");
    fs::write(&path, script).expect("Failed to write script");
    let mut perms = fs::metadata(&path).expect("script metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("Failed to chmod script");
    path
}

fn create_input(dir: &Path) -> PathBuf {
    let input = dir.join("input.mkv");
    fs::write(&input, b"dummy content").expect("Failed to create input");
    input
}

fn config_with(ffmpeg: &Path) -> JobConfig {
    JobConfigBuilder::new()
        .ffmpeg_path(ffmpeg)
        .poll_interval(Duration::from_millis(20))
        .build()
}

fn job(dir: &TempDir, ffmpeg: &Path, output: &Path, token: CancellationToken) -> Job {
    let input = create_input(dir.path());
    Job::with_probe(
        &config_with(ffmpeg),
        &input,
        output,
        &["-c:v", "libx264"],
        token,
        &FixedDuration(Duration::from_secs(40)),
    )
    .expect("job construction")
}

struct Drained {
    progress: thread::JoinHandle<Vec<ProgressRecord>>,
    errors: thread::JoinHandle<Vec<ParseError>>,
}

/// Drains the progress and error channels on their own threads.
fn drain(events: &JobEvents) -> Drained {
    let progress = events.progress.clone();
    let errors = events.errors.clone();
    Drained {
        progress: thread::spawn(move || progress.iter().collect()),
        errors: thread::spawn(move || errors.iter().collect()),
    }
}

#[test]
fn test_successful_job_reports_progress() {
    let dir = tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "ffmpeg",
        &format!(
            "printf 'ffmpeg version n7.0\\nInput #0, matroska\\n' >&2\n\
             printf '%s\\r' '{LINE_10}' >&2\n\
             printf '%s\\r' '{LINE_50}' >&2\n\
             printf 'encoded' > \"$out\"\n\
             printf '%s\\n' 'frame= 1000 fps= 25 q=-1.0 size= 20480KiB time=00:00:40.00 bitrate= 500.0kbits/s dup=0 drop=0 speed=1.0x' >&2\n\
             exit 0"
        ),
    );
    let output = dir.path().join("out/movie.mp4");
    let mut job = job(&dir, &script, &output, CancellationToken::new());
    let events = job.events();
    let drained = drain(&events);

    job.start().expect("job should succeed");
    assert!(job.started_at().is_some());

    assert_eq!(events.done.recv(), Ok(false));
    assert!(events.done.recv().is_err(), "done yields exactly once");

    let records = drained.progress.join().unwrap();
    let errors = drained.errors.join().unwrap();
    assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
    let frames: Vec<u64> = records.iter().map(|r| r.frame).collect();
    assert_eq!(frames, vec![100, 500, 1000]);
    assert!((records[0].percent_complete - 10.0).abs() < 1e-9);
    assert_eq!(records[2].percent_complete, 100.0);
    assert_eq!(records[0].output_path, output);

    assert_eq!(fs::read_to_string(&output).unwrap(), "encoded");
    assert_eq!(job.state(), JobState::Closed);
}

#[test]
fn test_malformed_lines_go_to_error_channel() {
    let dir = tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "ffmpeg",
        &format!(
            "printf '%s\\r' 'frame=  12 fps=0.0' >&2\n\
             printf '%s\\r' '{LINE_100}' >&2\n\
             printf '%s\\r' '{LINE_10}' >&2\n\
             : > \"$out\"\n\
             exit 0"
        ),
    );
    let output = dir.path().join("movie.mp4");
    let mut job = job(&dir, &script, &output, CancellationToken::new());
    let events = job.events();
    let drained = drain(&events);

    job.start().unwrap();
    assert_eq!(events.done.recv(), Ok(false));

    let errors = drained.errors.join().unwrap();
    assert_eq!(errors.len(), 2);
    assert!(matches!(errors[0], ParseError::FieldCountMismatch { found: 4, .. }));
    assert!(matches!(
        errors[1],
        ParseError::SchemaMismatch { position: 6, expected: "size", .. }
    ));
    let records = drained.progress.join().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].frame, 100);
}

#[test]
fn test_cancel_removes_partial_output() {
    let dir = tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "ffmpeg",
        &format!(
            "printf 'partial' > \"$out\"\n\
             printf '%s\\r' '{LINE_10}' >&2\n\
             exec sleep 30"
        ),
    );
    let output = dir.path().join("movie.mp4");
    let token = CancellationToken::new();
    let mut job = job(&dir, &script, &output, token.clone());
    let events = job.events();
    let drained = drain(&events);

    let canceller = {
        let token = token.clone();
        let output = output.clone();
        thread::spawn(move || {
            let deadline = Instant::now() + Duration::from_secs(10);
            while !output.exists() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            token.cancel();
        })
    };

    let started = Instant::now();
    let result = job.start();
    canceller.join().unwrap();
    assert!(matches!(result, Err(CoreError::Cancelled)), "got {result:?}");
    assert!(started.elapsed() < Duration::from_secs(20));

    assert_eq!(events.done.recv(), Ok(false));
    assert!(events.done.recv().is_err());
    assert!(events.progress.recv().is_err());
    assert!(!output.exists(), "partial output should be removed");

    let records = drained.progress.join().unwrap();
    assert!(records.len() <= 1);
}

#[test]
fn test_deadline_cancels_job() {
    let dir = tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "ffmpeg",
        "printf 'partial' > \"$out\"\nexec sleep 30",
    );
    let output = dir.path().join("movie.mp4");
    let token = CancellationToken::with_timeout(Duration::from_millis(300));
    let mut job = job(&dir, &script, &output, token);
    let events = job.events();
    let _drained = drain(&events);

    assert!(matches!(job.start(), Err(CoreError::Cancelled)));
    assert_eq!(events.done.recv(), Ok(false));
    assert!(!output.exists());
}

#[test]
fn test_failed_encode_keeps_output() {
    let dir = tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "ffmpeg",
        "printf 'partial' > \"$out\"\n\
         printf 'Unknown encoder libfoo\\n' >&2\n\
         exit 3",
    );
    let output = dir.path().join("movie.mp4");
    let mut job = job(&dir, &script, &output, CancellationToken::new());
    let events = job.events();
    let _drained = drain(&events);

    match job.start() {
        Err(CoreError::ProcessFailed { status, .. }) => assert_eq!(status.code(), Some(3)),
        other => panic!("expected ProcessFailed, got {other:?}"),
    }
    assert_eq!(events.done.recv(), Ok(false));
    assert_eq!(fs::read_to_string(&output).unwrap(), "partial");
}

#[test]
fn test_cancel_after_clean_exit_keeps_output() {
    let dir = tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "ffmpeg",
        &format!("printf '%s\\r' '{LINE_10}' >&2\nprintf 'encoded' > \"$out\"\nexit 0"),
    );
    let output = dir.path().join("movie.mp4");
    let token = CancellationToken::new();
    let mut job = job(&dir, &script, &output, token.clone());
    let events = job.events();
    let _drained = drain(&events);

    job.start().expect("job should succeed");
    token.cancel();

    assert_eq!(events.done.recv(), Ok(false));
    assert_eq!(fs::read_to_string(&output).unwrap(), "encoded");
}

#[test]
fn test_second_run_overwrites_output() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("movie.mp4");

    for (name, content) in [("ffmpeg-long", "first run, longer content"), ("ffmpeg-short", "second")] {
        let script = write_script(
            dir.path(),
            name,
            &format!("printf '%s\\r' '{LINE_10}' >&2\nprintf '{content}' > \"$out\"\nexit 0"),
        );
        let mut job = job(&dir, &script, &output, CancellationToken::new());
        let events = job.events();
        let _drained = drain(&events);
        job.start().unwrap();
        assert_eq!(events.done.recv(), Ok(false));
    }

    assert_eq!(fs::read_to_string(&output).unwrap(), "second");
}

#[test]
fn test_start_twice_is_invalid() {
    let dir = tempdir().unwrap();
    let script = write_script(dir.path(), "ffmpeg", ": > \"$out\"\nexit 0");
    let output = dir.path().join("movie.mp4");
    let mut job = job(&dir, &script, &output, CancellationToken::new());
    let events = job.events();
    let _drained = drain(&events);

    job.start().unwrap();
    assert_eq!(events.done.recv(), Ok(false));
    assert!(matches!(job.start(), Err(CoreError::InvalidState(_))));
}

#[test]
fn test_encoder_receives_injected_arguments() {
    let dir = tempdir().unwrap();
    let args_file = dir.path().join("args.txt");
    let script = write_script(
        dir.path(),
        "ffmpeg",
        &format!("printf '%s\\n' \"$@\" > '{}'\n: > \"$out\"\nexit 0", args_file.display()),
    );
    let output = dir.path().join("movie.mp4");
    let mut job = job(&dir, &script, &output, CancellationToken::new());
    let events = job.events();
    let _drained = drain(&events);
    job.start().unwrap();
    assert_eq!(events.done.recv(), Ok(false));

    let recorded = fs::read_to_string(&args_file).unwrap();
    let args: Vec<&str> = recorded.lines().collect();
    let input = dir.path().join("input.mkv");
    assert_eq!(
        args,
        vec![
            "-y",
            "-i",
            input.to_str().unwrap(),
            "-c:v",
            "libx264",
            output.to_str().unwrap()
        ]
    );
}
