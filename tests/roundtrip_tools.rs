//! Round-trip verification against stub tools, batch paths

mod fixtures;

use std::fs;
use std::time::Duration;

use assetcheck::roundtrip::{BatchInput, RoundTripOptions, RoundTripVerifier};
use assetcheck::VerifyFailure;

fn verifier(cleanup: bool) -> RoundTripVerifier {
    RoundTripVerifier::new(
        Duration::from_secs(10),
        RoundTripOptions {
            extension_filter: None,
            cleanup_on_exit: cleanup,
        },
    )
}

#[test]
fn codec_batch_accepts_an_explicit_file_list_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let tool = fixtures::codec(dir.path());

    let first = dir.path().join("first.szs");
    let second = dir.path().join("second.szs");
    fs::write(&first, b"Zone").unwrap();
    fs::write(&second, b"Ztwo").unwrap();

    let passed = verifier(true)
        .run_codec_batch(
            &tool,
            BatchInput::Files(vec![first, second]),
            &dir.path().join("out"),
        )
        .unwrap();
    assert_eq!(passed, 2);

    // Cleanup ran after each file.
    let leftovers: Vec<_> = fs::read_dir(dir.path().join("out"))
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn container_batch_reports_mixed_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let tool = fixtures::container(dir.path());

    let archives = dir.path().join("archives");
    fs::create_dir(&archives).unwrap();
    fs::write(archives.join("ok.sarc"), b"headtailbytes").unwrap();

    // A lossy packer for this one: simulate by making the archive empty,
    // which the stub unpacks into two empty members but repacks into an
    // empty file; that round-trips, so instead break the unpack step with
    // an unreadable path.
    fs::create_dir(archives.join("not-a-file.sarc")).unwrap();

    let outcomes = verifier(true).run_container_batch(
        &tool,
        BatchInput::Directory(archives),
        &dir.path().join("work"),
    );

    // Directories are skipped by enumeration; only the real archive runs.
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].file.ends_with("ok.sarc"));
    assert!(outcomes[0].result.is_ok());
}

#[test]
fn missing_tool_fails_the_batch_with_an_environment_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("a.szs");
    fs::write(&input, b"Zbytes").unwrap();

    let err = verifier(true)
        .run_codec_batch(
            &dir.path().join("no-such-tool"),
            BatchInput::Files(vec![input.clone()]),
            &dir.path().join("out"),
        )
        .unwrap_err();
    assert!(err.file.ends_with("a.szs"));
    assert!(matches!(err.failure, VerifyFailure::ToolNotFound { .. }));
}
