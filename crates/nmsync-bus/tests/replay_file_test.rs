#![allow(clippy::unwrap_used)]
// Replay sessions backed by real capture files on disk.

use std::io::Write;

use nmsync_bus::{BusSession, ChangeEvent, Error, ObjectKind, ReplaySession};

fn write_capture(lines: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

#[tokio::test]
async fn test_open_capture_file() {
    let file = write_capture(&[
        r#"{"event":"object_added","path":"/org/nm","kind":"Manager","properties":{"Version":"1.46.0"}}"#,
        r#"{"event":"properties_changed","path":"/org/nm","properties":{"Startup":false}}"#,
    ]);

    let mut session = ReplaySession::open(file.path()).unwrap();
    let objects = session.enumerate().await.unwrap();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].kind, ObjectKind::Manager);
    assert_eq!(objects[0].properties["Version"], "1.46.0");

    let event = session.next_event().await.unwrap().unwrap();
    assert!(matches!(event, ChangeEvent::PropertiesChanged { .. }));
    assert!(session.next_event().await.unwrap().is_none());
}

#[test]
fn test_missing_capture_is_io_error() {
    let err = ReplaySession::open(std::path::Path::new("/nonexistent/capture.jsonl")).unwrap_err();
    assert!(matches!(err, Error::Io(_)), "expected Io error, got: {err:?}");
}

#[test]
fn test_unknown_kind_is_decode_error() {
    let file = write_capture(&[r#"{"event":"object_added","path":"/x","kind":"Router"}"#]);
    let err = ReplaySession::open(file.path()).unwrap_err();
    assert!(matches!(err, Error::Decode { line: 1, .. }), "got: {err:?}");
}
