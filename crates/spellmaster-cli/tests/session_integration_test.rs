//! Interactive session tests on a paused runtime clock.
//!
//! Input is fed through an in-memory pipe by a writer task that sleeps
//! between commands, so hold durations are exact in virtual time.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;

use spellmaster::{HarnessConfig, SnapshotCause};
use spellmaster_cli::telemetry_log::read_log;
use spellmaster_cli::{run_session, SessionOptions};
use tokio::io::{AsyncWriteExt, BufReader, DuplexStream};

/// Cloneable in-memory writer so the test can read what the session drew
#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Steps of a scripted typist: text to send, then a pause.
fn typist(mut tx: DuplexStream, steps: Vec<(&'static str, u64)>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        for (text, pause_ms) in steps {
            tx.write_all(text.as_bytes()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(pause_ms)).await;
        }
    })
}

fn plain_options() -> SessionOptions {
    SessionOptions {
        color: false,
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_hold_then_release_escalates_about_ten_per_second() {
    let (tx, rx) = tokio::io::duplex(1024);
    let writer = typist(tx, vec![("down 3\n", 1_000), ("up 3\n", 300), ("quit\n", 0)]);

    let hud = SharedBuf::default();
    let bell = SharedBuf::default();
    let summary = run_session(
        &HarnessConfig::default(),
        &plain_options(),
        BufReader::new(rx),
        hud.clone(),
        bell.clone(),
    )
    .await
    .unwrap();
    writer.await.unwrap();

    let ticks = summary.snapshot.total_ticks;
    assert!((7..=10).contains(&ticks), "got {ticks} ticks");
    assert_eq!(summary.snapshot.level as u64, ticks + 1);
    assert!(!summary.snapshot.holding);

    // one tone and one flash per escalation
    assert_eq!(summary.tones, ticks);
    assert_eq!(summary.flashes, ticks);
    assert_eq!(bell.text().matches('\x07').count() as u64, ticks);

    let drawn = hud.text();
    assert!(drawn.contains("SPELLMASTER HARNESS"));
    assert!(drawn.contains("Total: 0"));
    assert!(drawn.contains(&format!("Total: {ticks}")));
    assert!(drawn.contains("[3] Hold to Escalate | [0] Reset"));
}

#[tokio::test(start_paused = true)]
async fn test_muted_presentation_makes_no_cues() {
    let (tx, rx) = tokio::io::duplex(1024);
    let writer = typist(tx, vec![("down 3\n", 500), ("quit\n", 0)]);

    let mut config = HarnessConfig::default();
    config.presentation.sounds = false;
    config.presentation.visuals = false;
    let bell = SharedBuf::default();
    let summary = run_session(
        &config,
        &plain_options(),
        BufReader::new(rx),
        SharedBuf::default(),
        bell.clone(),
    )
    .await
    .unwrap();
    writer.await.unwrap();

    assert!(summary.snapshot.total_ticks > 0);
    assert_eq!(summary.tones, 0);
    assert_eq!(summary.flashes, 0);
    assert!(bell.text().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_reset_key_and_bad_lines() {
    let (tx, rx) = tokio::io::duplex(1024);
    let writer = typist(
        tx,
        vec![
            ("down 3\n", 600),
            ("up 3\n", 50),
            ("bogus line\n", 10),
            ("down 7\n", 10),
            ("press 0\n", 50),
        ],
    );

    let summary = run_session(
        &HarnessConfig::default(),
        &plain_options(),
        BufReader::new(rx),
        SharedBuf::default(),
        SharedBuf::default(),
    )
    .await
    .unwrap();
    writer.await.unwrap();

    // end of input ends the session; reset zeroed everything
    assert_eq!(summary.snapshot.level, 1);
    assert_eq!(summary.snapshot.total_ticks, 0);
    assert_eq!(summary.snapshot.streak, 0);
    assert_eq!(summary.snapshot.bias, 50.0);
}

#[tokio::test(start_paused = true)]
async fn test_telemetry_log_records_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.jsonl");
    let (tx, rx) = tokio::io::duplex(1024);
    let writer = typist(
        tx,
        vec![("down 3\n", 350), ("up 3\n", 20), ("press 0\n", 20), ("quit\n", 0)],
    );

    let options = SessionOptions {
        telemetry_log: Some(path.clone()),
        ..plain_options()
    };
    let summary = run_session(
        &HarnessConfig::default(),
        &options,
        BufReader::new(rx),
        SharedBuf::default(),
        SharedBuf::default(),
    )
    .await
    .unwrap();
    writer.await.unwrap();

    let records = read_log(&path).unwrap();
    let kinds: Vec<_> = records.iter().map(|r| r.kind).collect();
    assert_eq!(kinds.first(), Some(&SnapshotCause::Initial));
    assert_eq!(kinds.last(), Some(&SnapshotCause::Reset));
    let escalations = kinds
        .iter()
        .filter(|k| **k == SnapshotCause::Escalation)
        .count();
    assert!(escalations >= 2, "got {escalations} escalations");
    assert_eq!(summary.snapshot.total_ticks, 0);
}

#[tokio::test(start_paused = true)]
async fn test_zero_frame_period_rejected() {
    let (_tx, rx) = tokio::io::duplex(64);
    let options = SessionOptions {
        frame_ms: 0,
        ..plain_options()
    };
    let err = run_session(
        &HarnessConfig::default(),
        &options,
        BufReader::new(rx),
        SharedBuf::default(),
        SharedBuf::default(),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("frame period"));
}
