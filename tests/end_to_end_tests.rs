use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use streamgate::player::{run_binder, PlayerEventSource, PlayerTelemetryBinder};
use streamgate::stub::{start_server, StubState};
use streamgate::telemetry::{spawn_telemetry, DeliveryConfig, HttpSink, SessionConfig};
use tempfile::NamedTempFile;
use tokio::sync::mpsc;
use tokio::time::sleep;

/// Full pipeline: player event feed → binder → session batch → HTTP sink →
/// ingestion stub.
#[tokio::test]
async fn test_player_feed_reaches_ingestion_stub() {
    // Ingestion stub
    let state = Arc::new(StubState::default());
    let server_state = state.clone();
    let addr: std::net::SocketAddr = "127.0.0.1:13721".parse().unwrap();
    let server = tokio::spawn(async move {
        let _ = start_server(addr, server_state).await;
    });
    sleep(Duration::from_millis(200)).await;

    // Telemetry pipeline with a short timer flush
    let sink = Arc::new(
        HttpSink::new(
            "http://127.0.0.1:13721/api/log-event",
            Duration::from_secs(5),
        )
        .unwrap(),
    );
    let (session, delivery) = spawn_telemetry(
        SessionConfig {
            batch_size: 30,
            flush_interval: Duration::from_millis(200),
        },
        DeliveryConfig {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(10),
            max_queued_batches: 8,
        },
        sink,
    );

    // Player event feed
    let mut feed = NamedTempFile::new().unwrap();
    writeln!(feed, r#"{{"event":"waiting"}}"#).unwrap();
    writeln!(feed, r#"{{"event":"playing"}}"#).unwrap();
    writeln!(feed, r#"{{"event":"play"}}"#).unwrap();
    writeln!(feed, r#"{{"event":"play"}}"#).unwrap();
    writeln!(feed, r#"{{"event":"pause"}}"#).unwrap();
    writeln!(
        feed,
        r#"{{"event":"quality_change","level":{{"height":720,"bitrate":2500000,"id":"hls-720"}}}}"#
    )
    .unwrap();
    writeln!(feed, r#"{{"event":"dispose"}}"#).unwrap();
    feed.flush().unwrap();

    let (event_tx, event_rx) = mpsc::channel(64);
    let source = PlayerEventSource::new(feed.path().to_path_buf(), false);
    let binder = PlayerTelemetryBinder::new(session.clone(), None, true);

    let source_task = tokio::spawn(async move { source.run(event_tx).await });
    let binder_task = tokio::spawn(run_binder(event_rx, binder));

    source_task.await.unwrap().unwrap();
    binder_task.await.unwrap();

    // Let the timer flush and delivery run
    sleep(Duration::from_millis(600)).await;

    let stats = state.stats();
    // waiting (2 records) + rebuffer end + quality change + dispose +
    // play/pause summary
    assert_eq!(stats.records, 6);
    assert!(stats.batches >= 1);
    assert_eq!(stats.warnings, 2); // net-on-buffer + quality change
    assert_eq!(stats.errors, 0);

    session.shutdown();
    drop(session);
    delivery.await.unwrap();
    server.abort();
}
