//! Runner command handling and pacing.

use std::time::Duration;

use stream_guard::prelude::*;
use tempfile::tempdir;
use tokio::sync::watch;

type Collected = Vec<(Sample, DetectionResult)>;

#[tokio::test]
async fn test_stop_and_export_while_running() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("anomalies_track.csv");
    let (commands, receiver) = watch::channel(StreamCommand::Run);

    let handle = tokio::spawn(async move {
        let mut runner = StreamRunner::new(DetectorConfig::new(20, 3.0), Collected::new()).unwrap();
        let source = SyntheticSource::seeded(11).unwrap();
        let summary = runner
            .run(source, Duration::from_millis(1), receiver, None)
            .await
            .unwrap();
        (runner, summary)
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    commands
        .send(StreamCommand::StopAndExport(path.clone()))
        .unwrap();

    let (runner, summary) = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(summary.stop_reason, StopReason::Stopped);
    assert!(summary.samples_processed > 0);
    assert_eq!(summary.samples_processed, runner.sink().len() as u64);

    let report = summary.export.unwrap();
    assert_eq!(report.path, path);
    assert_eq!(report.rows, runner.anomaly_log().len());
    let reader = csv::Reader::from_path(&path).unwrap();
    assert_eq!(reader.into_records().count(), report.rows);
}

#[tokio::test]
async fn test_plain_stop_does_not_export() {
    let (commands, receiver) = watch::channel(StreamCommand::Run);

    let handle = tokio::spawn(async move {
        let mut runner = StreamRunner::new(DetectorConfig::default(), NullSink).unwrap();
        runner
            .run(
                ReplaySource::new(std::iter::repeat(1.0)),
                Duration::from_millis(1),
                receiver,
                None,
            )
            .await
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    commands.send(StreamCommand::Stop).unwrap();

    let summary = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(summary.stop_reason, StopReason::Stopped);
    assert!(summary.export.is_none());
}

#[tokio::test]
async fn test_dropped_sender_keeps_running_to_limit() {
    let (commands, receiver) = watch::channel(StreamCommand::Run);
    drop(commands);

    let mut runner = StreamRunner::new(DetectorConfig::default(), NullSink).unwrap();
    let summary = runner
        .run(
            SyntheticSource::seeded(5).unwrap(),
            Duration::from_millis(1),
            receiver,
            Some(10),
        )
        .await
        .unwrap();

    assert_eq!(summary.stop_reason, StopReason::SampleLimit);
    assert_eq!(summary.samples_processed, 10);
}

#[tokio::test]
async fn test_pacing_does_not_change_detection() {
    let values: Vec<f64> = SyntheticSource::seeded(21)
        .unwrap()
        .take(120)
        .map(|s| s.value)
        .collect();

    let mut immediate = StreamRunner::new(DetectorConfig::default(), Collected::new()).unwrap();
    immediate
        .run_until_exhausted(ReplaySource::new(values.clone()), None)
        .unwrap();

    let (_commands, receiver) = watch::channel(StreamCommand::Run);
    let mut paced = StreamRunner::new(DetectorConfig::default(), Collected::new()).unwrap();
    paced
        .run(ReplaySource::new(values), Duration::from_millis(1), receiver, None)
        .await
        .unwrap();

    assert_eq!(immediate.sink(), paced.sink());
    assert_eq!(
        immediate.anomaly_log().records(),
        paced.anomaly_log().records()
    );
}

#[test]
fn test_summary_serializes_to_json() {
    let mut runner = StreamRunner::new(DetectorConfig::new(5, 3.0), NullSink).unwrap();
    let summary = runner
        .run_until_exhausted(ReplaySource::new(vec![1.0, 2.0, 3.0]), None)
        .unwrap();

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["samples_processed"], 3);
    assert_eq!(json["stop_reason"], "source_exhausted");
    assert!(json["export"].is_null());
}

#[test]
fn test_terminal_sink_renders_every_sample() {
    let sink = TerminalSink::new(Vec::new(), 10);
    let mut runner = StreamRunner::new(DetectorConfig::new(3, 3.0), sink).unwrap();
    runner
        .run_until_exhausted(ReplaySource::new(vec![1.0, 2.0, f64::NAN, 3.0]), None)
        .unwrap();

    assert_eq!(runner.rejected(), 1);
    let sink = runner.into_sink();
    assert_eq!(sink.display().points().len(), 3);
    let text = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(text.lines().count(), 3);
}
