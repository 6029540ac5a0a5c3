use schedule_capture::platform::{
    CliHost, DeviceMetrics, Host, MemoryHost, NodeKind, ViewportClass,
};
use schedule_capture::rendering::SoftwareRasterizer;
use schedule_capture::{CaptureConfig, CapturePipeline, ReportDocument, ReportRow};

fn one_row() -> ReportDocument {
    ReportDocument::new(
        "MidTerm Fall-2025",
        vec![ReportRow::new("3 Oct", "9:00 AM", "CSE220", "2", "UB40101")],
    )
}

#[test]
fn memory_host_smoke() {
    let h = MemoryHost::default();

    // device
    let m = h.device_metrics();
    assert_eq!(m.width, 1280);
    assert_eq!(ViewportClass::classify(&m, 768), ViewportClass::Desktop);
    assert_eq!(
        ViewportClass::classify(&DeviceMetrics { width: 360, height: 640, dpr: 3.0, touch: true }, 768),
        ViewportClass::Constrained
    );

    // document starts empty
    assert!(h.document().attached().is_empty());
}

#[tokio::test]
async fn pipeline_attaches_container_then_anchor_and_cleans_up() {
    let host = MemoryHost::default();
    let raster = SoftwareRasterizer::new();
    let cfg = CaptureConfig { settle_delay_ms: 0, ..Default::default() };
    let pipeline = CapturePipeline::new(cfg, &host).unwrap().with_rasterizer(&raster);

    pipeline.capture(&one_row()).await.unwrap();

    let history = host.document.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0], NodeKind::ReportContainer { width: 850, left: -9999 });
    assert_eq!(history[1], NodeKind::Anchor { download: "Spring25-Exam-Schedule.png".into() });
    assert_eq!(host.document.attached_count(), 0);
}

#[tokio::test]
async fn cli_host_saves_into_its_directory() {
    let dir = tempfile::tempdir().unwrap();
    let host = CliHost::new(dir.path(), DeviceMetrics::desktop());
    let raster = SoftwareRasterizer::new();
    let cfg = CaptureConfig {
        settle_delay_ms: 0,
        file_name: "midterm.png".into(),
        ..Default::default()
    };
    let pipeline = CapturePipeline::new(cfg, &host).unwrap().with_rasterizer(&raster);

    let out = pipeline.capture(&one_row()).await.unwrap();

    let saved = std::fs::read(dir.path().join("midterm.png")).unwrap();
    assert_eq!(saved, out.image.png_data);
    assert_eq!(out.file_name, "midterm.png");
}
