// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 端到端: 合成/图片序列视频源 + 脚本检测器 + 模拟舵机

use std::sync::{Arc, Mutex};

use cat_tracker::actuator::{MockServo, ServoDriver};
use cat_tracker::detection::ScriptedDetector;
use cat_tracker::input::{ImageSequenceSource, SyntheticSource};
use cat_tracker::render::{NullRenderer, OverlayRenderer};
use cat_tracker::{
    ActuatorSnapshot, AngleRange, Axis, Collaborators, ControlLoop, Detection, DetectorError,
    Frame, ObjectClass, RenderSink, ShutdownReason, Target, TrackingConfig, VideoSource,
};

/// 记录每帧渲染时看到的目标与角度
#[derive(Clone, Default)]
struct RecordingSink {
    seen: Arc<Mutex<Vec<(u64, Option<ObjectClass>, ActuatorSnapshot)>>>,
}

impl RenderSink for RecordingSink {
    fn draw(
        &mut self,
        frame: &Frame,
        _detections: &[Detection],
        target: Option<&Target<'_>>,
        actuator: ActuatorSnapshot,
    ) {
        self.seen.lock().unwrap().push((
            frame.frame_id,
            target.map(|t| t.detection.class),
            actuator,
        ));
    }
}

const SCRIPT: &str = r#"
# 第0帧: 小猫被过滤, 选中人
{"frame": 0, "detections": [{"class": "cat", "confidence": 0.9, "bbox": [10, 10, 30, 30]}, {"class": "person", "confidence": 0.8, "bbox": [300, 100, 200, 300]}]}
# 第1帧: 只有狗
{"frame": 1, "detections": [{"class": "dog", "confidence": 0.95, "bbox": [0, 0, 400, 400]}]}
# 第3帧: 目标在右侧
{"frame": 3, "detections": [{"class": "cat", "confidence": 0.7, "bbox": [370, 210, 60, 60]}]}
"#;

fn config() -> TrackingConfig {
    let mut config = TrackingConfig {
        min_box_width: 50.0,
        min_box_height: 50.0,
        gain: 0.4,
        ..Default::default()
    };
    config.pan.range = AngleRange::new(0.0, 180.0);
    config
}

fn run_loop(
    config: TrackingConfig,
    source: Box<dyn VideoSource>,
    renderer: Box<dyn RenderSink>,
    driver: Box<dyn ServoDriver>,
    servo_enabled: bool,
) -> cat_tracker::LoopSummary {
    let detector = ScriptedDetector::parse("inline", SCRIPT).unwrap();
    let mut control = ControlLoop::new(
        config,
        Collaborators {
            source,
            detector: Box::new(detector),
            renderer,
            driver,
        },
        servo_enabled,
    )
    .unwrap();
    let (_tx, rx) = crossbeam_channel::bounded::<()>(1);
    control.run(&rx).unwrap()
}

#[test]
fn scripted_run_tracks_and_homes() {
    let sink = RecordingSink::default();
    let seen = Arc::clone(&sink.seen);
    let mock = MockServo::new();
    let log = mock.log();

    let summary = run_loop(
        config(),
        Box::new(SyntheticSource::new(640, 480, Some(5))),
        Box::new(sink),
        Box::new(mock),
        true,
    );
    assert_eq!(summary.reason, ShutdownReason::EndOfStream);
    assert_eq!(summary.stats.frames, 5);
    assert_eq!(summary.stats.driver_faults, 0);

    let seen = seen.lock().unwrap();
    let targets: Vec<Option<ObjectClass>> = seen.iter().map(|s| s.1).collect();
    assert_eq!(
        targets,
        vec![Some(ObjectClass::Person), None, None, Some(ObjectClass::Cat), None]
    );

    // 人的中心 (400, 250): dx = 0.25 → pan +9°, dy ≈ 0.042 在死区内
    let after_person = seen[0].2;
    assert!((after_person.pan - 99.0).abs() < 1e-3);
    assert_eq!(after_person.tilt, 90.0);

    // 无目标帧不动 (扫描需要连续10帧)
    assert_eq!(seen[1].2, after_person);
    assert_eq!(seen[2].2, after_person);

    // 第3帧再 +9°
    assert!((seen[3].2.pan - 108.0).abs() < 1e-3);

    // 关闭时回中并释放
    let log = log.lock().unwrap();
    assert_eq!(log.pan, Some(90.0));
    assert_eq!(log.tilt, Some(90.0));
    assert!(log.released);
}

#[test]
fn servo_disabled_run_never_touches_driver() {
    let sink = RecordingSink::default();
    let seen = Arc::clone(&sink.seen);
    let mock = MockServo::new();
    let log = mock.log();

    run_loop(
        config(),
        Box::new(SyntheticSource::new(640, 480, Some(30))),
        Box::new(sink),
        Box::new(mock),
        false,
    );

    assert!(seen
        .lock()
        .unwrap()
        .iter()
        .all(|s| s.2 == ActuatorSnapshot { pan: 90.0, tilt: 90.0 }));
    assert_eq!(log.lock().unwrap().write_count, 0);
}

#[test]
fn long_empty_stretch_starts_scanning() {
    let mock = MockServo::new();
    let log = mock.log();
    let mut config = config();
    config.home_on_shutdown = false;

    // 第4帧之后没有任何检测: 4..=13 为连续10帧, 从第13帧开始扫描
    run_loop(
        config,
        Box::new(SyntheticSource::new(640, 480, Some(16))),
        Box::new(NullRenderer),
        Box::new(mock),
        true,
    );

    let log = log.lock().unwrap();
    let pan_writes: Vec<f32> = log
        .recent
        .iter()
        .filter(|(axis, _)| *axis == Axis::Pan)
        .map(|(_, angle)| *angle)
        .collect();
    // 初始化1次 + 两个目标帧各1次 + 3个扫描帧
    assert_eq!(pan_writes.len(), 1 + 2 + 3);
    let last = *pan_writes.last().unwrap();
    assert!((last - 114.0).abs() < 1e-3);
}

#[test]
fn image_sequence_with_overlay() {
    let frames = tempfile::tempdir().unwrap();
    for i in 0..4 {
        image::RgbImage::new(640, 480)
            .save(frames.path().join(format!("img_{:03}.png", i)))
            .unwrap();
    }
    // 非图片文件被忽略
    std::fs::write(frames.path().join("notes.txt"), "skip me").unwrap();

    let out = tempfile::tempdir().unwrap();
    let overlay = OverlayRenderer::with_output_dir(out.path().join("overlay"), 3);
    let overlay_dir = overlay.output_dir().to_path_buf();

    let summary = run_loop(
        config(),
        Box::new(ImageSequenceSource::new(frames.path()).with_expected_size(640, 480)),
        Box::new(overlay),
        Box::new(MockServo::new()),
        true,
    );
    assert_eq!(summary.stats.frames, 4);
    assert!(overlay_dir.join("frame_000000.png").exists());
    assert!(overlay_dir.join("frame_000003.png").exists());
    assert!(!overlay_dir.join("frame_000001.png").exists());
}

#[test]
fn missing_frames_dir_is_fatal_at_init() {
    let detector = ScriptedDetector::parse("inline", SCRIPT).unwrap();
    let result = ControlLoop::new(
        config(),
        Collaborators {
            source: Box::new(ImageSequenceSource::new("/nonexistent/frames")),
            detector: Box::new(detector),
            renderer: Box::new(NullRenderer),
            driver: Box::new(MockServo::new()),
        },
        true,
    );
    assert_eq!(result.err().unwrap().kind(), "FatalAcquisitionFault");
}

#[test]
fn config_file_round_trip_drives_loop() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.json");
    let mut saved = config();
    saved.pan.inverted = true;
    saved.save(&path).unwrap();

    let loaded = TrackingConfig::load(&path).unwrap();
    assert_eq!(loaded, saved);

    let sink = RecordingSink::default();
    let seen = Arc::clone(&sink.seen);
    run_loop(
        loaded,
        Box::new(SyntheticSource::new(640, 480, Some(1))),
        Box::new(sink),
        Box::new(MockServo::new()),
        true,
    );
    // 反向安装: 目标在右侧时水平角减小
    assert!((seen.lock().unwrap()[0].2.pan - 81.0).abs() < 1e-3);
}

#[test]
fn quit_from_second_sender_homes_and_releases() {
    let mock = MockServo::new();
    let log = mock.log();
    let (tx, rx) = cat_tracker::quit_channel();
    let handler_tx = tx.clone();

    // 第3帧时由另一个发送端 (信号处理) 请求退出, 此前目标一直在右侧
    let detector = move |frame: &Frame| -> Result<Vec<Detection>, DetectorError> {
        if frame.frame_id == 3 {
            cat_tracker::request_quit(&handler_tx);
        }
        Ok(vec![Detection {
            class: ObjectClass::Cat,
            confidence: 0.9,
            bbox: cat_tracker::BBox::new(470.0, 210.0, 60.0, 60.0),
        }])
    };
    let mut control = ControlLoop::new(
        config(),
        Collaborators {
            source: Box::new(SyntheticSource::new(640, 480, None)),
            detector: Box::new(detector),
            renderer: Box::new(NullRenderer),
            driver: Box::new(mock),
        },
        true,
    )
    .unwrap();

    let summary = control.run(&rx).unwrap();
    assert_eq!(summary.reason, ShutdownReason::QuitRequested);
    assert_eq!(summary.stats.frames, 4);

    let log = log.lock().unwrap();
    assert!(log.write_count > 2);
    assert_eq!(log.pan, Some(90.0));
    assert_eq!(log.tilt, Some(90.0));
    assert!(log.released);
}
