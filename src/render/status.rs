// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 状态行渲染器 - 无窗口运行时周期性输出 FPS / 目标 / 云台角度

use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::RenderSink;
use crate::actuator::ActuatorSnapshot;
use crate::detection::{Detection, Target};
use crate::input::Frame;

/// 调试输出间隔 (帧)
const DEBUG_EVERY_FRAMES: u64 = 20;

pub struct StatusRenderer {
    interval: Duration,
    debug: bool,
    show_angles: bool,

    // 统计
    frame_count: u64,
    fps_counter: u32,
    fps_timer: Instant,
    fps_display: u32,
    last_print: Option<Instant>,
    last_status: Option<String>,
}

impl StatusRenderer {
    /// `show_angles`: 舵机启用时在状态行附带角度
    pub fn new(interval: Duration, show_angles: bool) -> Self {
        Self {
            interval,
            debug: false,
            show_angles,
            frame_count: 0,
            fps_counter: 0,
            fps_timer: Instant::now(),
            fps_display: 0,
            last_print: None,
            last_status: None,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// 最近一次输出的状态行
    pub fn last_status(&self) -> Option<&str> {
        self.last_status.as_deref()
    }

    fn format_status(&self, target: Option<&Target<'_>>, actuator: ActuatorSnapshot) -> String {
        let label = target
            .map(|t| t.detection.class.as_str())
            .unwrap_or("scanning");
        let mut msg = format!("FPS: {} | Target: {}", self.fps_display, label);
        if self.show_angles {
            msg.push_str(&format!(
                " | pan={} tilt={}",
                actuator.pan.round() as i32,
                actuator.tilt.round() as i32
            ));
        }
        msg
    }
}

impl RenderSink for StatusRenderer {
    fn draw(
        &mut self,
        _frame: &Frame,
        detections: &[Detection],
        target: Option<&Target<'_>>,
        actuator: ActuatorSnapshot,
    ) {
        self.frame_count += 1;

        if self.debug && self.frame_count % DEBUG_EVERY_FRAMES == 1 {
            debug!(
                "detections={} target={}",
                detections.len(),
                target.map(|t| t.detection.class.as_str()).unwrap_or("none")
            );
        }

        self.fps_counter += 1;
        if self.fps_timer.elapsed() >= Duration::from_secs(1) {
            self.fps_display = self.fps_counter;
            self.fps_counter = 0;
            self.fps_timer = Instant::now();
        }

        // 前两帧总是输出,之后按间隔输出
        let due = self.frame_count <= 2
            || self
                .last_print
                .map_or(true, |t| t.elapsed() >= self.interval);
        if due {
            let status = self.format_status(target, actuator);
            info!("{}", status);
            self.last_print = Some(Instant::now());
            self.last_status = Some(status);
        }
    }
}
