// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 控制循环 (Control Loop Orchestrator)
//!
//! 单线程顺序执行,每个周期:
//! 采集 → 检测 → 目标选择 → 误差/映射 → 执行 → 渲染
//!
//! 状态: Init → Running → ShuttingDown → Terminated
//! 退出请求每周期检查一次,不会在周期中途打断

use crossbeam_channel::Receiver;
use tracing::{debug, error, info, warn};

use crate::actuator::{ActuatorSnapshot, ActuatorState, Axis, ServoDriver};
use crate::config::TrackingConfig;
use crate::control::{axis_delta, compute_error, CenteringError};
use crate::detection::{select, Detector, ObjectClass, Point2};
use crate::error::TrackerError;
use crate::input::VideoSource;
use crate::render::RenderSink;

/// 循环状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Init,
    Running,
    ShuttingDown,
    Terminated,
}

/// 正常退出原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    QuitRequested,
    EndOfStream,
}

/// 本周期的追踪目标摘要
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetInfo {
    pub class: ObjectClass,
    pub index: usize,
    pub center: Point2,
}

/// 单周期结果
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub frame_id: u64,
    pub detections: usize,
    pub target: Option<TargetInfo>,
    pub error: Option<CenteringError>,
    /// (pan, tilt) 映射后的角度增量 (未截断)
    pub deltas: Option<(f32, f32)>,
    pub actuator: ActuatorSnapshot,
    pub scanning: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Cycle(CycleReport),
    /// 读帧失败,跳过本周期
    Skipped,
    EndOfStream,
}

/// 运行统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub frames: u64,
    pub skipped: u64,
    pub driver_faults: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub stats: LoopStats,
    pub reason: ShutdownReason,
}

/// 控制循环依赖的外部组件
pub struct Collaborators {
    pub source: Box<dyn VideoSource>,
    pub detector: Box<dyn Detector>,
    pub renderer: Box<dyn RenderSink>,
    pub driver: Box<dyn ServoDriver>,
}

pub struct ControlLoop {
    config: TrackingConfig,
    source: Box<dyn VideoSource>,
    detector: Box<dyn Detector>,
    renderer: Box<dyn RenderSink>,
    actuator: ActuatorState,
    servo_enabled: bool,
    state: LoopState,

    // 跨帧计数
    consecutive_read_failures: u32,
    frames_without_target: u32,
    scan_direction: f32, // 1 = 向右, -1 = 向左

    stats: LoopStats,
}

impl ControlLoop {
    /// 初始化: 校验配置 → 打开视频源 → 云台回到初始角度
    ///
    /// `servo_enabled = false` 时仍计算误差与增量 (用于显示),但从不驱动云台
    pub fn new(
        config: TrackingConfig,
        parts: Collaborators,
        servo_enabled: bool,
    ) -> Result<Self, TrackerError> {
        let Collaborators {
            mut source,
            detector,
            renderer,
            mut driver,
        } = parts;

        if let Err(e) = config.validate() {
            if let Err(release_err) = driver.release() {
                warn!("⚠️ 舵机释放失败: {}", release_err);
            }
            return Err(e.into());
        }
        let mut actuator = ActuatorState::new(&config, driver);

        if let Err(e) = source.open() {
            if let Err(release_err) = actuator.release() {
                warn!("⚠️ 舵机释放失败: {}", release_err);
            }
            return Err(TrackerError::SourceUnavailable(e));
        }
        info!("✅ 视频源已打开: {}", source.name());
        info!("🔍 检测器: {}", detector.name());

        let mut control = Self {
            config,
            source,
            detector,
            renderer,
            actuator,
            servo_enabled,
            state: LoopState::Init,
            consecutive_read_failures: 0,
            frames_without_target: 0,
            scan_direction: 1.0,
            stats: LoopStats::default(),
        };

        if servo_enabled {
            control.home_actuator();
            info!(
                "🎯 云台初始角度: pan={} tilt={} ({})",
                control.config.pan.home,
                control.config.tilt.home,
                control.actuator.driver_name()
            );
        } else {
            info!("🎯 舵机已禁用: 仅检测与显示");
        }

        Ok(control)
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn actuator(&self) -> &ActuatorState {
        &self.actuator
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// 运行直到收到退出请求、流结束或致命故障; 任何情况下都会执行关闭流程
    pub fn run(&mut self, quit: &Receiver<()>) -> Result<LoopSummary, TrackerError> {
        self.state = LoopState::Running;
        info!("✅ 追踪循环启动");

        let result = loop {
            // 发送端断开不视为退出请求
            if quit.try_recv().is_ok() {
                info!("🛑 收到退出请求");
                break Ok(ShutdownReason::QuitRequested);
            }
            match self.step() {
                Ok(StepOutcome::EndOfStream) => {
                    info!("📹 视频流结束");
                    break Ok(ShutdownReason::EndOfStream);
                }
                Ok(_) => {}
                Err(e) => break Err(e),
            }
        };

        if let Err(e) = &result {
            error!("❌ 致命故障 [{}]: {}", e.kind(), e);
        }
        self.shutdown();

        result.map(|reason| LoopSummary {
            stats: self.stats,
            reason,
        })
    }

    /// 执行一个周期
    pub fn step(&mut self) -> Result<StepOutcome, TrackerError> {
        // 1. 采集
        let frame = match self.source.read_frame() {
            Ok(Some(frame)) => {
                self.consecutive_read_failures = 0;
                frame
            }
            Ok(None) => return Ok(StepOutcome::EndOfStream),
            Err(e) => {
                self.consecutive_read_failures += 1;
                self.stats.skipped += 1;
                if self.consecutive_read_failures > self.config.max_consecutive_read_failures {
                    return Err(TrackerError::AcquisitionExhausted {
                        failures: self.consecutive_read_failures,
                        last: e,
                    });
                }
                warn!(
                    "⚠️ 读帧失败 ({}/{}), 跳过本帧: {}",
                    self.consecutive_read_failures, self.config.max_consecutive_read_failures, e
                );
                return Ok(StepOutcome::Skipped);
            }
        };

        // 2. 检测 (失败即致命)
        let detections = self.detector.detect(&frame)?;

        // 3. 目标选择
        let target = select(&detections, &self.config);

        // 4. 误差 → 增量 → 执行
        let mut error = None;
        let mut deltas = None;
        let mut scanning = false;

        if let Some(t) = &target {
            self.frames_without_target = 0;
            let err = compute_error(t.center, self.config.frame_width, self.config.frame_height);
            let pan_delta =
                axis_delta(err.dx, &self.config.pan, self.config.gain, self.config.deadzone);
            let tilt_delta =
                axis_delta(err.dy, &self.config.tilt, self.config.gain, self.config.deadzone);
            if self.servo_enabled {
                self.actuate(Axis::Pan, pan_delta);
                self.actuate(Axis::Tilt, tilt_delta);
            }
            error = Some(err);
            deltas = Some((pan_delta, tilt_delta));
        } else {
            self.frames_without_target = self.frames_without_target.saturating_add(1);
            if self.servo_enabled {
                scanning = self.scan_step();
            }
        }

        // 5. 渲染
        let snapshot = self.actuator.snapshot();
        self.renderer.draw(&frame, &detections, target.as_ref(), snapshot);
        self.stats.frames += 1;

        let report = CycleReport {
            frame_id: frame.frame_id,
            detections: detections.len(),
            target: target.map(|t| TargetInfo {
                class: t.detection.class,
                index: t.index,
                center: t.center,
            }),
            error,
            deltas,
            actuator: snapshot,
            scanning,
        };
        debug!("{:?}", report);
        Ok(StepOutcome::Cycle(report))
    }

    /// 无目标时水平扫描,到达边界后反向; 返回本帧是否在扫描
    fn scan_step(&mut self) -> bool {
        let scan = self.config.scan;
        if !scan.enabled || self.frames_without_target < scan.start_after_frames {
            return false;
        }
        let range = self.config.pan.range;
        let angle = self.actuate(Axis::Pan, self.scan_direction * scan.step_degrees);
        if angle >= range.max {
            self.scan_direction = -1.0;
        } else if angle <= range.min {
            self.scan_direction = 1.0;
        }
        true
    }

    /// 驱动写入失败只记录警告,逻辑角度照常更新
    fn actuate(&mut self, axis: Axis, delta: f32) -> f32 {
        let result = self.actuator.apply(axis, delta);
        if let Some(fault) = result.fault {
            self.stats.driver_faults += 1;
            warn!("⚠️ {} 舵机写入失败 (角度 {:.1}): {}", axis, result.angle, fault);
        }
        result.angle
    }

    fn home_actuator(&mut self) {
        for result in self.actuator.home() {
            if let Some(fault) = result.fault {
                self.stats.driver_faults += 1;
                warn!("⚠️ 云台归位失败: {}", fault);
            }
        }
    }

    /// 关闭流程: 释放视频源 → (可选) 云台归位 → 释放驱动; 只执行一次
    pub fn shutdown(&mut self) {
        if self.state == LoopState::Terminated {
            return;
        }
        self.state = LoopState::ShuttingDown;

        self.source.release();
        if self.servo_enabled && self.config.home_on_shutdown {
            self.home_actuator();
        }
        if let Err(e) = self.actuator.release() {
            warn!("⚠️ 舵机释放失败: {}", e);
        }

        self.state = LoopState::Terminated;
        info!(
            "👋 追踪结束: {}帧, 跳过{}帧, 舵机故障{}次",
            self.stats.frames, self.stats.skipped, self.stats.driver_faults
        );
    }
}

impl Drop for ControlLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}
