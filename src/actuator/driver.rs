// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 舵机驱动能力 (Driver capability)
//!
//! 启动时探测一次: 真实硬件可用则用 PCA9685,否则降级为模拟驱动,运行期间不再切换

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use super::pca9685::Pca9685Servo;
use super::Axis;
use crate::config::TrackingConfig;
use crate::error::DriverError;

/// 舵机驱动接口
pub trait ServoDriver: Send {
    /// 写入目标角度 (调用方保证角度已截断到合法范围)
    fn apply(&mut self, axis: Axis, angle: f32) -> Result<(), DriverError>;

    /// 释放硬件
    fn release(&mut self) -> Result<(), DriverError>;

    fn name(&self) -> &str;
}

/// 模拟驱动保留的最近写入条数
pub const MOCK_HISTORY: usize = 256;

/// 模拟驱动记录的状态
///
/// 只保留最近 [`MOCK_HISTORY`] 次写入,长时间运行内存不增长
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockLog {
    pub pan: Option<f32>,
    pub tilt: Option<f32>,
    /// 累计写入次数
    pub write_count: u64,
    /// 最近的写入 (旧 → 新)
    pub recent: VecDeque<(Axis, f32)>,
    pub released: bool,
}

impl MockLog {
    fn record(&mut self, axis: Axis, angle: f32) {
        match axis {
            Axis::Pan => self.pan = Some(angle),
            Axis::Tilt => self.tilt = Some(angle),
        }
        self.write_count += 1;
        if self.recent.len() == MOCK_HISTORY {
            self.recent.pop_front();
        }
        self.recent.push_back((axis, angle));
    }
}

/// 模拟舵机: 只记录角度,不做任何硬件IO
#[derive(Clone, Default)]
pub struct MockServo {
    log: Arc<Mutex<MockLog>>,
}

impl MockServo {
    pub fn new() -> Self {
        Self::default()
    }

    /// 共享日志句柄 (驱动移交给执行器后仍可查看)
    pub fn log(&self) -> Arc<Mutex<MockLog>> {
        Arc::clone(&self.log)
    }

    fn with_log<T>(&self, f: impl FnOnce(&mut MockLog) -> T) -> T {
        // 日志只在本线程写入,锁中毒时沿用内部数据
        let mut log = self.log.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut log)
    }
}

impl ServoDriver for MockServo {
    fn apply(&mut self, axis: Axis, angle: f32) -> Result<(), DriverError> {
        debug!("[mock] {} -> {:.1}", axis, angle);
        self.with_log(|log| log.record(axis, angle));
        Ok(())
    }

    fn release(&mut self) -> Result<(), DriverError> {
        self.with_log(|log| log.released = true);
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// 驱动选择请求
#[derive(Debug, Clone, PartialEq)]
pub enum DriverRequest {
    /// 不使用硬件 (--no-servo / --mock)
    Mock,
    /// PCA9685 (Linux i2c-dev)
    Pca9685 { bus: u8, address: u16 },
}

/// 探测并创建舵机驱动; 真实驱动不可用时降级为模拟驱动 (不是致命错误)
///
/// 返回驱动和用于日志的描述
pub fn resolve_driver(
    request: &DriverRequest,
    config: &TrackingConfig,
) -> (Box<dyn ServoDriver>, String) {
    match request {
        DriverRequest::Mock => (Box::new(MockServo::new()), "mock (--no-servo)".to_string()),
        DriverRequest::Pca9685 { bus, address } => {
            match Pca9685Servo::open(*bus, *address, config.pan.channel, config.tilt.channel) {
                Ok(servo) => {
                    info!("✅ 舵机驱动: PCA9685 (i2c-{} @ {:#04x})", bus, address);
                    (Box::new(servo), "PCA9685".to_string())
                }
                Err(e) => {
                    warn!("⚠️ 舵机硬件不可用,使用模拟驱动: {}", e);
                    warn!("💡 提示: 检查I2C是否启用 (/dev/i2c-{}) 及接线", bus);
                    (Box::new(MockServo::new()), "mock (硬件不可用)".to_string())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_records_writes() {
        let mut servo = MockServo::new();
        let log = servo.log();
        servo.apply(Axis::Pan, 100.0).unwrap();
        servo.apply(Axis::Tilt, 60.0).unwrap();
        servo.apply(Axis::Pan, 101.5).unwrap();
        servo.release().unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log.pan, Some(101.5));
        assert_eq!(log.tilt, Some(60.0));
        assert_eq!(log.write_count, 3);
        assert_eq!(log.recent.len(), 3);
        assert!(log.released);
    }

    #[test]
    fn test_mock_history_is_bounded() {
        let mut servo = MockServo::new();
        let log = servo.log();
        for i in 0..100_000u32 {
            servo.apply(Axis::Pan, (i % 180) as f32).unwrap();
        }

        let log = log.lock().unwrap();
        assert_eq!(log.write_count, 100_000);
        assert_eq!(log.recent.len(), MOCK_HISTORY);
        // 最后一次写入 99_999 % 180 = 99
        assert_eq!(log.recent.back(), Some(&(Axis::Pan, 99.0)));
        assert_eq!(log.pan, Some(99.0));
    }

    #[test]
    fn test_missing_hardware_degrades_to_mock() {
        // 不存在的总线号,探测必然失败
        let request = DriverRequest::Pca9685 {
            bus: 250,
            address: 0x40,
        };
        let (driver, label) = resolve_driver(&request, &TrackingConfig::default());
        assert_eq!(driver.name(), "mock");
        assert!(label.starts_with("mock"));
    }

    #[test]
    fn test_mock_request() {
        let (driver, label) = resolve_driver(&DriverRequest::Mock, &TrackingConfig::default());
        assert_eq!(driver.name(), "mock");
        assert_eq!(label, "mock (--no-servo)");
    }
}
