// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 云台执行器 (Actuator State)
//!
//! 保存当前水平/俯仰角度,每次更新后截断到配置范围,再写入舵机驱动。
//! 驱动写入失败不回滚逻辑角度,以保证后续增量计算一致

pub mod driver;
pub mod pca9685;
pub mod sweep;

use std::fmt;

use tracing::warn;

pub use driver::{resolve_driver, DriverRequest, MockLog, MockServo, ServoDriver, MOCK_HISTORY};
pub use pca9685::Pca9685Servo;
pub use sweep::{sweep_once, sweep_path, SweepOutcome};

use crate::config::{AngleRange, TrackingConfig};
use crate::error::DriverError;

/// 控制轴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Pan,  // 水平
    Tilt, // 俯仰
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Pan => f.write_str("pan"),
            Axis::Tilt => f.write_str("tilt"),
        }
    }
}

/// 一次执行的结果: 新角度 + 可恢复的驱动故障
#[derive(Debug)]
pub struct Actuation {
    pub angle: f32,
    pub fault: Option<DriverError>,
}

/// 角度快照 (用于渲染)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorSnapshot {
    pub pan: f32,
    pub tilt: f32,
}

pub struct ActuatorState {
    pan: f32,
    tilt: f32,
    pan_range: AngleRange,
    tilt_range: AngleRange,
    home: ActuatorSnapshot,
    driver: Box<dyn ServoDriver>,
}

impl ActuatorState {
    /// 逻辑角度初始化为配置的初始角度 (不写驱动,见 [`ActuatorState::home`])
    pub fn new(config: &TrackingConfig, driver: Box<dyn ServoDriver>) -> Self {
        Self {
            pan: config.pan.range.clamp(config.pan.home),
            tilt: config.tilt.range.clamp(config.tilt.home),
            pan_range: config.pan.range,
            tilt_range: config.tilt.range,
            home: ActuatorSnapshot {
                pan: config.pan.home,
                tilt: config.tilt.home,
            },
            driver,
        }
    }

    pub fn angle(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Pan => self.pan,
            Axis::Tilt => self.tilt,
        }
    }

    pub fn range(&self, axis: Axis) -> AngleRange {
        match axis {
            Axis::Pan => self.pan_range,
            Axis::Tilt => self.tilt_range,
        }
    }

    pub fn snapshot(&self) -> ActuatorSnapshot {
        ActuatorSnapshot {
            pan: self.pan,
            tilt: self.tilt,
        }
    }

    pub fn driver_name(&self) -> &str {
        self.driver.name()
    }

    /// 应用角度增量: `clamp(current + delta)` 后写入驱动
    ///
    /// 任意增量 (含 ±inf) 都落在范围内; NaN 增量按0处理
    pub fn apply(&mut self, axis: Axis, delta: f32) -> Actuation {
        let delta = if delta.is_nan() {
            warn!("⚠️ {} 收到NaN增量,已忽略", axis);
            0.0
        } else {
            delta
        };
        let angle = self.range(axis).clamp(self.angle(axis) + delta);
        self.write(axis, angle)
    }

    /// 移动到绝对角度 (同样经过截断)
    pub fn move_to(&mut self, axis: Axis, angle: f32) -> Actuation {
        let angle = if angle.is_nan() { self.angle(axis) } else { angle };
        let angle = self.range(axis).clamp(angle);
        self.write(axis, angle)
    }

    /// 回到初始角度
    pub fn home(&mut self) -> Vec<Actuation> {
        let home = self.home;
        vec![
            self.move_to(Axis::Pan, home.pan),
            self.move_to(Axis::Tilt, home.tilt),
        ]
    }

    pub fn release(&mut self) -> Result<(), DriverError> {
        self.driver.release()
    }

    fn write(&mut self, axis: Axis, angle: f32) -> Actuation {
        match axis {
            Axis::Pan => self.pan = angle,
            Axis::Tilt => self.tilt = angle,
        }
        Actuation {
            angle,
            fault: self.driver.apply(axis, angle).err(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AxisConfig;

    /// 总是写入失败的驱动
    struct BrokenServo;

    impl ServoDriver for BrokenServo {
        fn apply(&mut self, _axis: Axis, _angle: f32) -> Result<(), DriverError> {
            Err(DriverError::Write("i2c timeout".into()))
        }

        fn release(&mut self) -> Result<(), DriverError> {
            Ok(())
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn full_range_config(pan_home: f32) -> TrackingConfig {
        TrackingConfig {
            pan: AxisConfig {
                range: AngleRange::new(0.0, 180.0),
                home: pan_home,
                inverted: false,
                channel: 0,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_clamps_at_upper_bound() {
        let mock = MockServo::new();
        let log = mock.log();
        let mut actuator = ActuatorState::new(&full_range_config(175.0), Box::new(mock));

        let result = actuator.apply(Axis::Pan, 20.0);
        assert_eq!(result.angle, 180.0);
        assert!(result.fault.is_none());
        assert_eq!(actuator.angle(Axis::Pan), 180.0);
        assert_eq!(log.lock().unwrap().pan, Some(180.0));
    }

    #[test]
    fn test_clamp_is_total() {
        let mut actuator =
            ActuatorState::new(&TrackingConfig::default(), Box::new(MockServo::new()));
        for axis in [Axis::Pan, Axis::Tilt] {
            let range = actuator.range(axis);
            for delta in [f32::INFINITY, f32::NEG_INFINITY, 1e30, -1e30, f32::MAX, 0.5] {
                let angle = actuator.apply(axis, delta).angle;
                assert!(range.contains(angle), "{} delta {} -> {}", axis, delta, angle);
            }
        }
        assert_eq!(actuator.apply(Axis::Pan, f32::INFINITY).angle, 150.0);
        assert_eq!(actuator.apply(Axis::Pan, f32::NEG_INFINITY).angle, 30.0);
    }

    #[test]
    fn test_nan_delta_is_ignored() {
        let mut actuator =
            ActuatorState::new(&TrackingConfig::default(), Box::new(MockServo::new()));
        let before = actuator.angle(Axis::Tilt);
        assert_eq!(actuator.apply(Axis::Tilt, f32::NAN).angle, before);
    }

    #[test]
    fn test_zero_delta_keeps_angle() {
        let mut actuator =
            ActuatorState::new(&TrackingConfig::default(), Box::new(MockServo::new()));
        assert_eq!(actuator.apply(Axis::Pan, 0.0).angle, 90.0);
        assert_eq!(actuator.snapshot(), ActuatorSnapshot { pan: 90.0, tilt: 90.0 });
    }

    #[test]
    fn test_write_failure_keeps_logical_state() {
        let mut actuator =
            ActuatorState::new(&TrackingConfig::default(), Box::new(BrokenServo));
        let result = actuator.apply(Axis::Pan, 9.0);
        assert_eq!(result.angle, 99.0);
        assert!(matches!(result.fault, Some(DriverError::Write(_))));
        assert_eq!(actuator.angle(Axis::Pan), 99.0);

        // 后续增量基于逻辑角度继续累加
        assert_eq!(actuator.apply(Axis::Pan, 1.0).angle, 100.0);
    }

    #[test]
    fn test_move_to_and_home() {
        let mock = MockServo::new();
        let log = mock.log();
        let mut actuator = ActuatorState::new(&TrackingConfig::default(), Box::new(mock));

        assert_eq!(actuator.move_to(Axis::Tilt, 10.0).angle, 50.0);
        assert_eq!(actuator.move_to(Axis::Pan, 120.0).angle, 120.0);

        let results = actuator.home();
        assert!(results.iter().all(|r| r.fault.is_none()));
        assert_eq!(actuator.snapshot(), ActuatorSnapshot { pan: 90.0, tilt: 90.0 });
        let log = log.lock().unwrap();
        assert_eq!((log.pan, log.tilt), (Some(90.0), Some(90.0)));
    }
}
