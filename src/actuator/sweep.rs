// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 舵机自检扫描: 水平 min → max → min, 然后俯仰 min → max → min

use std::thread;
use std::time::Duration;

use crossbeam_channel::Receiver;
use tracing::{info, warn};

use super::{ActuatorState, Axis};
use crate::config::AngleRange;

pub const SWEEP_STEP_DEGREES: f32 = 5.0;
pub const SWEEP_STEP_DELAY: Duration = Duration::from_millis(50);

/// 单轴往返路径 (两端都包含)
pub fn sweep_path(range: AngleRange, step: f32) -> Vec<f32> {
    if step.is_nan() || step <= 0.0 {
        return vec![range.min, range.max];
    }
    let mut up = Vec::new();
    let mut angle = range.min;
    while angle <= range.max {
        up.push(angle);
        angle += step;
    }
    let mut down = Vec::new();
    let mut angle = range.max;
    while angle >= range.min {
        down.push(angle);
        angle -= step;
    }
    up.extend(down);
    up
}

/// 扫描结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    Completed,
    Interrupted,
}

/// 依次扫描水平与俯仰轴,每步之间检查退出请求
///
/// 写入失败只记录警告; 返回前不归位,由调用方决定
pub fn sweep_once(
    actuator: &mut ActuatorState,
    step: f32,
    delay: Duration,
    quit: &Receiver<()>,
) -> SweepOutcome {
    for axis in [Axis::Pan, Axis::Tilt] {
        let range = actuator.range(axis);
        info!("↔️ 扫描 {}: {} → {} → {}", axis, range.min, range.max, range.min);
        for angle in sweep_path(range, step) {
            if quit.try_recv().is_ok() {
                return SweepOutcome::Interrupted;
            }
            if let Some(fault) = actuator.move_to(axis, angle).fault {
                warn!("⚠️ {} 写入失败 (角度 {}): {}", axis, angle, fault);
            }
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
    }
    SweepOutcome::Completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::MockServo;
    use crate::config::TrackingConfig;

    #[test]
    fn test_path_covers_both_ends() {
        let path = sweep_path(AngleRange::new(30.0, 50.0), 5.0);
        assert_eq!(
            path,
            vec![30.0, 35.0, 40.0, 45.0, 50.0, 50.0, 45.0, 40.0, 35.0, 30.0]
        );
    }

    #[test]
    fn test_path_with_uneven_step_stays_in_range() {
        let range = AngleRange::new(50.0, 130.0);
        let path = sweep_path(range, 7.0);
        assert!(path.iter().all(|a| range.contains(*a)));
        assert_eq!(path.first(), Some(&50.0));
        assert_eq!(path.last(), Some(&53.0));
    }

    #[test]
    fn test_sweep_visits_pan_then_tilt() {
        let mock = MockServo::new();
        let log = mock.log();
        let mut actuator = ActuatorState::new(&TrackingConfig::default(), Box::new(mock));
        let (_tx, rx) = crossbeam_channel::bounded::<()>(1);

        let outcome = sweep_once(&mut actuator, 5.0, Duration::ZERO, &rx);
        assert_eq!(outcome, SweepOutcome::Completed);

        let log = log.lock().unwrap();
        // pan: 30..=150 往返 25 * 2, tilt: 50..=130 往返 17 * 2
        assert_eq!(log.write_count, 50 + 34);
        assert_eq!(log.recent[0], (Axis::Pan, 30.0));
        assert_eq!(log.recent[50], (Axis::Tilt, 50.0));
        assert_eq!(log.recent.back(), Some(&(Axis::Tilt, 50.0)));
    }

    #[test]
    fn test_sweep_stops_on_quit() {
        let mock = MockServo::new();
        let log = mock.log();
        let mut actuator = ActuatorState::new(&TrackingConfig::default(), Box::new(mock));
        let (tx, rx) = crossbeam_channel::bounded(1);
        tx.send(()).unwrap();

        let outcome = sweep_once(&mut actuator, 5.0, Duration::ZERO, &rx);
        assert_eq!(outcome, SweepOutcome::Interrupted);
        assert_eq!(log.lock().unwrap().write_count, 0);
    }
}
