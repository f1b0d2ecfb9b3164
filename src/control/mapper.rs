// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 控制映射 (Control Mapper)
//!
//! 归一化误差 → 角度增量。输出不做截断,截断由执行器负责

use crate::config::{AngleRange, AxisConfig};

/// 比例映射: `delta = error * gain * 半跨度`
///
/// `|error| < deadzone` 时输出0,抑制小幅抖动
pub fn map_delta(error: f32, range: AngleRange, gain: f32, deadzone: f32) -> f32 {
    if error.abs() < deadzone {
        return 0.0;
    }
    error * gain * range.half_span()
}

/// 单轴增量,含安装方向修正 (反向安装时误差取反)
pub fn axis_delta(error: f32, axis: &AxisConfig, gain: f32, deadzone: f32) -> f32 {
    let error = if axis.inverted { -error } else { error };
    map_delta(error, axis.range, gain, deadzone)
}
