// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 居中误差计算 (Error Computer)

use crate::detection::Point2;

/// 归一化居中误差,各分量范围 [-1, 1]
///
/// `dx > 0`: 目标在画面中心右侧; `dy > 0`: 目标在中心下方
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CenteringError {
    pub dx: f32,
    pub dy: f32,
}

/// 计算目标中心相对画面中心的归一化误差
///
/// 画面尺寸必须 > 0 (配置校验时保证)。目标中心落在画面外时误差截断到 ±1
pub fn compute_error(center: Point2, frame_width: u32, frame_height: u32) -> CenteringError {
    let half_w = frame_width as f32 / 2.0;
    let half_h = frame_height as f32 / 2.0;
    CenteringError {
        dx: ((center.x - half_w) / half_w).clamp(-1.0, 1.0),
        dy: ((center.y - half_h) / half_h).clamp(-1.0, 1.0),
    }
}
