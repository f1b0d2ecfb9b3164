// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 目标选择器 (Target Selector)
//!
//! 每帧独立选择: 类别过滤 → 尺寸过滤 → 面积最大者,不保留跨帧身份

use super::types::{Detection, Target};
use crate::config::TrackingConfig;

/// 检测结果是否满足追踪条件 (类别 + 最小尺寸,阈值含等于)
pub fn qualifies(detection: &Detection, config: &TrackingConfig) -> bool {
    config.tracked_classes.contains(&detection.class)
        && detection.bbox.width >= config.min_box_width
        && detection.bbox.height >= config.min_box_height
}

/// 选择本帧追踪目标
///
/// 面积相同时取输入序列中靠前的一个; 没有符合条件的检测返回 `None`
pub fn select<'a>(detections: &'a [Detection], config: &TrackingConfig) -> Option<Target<'a>> {
    let mut best: Option<(usize, &Detection, f32)> = None;

    for (index, det) in detections.iter().enumerate() {
        if !qualifies(det, config) {
            continue;
        }
        // NaN / 无穷面积无法比较大小
        let area = det.bbox.area();
        if !area.is_finite() {
            continue;
        }
        // 严格大于才替换,保证先出现者胜出
        let replace = match best {
            Some((_, _, best_area)) => area > best_area,
            None => true,
        };
        if replace {
            best = Some((index, det, area));
        }
    }

    best.map(|(index, detection, _)| Target {
        detection,
        index,
        center: detection.bbox.center(),
    })
}
