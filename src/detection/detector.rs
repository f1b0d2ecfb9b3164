// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 检测器统一接口
///
/// 检测模型本身属于外部组件,控制循环只依赖这个接口:
/// 输入一帧,输出该帧全部检测结果 (顺序即检测器返回顺序)
use super::types::Detection;
use crate::error::DetectorError;
use crate::input::Frame;

pub trait Detector {
    /// 检测单帧; 返回错误视为致命故障
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectorError>;

    /// 检测器名称 (用于日志)
    fn name(&self) -> &str;
}

/// 闭包检测器,便于嵌入其他推理后端
impl<F> Detector for F
where
    F: FnMut(&Frame) -> Result<Vec<Detection>, DetectorError>,
{
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectorError> {
        self(frame)
    }

    fn name(&self) -> &str {
        "closure"
    }
}
