/// 检测系统 (Detection System)
///
/// - Types:    检测数据结构
/// - Detector: 检测器接口 (外部推理后端)
/// - Scripted: 脚本回放检测器
/// - Selector: 追踪目标选择
pub mod detector;
pub mod scripted;
pub mod selector;
pub mod types;

pub use detector::Detector;
pub use scripted::ScriptedDetector;
pub use selector::{qualifies, select};
pub use types::{BBox, Detection, ObjectClass, Point2, Target};
