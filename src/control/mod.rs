/// 闭环控制 (Closed-loop control)
///
/// - Centering: 目标中心 → 归一化误差
/// - Mapper:    归一化误差 → 角度增量 (增益 + 死区)
pub mod centering;
pub mod mapper;

pub use centering::{compute_error, CenteringError};
pub use mapper::{axis_delta, map_delta};
