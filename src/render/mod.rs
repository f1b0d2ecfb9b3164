/// 渲染系统 (Render System)
///
/// 渲染属于外部组件,控制循环每帧调用一次 `RenderSink::draw`,不关心返回
/// - StatusRenderer:  周期性日志状态行 (无窗口模式)
/// - OverlayRenderer: 在帧上绘制检测框与准星,按间隔保存为图片
pub mod overlay;
pub mod status;

pub use overlay::OverlayRenderer;
pub use status::StatusRenderer;

use crate::actuator::ActuatorSnapshot;
use crate::detection::{Detection, Target};
use crate::input::Frame;

pub trait RenderSink {
    fn draw(
        &mut self,
        frame: &Frame,
        detections: &[Detection],
        target: Option<&Target<'_>>,
        actuator: ActuatorSnapshot,
    );
}

/// 多个渲染器依次调用
impl RenderSink for Vec<Box<dyn RenderSink>> {
    fn draw(
        &mut self,
        frame: &Frame,
        detections: &[Detection],
        target: Option<&Target<'_>>,
        actuator: ActuatorSnapshot,
    ) {
        for sink in self.iter_mut() {
            sink.draw(frame, detections, target, actuator);
        }
    }
}

/// 不做任何渲染
pub struct NullRenderer;

impl RenderSink for NullRenderer {
    fn draw(&mut self, _: &Frame, _: &[Detection], _: Option<&Target<'_>>, _: ActuatorSnapshot) {}
}
