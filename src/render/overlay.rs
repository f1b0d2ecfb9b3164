// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 叠加层渲染器
//!
//! - 追踪目标: 绿色粗框 + 准星
//! - 其他检测: 橙色细框
//! - 画面中心: 灰色小圆
//!
//! 每 N 帧把叠加结果保存为 PNG (目录按启动时间命名)

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use tracing::{info, warn};

use super::RenderSink;
use crate::actuator::ActuatorSnapshot;
use crate::detection::{BBox, Detection, Target};
use crate::input::Frame;

const TRACKED_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const OTHER_COLOR: Rgb<u8> = Rgb([255, 165, 0]);
const CENTER_COLOR: Rgb<u8> = Rgb([128, 128, 128]);

/// 生成叠加后的图像 (不修改原帧)
pub fn render_overlay(
    frame: &Frame,
    detections: &[Detection],
    target: Option<&Target<'_>>,
) -> RgbImage {
    let mut canvas = frame.image.clone();

    for (i, det) in detections.iter().enumerate() {
        let tracked = target.is_some_and(|t| t.index == i);
        let (color, thickness) = if tracked {
            (TRACKED_COLOR, 3)
        } else {
            (OTHER_COLOR, 2)
        };
        draw_box(&mut canvas, &det.bbox, color, thickness);
    }

    if let Some(t) = target {
        let (cx, cy) = (t.center.x, t.center.y);
        draw_hollow_circle_mut(&mut canvas, (cx as i32, cy as i32), 12, TRACKED_COLOR);
        draw_line_segment_mut(&mut canvas, (cx - 20.0, cy), (cx + 20.0, cy), TRACKED_COLOR);
        draw_line_segment_mut(&mut canvas, (cx, cy - 20.0), (cx, cy + 20.0), TRACKED_COLOR);
    }

    let center = ((frame.width() / 2) as i32, (frame.height() / 2) as i32);
    draw_hollow_circle_mut(&mut canvas, center, 6, CENTER_COLOR);

    canvas
}

/// 画框,向内收缩实现线宽
fn draw_box(canvas: &mut RgbImage, bbox: &BBox, color: Rgb<u8>, thickness: u32) {
    for k in 0..thickness {
        let w = bbox.width as i64 - 2 * k as i64;
        let h = bbox.height as i64 - 2 * k as i64;
        if w <= 0 || h <= 0 {
            break;
        }
        let rect = Rect::at(bbox.x as i32 + k as i32, bbox.y as i32 + k as i32)
            .of_size(w as u32, h as u32);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

pub struct OverlayRenderer {
    output_dir: PathBuf,
    every: u64,
    saved: u64,
    disabled: bool,
}

impl OverlayRenderer {
    /// 在 `root` 下创建以启动时间命名的子目录,每 `every` 帧保存一张
    pub fn new<P: AsRef<Path>>(root: P, every: u64) -> Self {
        let stamp = crate::gen_time_string("_");
        Self::with_output_dir(root.as_ref().join(stamp), every)
    }

    pub fn with_output_dir<P: AsRef<Path>>(dir: P, every: u64) -> Self {
        Self {
            output_dir: dir.as_ref().to_path_buf(),
            every: every.max(1),
            saved: 0,
            disabled: false,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn saved(&self) -> u64 {
        self.saved
    }

    fn save(&mut self, frame_id: u64, image: &RgbImage) -> Result<(), String> {
        if self.saved == 0 {
            fs::create_dir_all(&self.output_dir).map_err(|e| e.to_string())?;
            info!("🖼️ 叠加图像保存到 {}", self.output_dir.display());
        }
        let path = self.output_dir.join(format!("frame_{:06}.png", frame_id));
        image.save(&path).map_err(|e| e.to_string())?;
        self.saved += 1;
        Ok(())
    }
}

impl RenderSink for OverlayRenderer {
    fn draw(
        &mut self,
        frame: &Frame,
        detections: &[Detection],
        target: Option<&Target<'_>>,
        _actuator: ActuatorSnapshot,
    ) {
        if self.disabled || frame.frame_id % self.every != 0 {
            return;
        }
        let canvas = render_overlay(frame, detections, target);
        if let Err(e) = self.save(frame.frame_id, &canvas) {
            // 渲染失败不影响追踪,停止后续保存
            warn!("⚠️ 保存叠加图像失败,已停用: {}", e);
            self.disabled = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::ObjectClass;

    fn scene() -> (Frame, Vec<Detection>) {
        let frame = Frame::blank(0, 200, 100);
        let dets = vec![
            Detection::new(ObjectClass::Cat, 0.9, BBox::new(10., 10., 30., 30.)),
            Detection::new(ObjectClass::Person, 0.8, BBox::new(100., 20., 60., 60.)),
        ];
        (frame, dets)
    }

    #[test]
    fn test_overlay_colors() {
        let (frame, dets) = scene();
        let target = Target {
            detection: &dets[1],
            index: 1,
            center: dets[1].bbox.center(),
        };
        let canvas = render_overlay(&frame, &dets, Some(&target));

        assert_eq!(*canvas.get_pixel(10, 10), OTHER_COLOR);
        assert_eq!(*canvas.get_pixel(100, 20), TRACKED_COLOR);
        // 第三层线宽
        assert_eq!(*canvas.get_pixel(102, 40), TRACKED_COLOR);
        // 准星水平线
        assert_eq!(*canvas.get_pixel(125, 50), TRACKED_COLOR);
        // 画面中心圆 (半径6)
        assert_eq!(*canvas.get_pixel(106, 50), CENTER_COLOR);
        // 原帧不变
        assert_eq!(*frame.image.get_pixel(10, 10), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_degenerate_box_is_skipped() {
        let frame = Frame::blank(0, 50, 50);
        let dets = vec![Detection::new(
            ObjectClass::Cat,
            0.9,
            BBox::new(5., 5., 0., 12.),
        )];
        let canvas = render_overlay(&frame, &dets, None);
        assert_eq!(*canvas.get_pixel(5, 5), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_saves_every_nth_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = OverlayRenderer::with_output_dir(dir.path().join("run"), 2);
        let snapshot = ActuatorSnapshot {
            pan: 90.0,
            tilt: 90.0,
        };
        for id in 0..5 {
            renderer.draw(&Frame::blank(id, 16, 16), &[], None, snapshot);
        }
        assert_eq!(renderer.saved(), 3);
        assert!(renderer.output_dir().join("frame_000004.png").exists());
        assert!(!renderer.output_dir().join("frame_000001.png").exists());
    }
}
