/// 视频输入系统 (Video Input System)
///
/// 采集本身属于外部组件,控制循环只依赖 `VideoSource` 接口
/// - SyntheticSource:     固定尺寸空白帧 (配合脚本检测器回放)
/// - ImageSequenceSource: 目录中的图片序列
pub mod image_sequence;
pub mod synthetic;

pub use image_sequence::ImageSequenceSource;
pub use synthetic::SyntheticSource;

use image::RgbImage;

use crate::error::AcquisitionError;

/// 采集到的一帧
#[derive(Clone)]
pub struct Frame {
    pub frame_id: u64, // 帧序号
    pub image: RgbImage,
}

impl Frame {
    pub fn new(frame_id: u64, image: RgbImage) -> Self {
        Self { frame_id, image }
    }

    pub fn blank(frame_id: u64, width: u32, height: u32) -> Self {
        Self::new(frame_id, RgbImage::new(width, height))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("frame_id", &self.frame_id)
            .field("size", &format_args!("{}x{}", self.width(), self.height()))
            .finish()
    }
}

/// 视频源接口
pub trait VideoSource {
    /// 打开视频源; 失败视为致命故障
    fn open(&mut self) -> Result<(), AcquisitionError>;

    /// 读取下一帧
    ///
    /// - `Ok(Some(frame))`: 正常帧
    /// - `Ok(None)`: 流结束
    /// - `Err(_)`: 单帧读取失败 (可重试)
    fn read_frame(&mut self) -> Result<Option<Frame>, AcquisitionError>;

    /// 释放视频源
    fn release(&mut self);

    fn name(&self) -> &str;
}
