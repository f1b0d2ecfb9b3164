// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 合成视频源 - 生成固定尺寸的空白帧

use tracing::info;

use super::{Frame, VideoSource};
use crate::error::AcquisitionError;

pub struct SyntheticSource {
    width: u32,
    height: u32,
    frame_limit: Option<u64>,
    next_id: u64,
    opened: bool,
}

impl SyntheticSource {
    /// `frame_limit` 为 `None` 时无限输出
    pub fn new(width: u32, height: u32, frame_limit: Option<u64>) -> Self {
        Self {
            width,
            height,
            frame_limit,
            next_id: 0,
            opened: false,
        }
    }
}

impl VideoSource for SyntheticSource {
    fn open(&mut self) -> Result<(), AcquisitionError> {
        if self.width == 0 || self.height == 0 {
            return Err(AcquisitionError::Open {
                source_name: self.name().to_string(),
                message: format!("画面尺寸无效: {}x{}", self.width, self.height),
            });
        }
        self.opened = true;
        info!("📹 合成视频源: {}x{}", self.width, self.height);
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, AcquisitionError> {
        if !self.opened {
            return Err(AcquisitionError::ReadFailed("视频源未打开".into()));
        }
        if self.frame_limit.is_some_and(|limit| self.next_id >= limit) {
            return Ok(None);
        }
        let frame = Frame::blank(self.next_id, self.width, self.height);
        self.next_id += 1;
        Ok(Some(frame))
    }

    fn release(&mut self) {
        self.opened = false;
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
