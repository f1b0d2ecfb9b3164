// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 图片序列视频源 - 按文件名顺序读取目录中的图片
//!
//! 单张图片解码失败视为单帧读取失败 (跳过该帧),读完全部图片即流结束

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{Frame, VideoSource};
use crate::error::AcquisitionError;

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "webp"];

pub struct ImageSequenceSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    cursor: usize,
    expected_size: Option<(u32, u32)>,
}

impl ImageSequenceSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            files: Vec::new(),
            cursor: 0,
            expected_size: None,
        }
    }

    /// 与配置尺寸不一致的帧会打印警告 (控制量按配置尺寸计算)
    pub fn with_expected_size(mut self, width: u32, height: u32) -> Self {
        self.expected_size = Some((width, height));
        self
    }

    fn is_image(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false)
    }
}

impl VideoSource for ImageSequenceSource {
    fn open(&mut self) -> Result<(), AcquisitionError> {
        let open_err = |message: String| AcquisitionError::Open {
            source_name: self.dir.display().to_string(),
            message,
        };

        let entries = fs::read_dir(&self.dir).map_err(|e| open_err(e.to_string()))?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && Self::is_image(p))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(open_err("目录中没有图片".into()));
        }

        info!("📹 图片序列: {} ({}张)", self.dir.display(), files.len());
        self.files = files;
        self.cursor = 0;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, AcquisitionError> {
        let Some(path) = self.files.get(self.cursor) else {
            return Ok(None);
        };
        let frame_id = self.cursor as u64;
        self.cursor += 1;

        let image = image::open(path)
            .map_err(|e| AcquisitionError::ReadFailed(format!("{}: {}", path.display(), e)))?
            .to_rgb8();

        if let Some((w, h)) = self.expected_size {
            if image.width() != w || image.height() != h {
                warn!(
                    "⚠️ {} 尺寸 {}x{} 与配置 {}x{} 不一致",
                    path.display(),
                    image.width(),
                    image.height(),
                    w,
                    h
                );
            }
        }

        Ok(Some(Frame::new(frame_id, image)))
    }

    fn release(&mut self) {
        self.files.clear();
        self.cursor = 0;
    }

    fn name(&self) -> &str {
        "image-sequence"
    }
}
