// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 脚本检测器 - 从JSON Lines文件回放检测结果
//!
//! 每行一帧:
//! ```text
//! {"frame": 0, "detections": [{"class": "cat", "confidence": 0.9, "bbox": [x, y, w, h]}]}
//! ```
//! 文件中未出现的帧视为无检测

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use super::detector::Detector;
use super::types::Detection;
use crate::error::DetectorError;
use crate::input::Frame;

#[derive(Deserialize)]
struct ScriptLine {
    frame: u64,
    #[serde(default)]
    detections: Vec<Detection>,
}

pub struct ScriptedDetector {
    name: String,
    frames: HashMap<u64, Vec<Detection>>,
}

impl ScriptedDetector {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DetectorError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| DetectorError::Script {
            path: path.display().to_string(),
            line: 0,
            message: e.to_string(),
        })?;
        let detector = Self::parse(&path.display().to_string(), &text)?;
        info!(
            "✅ 检测脚本加载成功: {} ({}帧)",
            path.display(),
            detector.frames.len()
        );
        Ok(detector)
    }

    /// 解析JSON Lines文本; 空行和 `#` 开头的行会被忽略
    pub fn parse(name: &str, text: &str) -> Result<Self, DetectorError> {
        let mut frames: HashMap<u64, Vec<Detection>> = HashMap::new();

        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parsed: ScriptLine =
                serde_json::from_str(line).map_err(|e| DetectorError::Script {
                    path: name.to_string(),
                    line: i + 1,
                    message: e.to_string(),
                })?;
            // 同一帧出现多次时按出现顺序追加
            frames
                .entry(parsed.frame)
                .or_default()
                .extend(parsed.detections);
        }

        Ok(Self {
            name: format!("script:{}", name),
            frames,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl Detector for ScriptedDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectorError> {
        let dets = self.frames.get(&frame.frame_id).cloned().unwrap_or_default();
        debug!("帧{}: 脚本检测 {} 个目标", frame.frame_id, dets.len());
        Ok(dets)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
