// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 追踪配置 - 启动时构建一次,运行期间只读
//!
//! 可通过JSON文件调整参数,命令行参数会覆盖文件中的值

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::actuator::Axis;
use crate::detection::ObjectClass;

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("配置无效: {0}")]
    Invalid(String),

    #[error("读写配置文件 {path} 失败: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件解析失败: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 角度范围 (度)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AngleRange {
    pub min: f32,
    pub max: f32,
}

impl AngleRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// 半跨度: 归一化误差为1.0时对应的摆动幅度
    pub fn half_span(&self) -> f32 {
        (self.max - self.min) * 0.5
    }

    pub fn clamp(&self, angle: f32) -> f32 {
        angle.clamp(self.min, self.max)
    }

    pub fn contains(&self, angle: f32) -> bool {
        angle >= self.min && angle <= self.max
    }
}

/// 单轴参数
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub range: AngleRange,
    pub home: f32,
    /// 安装方向与图像坐标相反时置true
    #[serde(default)]
    pub inverted: bool,
    /// PCA9685 通道号
    pub channel: u8,
}

/// 无目标时的水平扫描
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    pub enabled: bool,
    /// 每帧水平转动角度
    pub step_degrees: f32,
    /// 连续无目标帧数达到该值后开始扫描 (避免闪烁)
    pub start_after_frames: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            step_degrees: 2.0,
            start_after_frames: 10,
        }
    }
}

/// 追踪参数配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    // === 目标选择 ===
    pub tracked_classes: BTreeSet<ObjectClass>,
    pub min_box_width: f32,  // 最小框宽(像素),含等于
    pub min_box_height: f32, // 最小框高(像素),含等于

    // === 控制参数 ===
    pub gain: f32,     // 比例增益, 0 = 冻结
    pub deadzone: f32, // 死区 (归一化误差)

    // === 云台 ===
    pub pan: AxisConfig,
    pub tilt: AxisConfig,

    // === 画面 ===
    pub frame_width: u32,
    pub frame_height: u32,

    // === 运行策略 ===
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default = "default_max_read_failures")]
    pub max_consecutive_read_failures: u32,
    #[serde(default = "default_true")]
    pub home_on_shutdown: bool,
}

fn default_max_read_failures() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            tracked_classes: [ObjectClass::Cat, ObjectClass::Person].into_iter().collect(),
            min_box_width: 0.0,
            min_box_height: 0.0,

            gain: 0.55,
            deadzone: 0.05,

            // Arducam 云台: 0=水平, 1=俯仰
            pan: AxisConfig {
                range: AngleRange::new(30.0, 150.0),
                home: 90.0,
                inverted: false,
                channel: 0,
            },
            tilt: AxisConfig {
                range: AngleRange::new(50.0, 130.0),
                home: 90.0,
                inverted: false,
                channel: 1,
            },

            frame_width: 640,
            frame_height: 480,

            scan: ScanConfig::default(),
            max_consecutive_read_failures: default_max_read_failures(),
            home_on_shutdown: true,
        }
    }
}

impl TrackingConfig {
    pub fn axis(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::Pan => &self.pan,
            Axis::Tilt => &self.tilt,
        }
    }

    /// 校验配置不变量
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracked_classes.is_empty() {
            return Err(ConfigError::Invalid("追踪类别不能为空".into()));
        }
        if let Some(c) = self.tracked_classes.iter().find(|c| !c.is_trackable()) {
            return Err(ConfigError::Invalid(format!("类别 {} 不可追踪", c)));
        }
        if !(self.min_box_width >= 0.0 && self.min_box_height >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "最小框尺寸必须 >= 0 (当前 {}x{})",
                self.min_box_width, self.min_box_height
            )));
        }
        if !self.gain.is_finite() || self.gain < 0.0 {
            return Err(ConfigError::Invalid(format!("增益必须为非负有限值: {}", self.gain)));
        }
        if !self.deadzone.is_finite() || self.deadzone < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "死区必须为非负有限值: {}",
                self.deadzone
            )));
        }
        for axis in [Axis::Pan, Axis::Tilt] {
            let cfg = self.axis(axis);
            let r = cfg.range;
            if !r.min.is_finite() || !r.max.is_finite() || r.min > r.max {
                return Err(ConfigError::Invalid(format!(
                    "{}角度范围无效: [{}, {}]",
                    axis, r.min, r.max
                )));
            }
            if !r.contains(cfg.home) {
                return Err(ConfigError::Invalid(format!(
                    "{}初始角度 {} 超出范围 [{}, {}]",
                    axis, cfg.home, r.min, r.max
                )));
            }
        }
        if self.pan.channel == self.tilt.channel {
            return Err(ConfigError::Invalid(format!(
                "水平/俯仰舵机通道重复: {}",
                self.pan.channel
            )));
        }
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "画面尺寸必须 > 0 (当前 {}x{})",
                self.frame_width, self.frame_height
            )));
        }
        if !self.scan.step_degrees.is_finite() || self.scan.step_degrees < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "扫描步长无效: {}",
                self.scan.step_degrees
            )));
        }
        Ok(())
    }

    /// 从JSON文件加载配置 (加载后立即校验)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        info!("✅ 配置已从 {} 加载", path.display());
        Ok(config)
    }

    /// 保存配置到JSON文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        info!("💾 配置已保存到 {}", path.display());
        Ok(())
    }

    /// 打印当前配置
    pub fn log_summary(&self) {
        let classes: Vec<&str> = self.tracked_classes.iter().map(|c| c.as_str()).collect();
        info!("🎛️  追踪类别: {}", classes.join(","));
        info!(
            "  增益: {:.2} | 死区: {:.2} | 最小框: {}x{}",
            self.gain, self.deadzone, self.min_box_width, self.min_box_height
        );
        info!(
            "  水平: [{}, {}] 初始{}{} | 俯仰: [{}, {}] 初始{}{}",
            self.pan.range.min,
            self.pan.range.max,
            self.pan.home,
            if self.pan.inverted { " (反向)" } else { "" },
            self.tilt.range.min,
            self.tilt.range.max,
            self.tilt.home,
            if self.tilt.inverted { " (反向)" } else { "" },
        );
        info!("  画面: {}x{}", self.frame_width, self.frame_height);
    }
}
