// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 故障分类 (Fault taxonomy)
//!
//! - 单周期故障 (读帧失败、舵机写入失败): 记录警告后继续
//! - 全局故障 (视频源不可用、连续读帧失败超限、检测器异常): 终止循环

use thiserror::Error;

use crate::config::ConfigError;

/// 视频采集错误
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("无法打开视频源 {source_name}: {message}")]
    Open {
        source_name: String,
        message: String,
    },

    #[error("读帧失败: {0}")]
    ReadFailed(String),
}

/// 检测器错误
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("推理失败: {0}")]
    Inference(String),

    #[error("检测脚本 {path} 第{line}行无效: {message}")]
    Script {
        path: String,
        line: usize,
        message: String,
    },
}

/// 舵机驱动错误
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("舵机驱动不可用: {0}")]
    Unavailable(String),

    #[error("舵机写入失败: {0}")]
    Write(String),

    #[error("当前平台不支持该驱动: {0}")]
    Unsupported(&'static str),
}

/// 控制循环错误 (致命)
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("视频源不可用: {0}")]
    SourceUnavailable(#[source] AcquisitionError),

    #[error("连续{failures}次读帧失败")]
    AcquisitionExhausted {
        failures: u32,
        #[source]
        last: AcquisitionError,
    },

    #[error("检测器异常: {0}")]
    Detector(#[from] DetectorError),
}

impl TrackerError {
    /// 故障类型名称 (用于日志)
    pub fn kind(&self) -> &'static str {
        match self {
            TrackerError::Config(_) => "ConfigFault",
            TrackerError::SourceUnavailable(_) | TrackerError::AcquisitionExhausted { .. } => {
                "FatalAcquisitionFault"
            }
            TrackerError::Detector(_) => "DetectorFault",
        }
    }
}
