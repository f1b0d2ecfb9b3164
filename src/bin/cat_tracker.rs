// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 猫咪追踪 (Cat Tracker)
///
/// 检测画面中的猫/人,驱动双轴云台让目标保持在画面中心
///
/// 主程序入口: cargo run --bin cat_tracker -- --detections dets.jsonl --max-frames 300
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use cat_tracker::actuator::pca9685::DEFAULT_ADDRESS;
use cat_tracker::actuator::{resolve_driver, DriverRequest};
use cat_tracker::detection::ScriptedDetector;
use cat_tracker::input::{ImageSequenceSource, SyntheticSource};
use cat_tracker::render::{OverlayRenderer, StatusRenderer};
use cat_tracker::{
    Collaborators, ControlLoop, Detection, Detector, DetectorError, Frame, ObjectClass,
    RenderSink, TrackingConfig, VideoSource,
};

/// 猫咪追踪参数
#[derive(Parser, Debug)]
#[command(author, version, about = "猫咪追踪 - 云台闭环控制", long_about = None)]
struct Args {
    /// 配置文件 (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 追踪类别,逗号分隔 (cat,person)
    #[arg(short, long, value_delimiter = ',')]
    track: Option<Vec<ObjectClass>>,

    /// 比例增益 (0 = 冻结云台)
    #[arg(long)]
    gain: Option<f32>,

    /// 死区 (归一化误差)
    #[arg(long)]
    deadzone: Option<f32>,

    /// 最小框宽 (像素)
    #[arg(long)]
    min_width: Option<f32>,

    /// 最小框高 (像素)
    #[arg(long)]
    min_height: Option<f32>,

    /// 不驱动舵机,只检测与显示
    #[arg(long)]
    no_servo: bool,

    /// 水平舵机反向安装
    #[arg(long)]
    invert_pan: bool,

    /// 俯仰舵机反向安装
    #[arg(long)]
    invert_tilt: bool,

    /// 无目标时不扫描
    #[arg(long)]
    no_scan: bool,

    /// I2C 总线号 (/dev/i2c-N)
    #[arg(long, default_value_t = 1)]
    i2c_bus: u8,

    /// PCA9685 地址 (支持 0x 前缀)
    #[arg(long, value_parser = parse_address)]
    i2c_address: Option<u16>,

    /// 图片序列目录 (不指定则使用合成空白帧)
    #[arg(long)]
    frames_dir: Option<PathBuf>,

    /// 检测脚本 (JSON Lines)
    #[arg(short, long)]
    detections: Option<PathBuf>,

    /// 合成帧数上限 (不指定则一直运行)
    #[arg(long)]
    max_frames: Option<u64>,

    /// 叠加图像输出目录
    #[arg(long)]
    overlay_dir: Option<PathBuf>,

    /// 每N帧保存一张叠加图像
    #[arg(long, default_value_t = 10)]
    overlay_every: u64,

    /// 状态行输出间隔 (秒)
    #[arg(long, default_value_t = 2.0)]
    status_secs: f64,

    /// 调试输出
    #[arg(long)]
    debug: bool,

    /// 把生效的配置写入文件
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn parse_address(s: &str) -> Result<u16, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|e| format!("无效的I2C地址 {}: {}", s, e))
}

/// 配置文件 + 命令行覆盖,合并后校验
fn build_config(args: &Args) -> Result<TrackingConfig> {
    let mut config = match &args.config {
        Some(path) => TrackingConfig::load(path)
            .with_context(|| format!("加载配置失败: {}", path.display()))?,
        None => TrackingConfig::default(),
    };

    if let Some(classes) = &args.track {
        config.tracked_classes = classes.iter().copied().collect();
    }
    if let Some(gain) = args.gain {
        config.gain = gain;
    }
    if let Some(deadzone) = args.deadzone {
        config.deadzone = deadzone;
    }
    if let Some(w) = args.min_width {
        config.min_box_width = w;
    }
    if let Some(h) = args.min_height {
        config.min_box_height = h;
    }
    if args.invert_pan {
        config.pan.inverted = true;
    }
    if args.invert_tilt {
        config.tilt.inverted = true;
    }
    if args.no_scan {
        config.scan.enabled = false;
    }

    config.validate().context("配置无效")?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    cat_tracker::init_logging(args.debug);

    ensure!(
        args.status_secs.is_finite() && args.status_secs >= 0.0,
        "状态行间隔无效: {}",
        args.status_secs
    );

    info!("🚀 猫咪追踪启动");
    let config = build_config(&args)?;
    config.log_summary();

    if let Some(path) = &args.write_config {
        config
            .save(path)
            .with_context(|| format!("写入配置失败: {}", path.display()))?;
    }

    // ========== 舵机驱动 (启动时探测一次) ==========
    let servo_enabled = !args.no_servo;
    let request = if servo_enabled {
        DriverRequest::Pca9685 {
            bus: args.i2c_bus,
            address: args.i2c_address.unwrap_or(DEFAULT_ADDRESS),
        }
    } else {
        DriverRequest::Mock
    };
    let (driver, driver_label) = resolve_driver(&request, &config);
    info!("🔧 舵机驱动: {}", driver_label);

    // ========== 视频源 ==========
    let source: Box<dyn VideoSource> = match &args.frames_dir {
        Some(dir) => Box::new(
            ImageSequenceSource::new(dir)
                .with_expected_size(config.frame_width, config.frame_height),
        ),
        None => Box::new(SyntheticSource::new(
            config.frame_width,
            config.frame_height,
            args.max_frames,
        )),
    };

    // ========== 检测器 ==========
    let detector: Box<dyn Detector> = match &args.detections {
        Some(path) => Box::new(
            ScriptedDetector::from_file(path)
                .with_context(|| format!("加载检测脚本失败: {}", path.display()))?,
        ),
        None => {
            warn!("⚠️ 未指定检测脚本,所有帧均无检测结果");
            Box::new(|_: &Frame| -> Result<Vec<Detection>, DetectorError> { Ok(Vec::new()) })
        }
    };

    // ========== 渲染 ==========
    let mut renderers: Vec<Box<dyn RenderSink>> = vec![Box::new(
        StatusRenderer::new(Duration::from_secs_f64(args.status_secs), servo_enabled)
            .with_debug(args.debug),
    )];
    if let Some(dir) = &args.overlay_dir {
        renderers.push(Box::new(OverlayRenderer::new(dir, args.overlay_every)));
    }

    let mut control = ControlLoop::new(
        config,
        Collaborators {
            source,
            detector,
            renderer: Box::new(renderers),
            driver,
        },
        servo_enabled,
    )
    .map_err(|e| {
        error!("❌ 初始化失败 [{}]: {}", e.kind(), e);
        e
    })?;

    info!("💡 输入 q 并回车或 Ctrl+C 退出");
    let quit = cat_tracker::spawn_quit_listener();
    let summary = control.run(&quit)?;

    info!(
        "✅ 已退出 ({:?}): 处理{}帧, 跳过{}帧, 舵机故障{}次",
        summary.reason, summary.stats.frames, summary.stats.skipped, summary.stats.driver_faults
    );
    Ok(())
}
