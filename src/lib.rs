// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod actuator; // 云台执行器与舵机驱动
pub mod config; // 追踪参数配置
pub mod control; // 居中误差与角度映射
pub mod detection; // 检测结果与目标选择
pub mod error; // 故障分类
pub mod input; // 视频输入系统
pub mod pipeline; // 控制循环
pub mod render; // 渲染系统

pub use crate::actuator::{ActuatorSnapshot, ActuatorState, Axis, DriverRequest, ServoDriver};
pub use crate::config::{AngleRange, AxisConfig, ScanConfig, TrackingConfig};
pub use crate::control::{axis_delta, compute_error, map_delta, CenteringError};
pub use crate::detection::{select, BBox, Detection, Detector, ObjectClass, Point2, Target};
pub use crate::error::{AcquisitionError, DetectorError, DriverError, TrackerError};
pub use crate::input::{Frame, VideoSource};
pub use crate::pipeline::{
    Collaborators, ControlLoop, CycleReport, LoopState, LoopSummary, ShutdownReason, StepOutcome,
};
pub use crate::render::RenderSink;

use crossbeam_channel::{Receiver, Sender};
use tracing::{info, warn};

/// 初始化日志: `RUST_LOG` 优先, 否则按 `debug` 选择 info / debug
pub fn init_logging(debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if debug { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // 测试中可能重复初始化,忽略错误
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(true)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .with(env_filter)
        .try_init();
}

/// 启动时间戳 (用于输出目录命名)
pub fn gen_time_string(delimiter: &str) -> String {
    let fmt = format!(
        "%Y{}%m{}%d{}%H{}%M{}%S",
        delimiter, delimiter, delimiter, delimiter, delimiter
    );
    chrono::Local::now().format(&fmt).to_string()
}

/// 退出请求通道 (容量1, 多个来源共用同一个发送端的克隆)
pub fn quit_channel() -> (Sender<()>, Receiver<()>) {
    crossbeam_channel::bounded(1)
}

/// 发送退出请求; 已有未处理的请求时直接忽略,不会阻塞
pub fn request_quit(tx: &Sender<()>) {
    let _ = tx.try_send(());
}

/// 在后台线程读取标准输入,输入 `q` 时发送退出请求
///
/// 标准输入关闭时线程直接结束,不会触发退出
pub fn spawn_stdin_listener(tx: Sender<()>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) if is_quit_command(&line) => {
                    request_quit(&tx);
                    break;
                }
                Ok(_) => {}
            }
        }
    });
}

/// Ctrl+C / SIGTERM 转为退出请求,走正常的关闭流程 (回中 + 释放)
///
/// 每个进程只能安装一次
pub fn install_interrupt_handler(tx: Sender<()>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        info!("🛑 收到中断信号,准备退出");
        request_quit(&tx);
    })
}

/// 标准输入 + 进程信号两个退出来源
pub fn spawn_quit_listener() -> Receiver<()> {
    let (tx, rx) = quit_channel();
    if let Err(e) = install_interrupt_handler(tx.clone()) {
        warn!("⚠️ 无法安装信号处理: {}", e);
    }
    spawn_stdin_listener(tx);
    rx
}

fn is_quit_command(line: &str) -> bool {
    matches!(line.trim(), "q" | "Q" | "quit")
}
