// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 云台舵机自检 (Servo Sweep)
///
/// 水平 min → max → min, 然后俯仰 min → max → min, 用于确认接线与方向
///
/// cargo run --bin servo_sweep -- --once        # 扫描一次后回中
/// cargo run --bin servo_sweep -- --mock        # 无硬件,只打印角度
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use cat_tracker::actuator::pca9685::DEFAULT_ADDRESS;
use cat_tracker::actuator::sweep::{SWEEP_STEP_DEGREES, SWEEP_STEP_DELAY};
use cat_tracker::actuator::{resolve_driver, sweep_once, DriverRequest, SweepOutcome};
use cat_tracker::{ActuatorState, TrackingConfig};

/// 舵机自检参数
#[derive(Parser, Debug)]
#[command(author, version, about = "云台舵机自检", long_about = None)]
struct Args {
    /// 扫描一次后退出
    #[arg(long)]
    once: bool,

    /// 不使用硬件,逐步打印角度
    #[arg(long)]
    mock: bool,

    /// 配置文件 (读取角度范围与通道)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// I2C 总线号
    #[arg(long, default_value_t = 1)]
    i2c_bus: u8,

    /// PCA9685 地址
    #[arg(long, default_value_t = DEFAULT_ADDRESS)]
    i2c_address: u16,
}

fn main() -> Result<()> {
    let args = Args::parse();
    // 模拟模式下打开 debug, 逐步打印角度
    cat_tracker::init_logging(args.mock);

    let config = match &args.config {
        Some(path) => TrackingConfig::load(path)
            .with_context(|| format!("加载配置失败: {}", path.display()))?,
        None => TrackingConfig::default(),
    };

    info!(
        "🔧 舵机自检 (水平通道 {}, 俯仰通道 {})",
        config.pan.channel, config.tilt.channel
    );
    let request = if args.mock {
        info!("🧪 模拟模式: 不访问硬件");
        DriverRequest::Mock
    } else {
        info!("🔌 使用 PCA9685 (I2C)");
        DriverRequest::Pca9685 {
            bus: args.i2c_bus,
            address: args.i2c_address,
        }
    };
    let (driver, label) = resolve_driver(&request, &config);
    info!("✅ 舵机驱动: {}", label);
    info!("💡 输入 q 并回车或 Ctrl+C 停止");

    let mut actuator = ActuatorState::new(&config, driver);
    let quit = cat_tracker::spawn_quit_listener();

    loop {
        let outcome = sweep_once(&mut actuator, SWEEP_STEP_DEGREES, SWEEP_STEP_DELAY, &quit);
        if outcome == SweepOutcome::Interrupted {
            info!("🛑 已停止");
            break;
        }
        if args.once {
            break;
        }
    }

    for result in actuator.home() {
        if let Some(fault) = result.fault {
            warn!("⚠️ 回中失败: {}", fault);
        }
    }
    info!("🎯 已回中: pan={} tilt={}", config.pan.home, config.tilt.home);

    if let Err(e) = actuator.release() {
        warn!("⚠️ 舵机释放失败: {}", e);
    }
    Ok(())
}
