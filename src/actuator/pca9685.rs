// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! PCA9685 舵机驱动 (Arducam 云台等)
//!
//! 通过 Linux i2c-dev 直接写寄存器:
//! - 50Hz PWM 周期
//! - 角度 0..180 映射到脉宽 750..2250 µs
//! - 每通道 4 个寄存器 (ON_L, ON_H, OFF_L, OFF_H),开启自动递增后一次写入

use std::io;
use std::thread;
use std::time::Duration;

use tracing::debug;

use super::driver::ServoDriver;
use super::Axis;
use crate::error::DriverError;

pub const DEFAULT_ADDRESS: u16 = 0x40;

// ========== 寄存器 ==========
const MODE1: u8 = 0x00;
const MODE2: u8 = 0x01;
const LED0_ON_L: u8 = 0x06;
const PRESCALE: u8 = 0xFE;

const MODE1_RESTART: u8 = 0x80;
const MODE1_AI: u8 = 0x20; // 寄存器地址自动递增
const MODE1_SLEEP: u8 = 0x10;
const MODE2_OUTDRV: u8 = 0x04; // 推挽输出
const LED_FULL_OFF: u8 = 0x10; // OFF_H bit4

// ========== 舵机参数 ==========
const OSC_HZ: f32 = 25_000_000.0;
pub const PWM_HZ: f32 = 50.0;
const MIN_PULSE_US: f32 = 750.0;
const MAX_PULSE_US: f32 = 2250.0;
const ACTUATION_RANGE: f32 = 180.0;

/// 计算 PRESCALE 寄存器值: round(osc / (4096 * f)) - 1
pub fn prescale_for(freq_hz: f32) -> u8 {
    ((OSC_HZ / (4096.0 * freq_hz)).round() - 1.0).clamp(3.0, 255.0) as u8
}

/// 角度 → 12位 OFF 计数
pub fn angle_to_ticks(angle: f32) -> u16 {
    let angle = angle.clamp(0.0, ACTUATION_RANGE);
    let pulse_us = MIN_PULSE_US + (MAX_PULSE_US - MIN_PULSE_US) * angle / ACTUATION_RANGE;
    (pulse_us * PWM_HZ * 4096.0 / 1_000_000.0).round() as u16
}

/// 寄存器写入通道 (第一个字节为寄存器地址)
pub trait RegisterBus: Send {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;
}

pub struct Pca9685Servo {
    bus: Box<dyn RegisterBus>,
    pan_channel: u8,
    tilt_channel: u8,
    settle: Duration,
}

impl Pca9685Servo {
    /// 打开 `/dev/i2c-{bus}` 并初始化芯片
    #[cfg(target_os = "linux")]
    pub fn open(
        bus: u8,
        address: u16,
        pan_channel: u8,
        tilt_channel: u8,
    ) -> Result<Self, DriverError> {
        let dev = linux::I2cDev::open(bus, address)?;
        Self::with_bus(Box::new(dev), pan_channel, tilt_channel, Duration::from_millis(5))
    }

    #[cfg(not(target_os = "linux"))]
    pub fn open(
        _bus: u8,
        _address: u16,
        _pan_channel: u8,
        _tilt_channel: u8,
    ) -> Result<Self, DriverError> {
        Err(DriverError::Unsupported("PCA9685 仅支持 Linux i2c-dev"))
    }

    /// 使用指定寄存器通道初始化 (`settle` 为振荡器稳定等待时间)
    pub fn with_bus(
        bus: Box<dyn RegisterBus>,
        pan_channel: u8,
        tilt_channel: u8,
        settle: Duration,
    ) -> Result<Self, DriverError> {
        if pan_channel > 15 || tilt_channel > 15 {
            return Err(DriverError::Unavailable(format!(
                "通道号超出范围 (0-15): pan={}, tilt={}",
                pan_channel, tilt_channel
            )));
        }
        let mut servo = Self {
            bus,
            pan_channel,
            tilt_channel,
            settle,
        };
        servo
            .init()
            .map_err(|e| DriverError::Unavailable(format!("PCA9685 初始化失败: {}", e)))?;
        Ok(servo)
    }

    fn init(&mut self) -> io::Result<()> {
        self.bus.write(&[MODE2, MODE2_OUTDRV])?;
        self.bus.write(&[MODE1, MODE1_AI])?;
        thread::sleep(self.settle);

        // 修改分频系数必须先进入睡眠
        let prescale = prescale_for(PWM_HZ);
        self.bus.write(&[MODE1, MODE1_AI | MODE1_SLEEP])?;
        self.bus.write(&[PRESCALE, prescale])?;
        self.bus.write(&[MODE1, MODE1_AI])?;
        thread::sleep(self.settle);
        self.bus.write(&[MODE1, MODE1_AI | MODE1_RESTART])?;

        debug!("PCA9685 初始化完成: {}Hz, prescale={}", PWM_HZ, prescale);
        Ok(())
    }

    fn channel(&self, axis: Axis) -> u8 {
        match axis {
            Axis::Pan => self.pan_channel,
            Axis::Tilt => self.tilt_channel,
        }
    }

    fn write_channel(&mut self, channel: u8, off: u16, off_h_flags: u8) -> io::Result<()> {
        let reg = LED0_ON_L + 4 * channel;
        self.bus.write(&[
            reg,
            0,
            0,
            (off & 0xFF) as u8,
            ((off >> 8) as u8 & 0x0F) | off_h_flags,
        ])
    }
}

impl ServoDriver for Pca9685Servo {
    fn apply(&mut self, axis: Axis, angle: f32) -> Result<(), DriverError> {
        let channel = self.channel(axis);
        let ticks = angle_to_ticks(angle);
        self.write_channel(channel, ticks, 0)
            .map_err(|e| DriverError::Write(format!("{} 通道{}: {}", axis, channel, e)))
    }

    /// 关闭两路输出 (舵机失去保持力) 并让芯片休眠
    fn release(&mut self) -> Result<(), DriverError> {
        for channel in [self.pan_channel, self.tilt_channel] {
            self.write_channel(channel, 0, LED_FULL_OFF)
                .map_err(|e| DriverError::Write(format!("通道{}: {}", channel, e)))?;
        }
        self.bus
            .write(&[MODE1, MODE1_AI | MODE1_SLEEP])
            .map_err(|e| DriverError::Write(e.to_string()))
    }

    fn name(&self) -> &str {
        "PCA9685"
    }
}

#[cfg(target_os = "linux")]
mod linux {
    use std::fs::{File, OpenOptions};
    use std::io::{self, Write};
    use std::os::fd::AsRawFd;

    use super::RegisterBus;
    use crate::error::DriverError;

    // linux/i2c-dev.h
    const I2C_SLAVE: u16 = 0x0703;

    nix::ioctl_write_int_bad!(i2c_set_slave, I2C_SLAVE);

    pub struct I2cDev {
        file: File,
    }

    impl I2cDev {
        pub fn open(bus: u8, address: u16) -> Result<Self, DriverError> {
            let path = format!("/dev/i2c-{}", bus);
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .open(&path)
                .map_err(|e| DriverError::Unavailable(format!("{}: {}", path, e)))?;

            // SAFETY: fd 在 file 生命周期内有效, I2C_SLAVE 只接收整数参数
            let result = unsafe { i2c_set_slave(file.as_raw_fd(), address as _) };
            result.map_err(|e| {
                DriverError::Unavailable(format!("设置从机地址 {:#04x} 失败: {}", address, e))
            })?;

            Ok(Self { file })
        }
    }

    impl RegisterBus for I2cDev {
        fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
            self.file.write_all(bytes)
        }
    }
}
