// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

/// 检测数据结构定义
/// Data structures for the detection stage
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ========== 枚举类型 ==========

/// 目标类别 (Object class)
///
/// 只有 `Cat` / `Person` 可以被追踪,其余标签统一归为 `Other`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClass {
    Cat,
    Person,
    #[serde(other)]
    Other,
}

impl ObjectClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectClass::Cat => "cat",
            ObjectClass::Person => "person",
            ObjectClass::Other => "other",
        }
    }

    pub fn is_trackable(&self) -> bool {
        !matches!(self, ObjectClass::Other)
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectClass {
    type Err = String;

    /// 解析命令行类别名 (大小写不敏感)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cat" => Ok(ObjectClass::Cat),
            "person" => Ok(ObjectClass::Person),
            other => Err(format!("不支持的追踪类别: {} (可选: cat, person)", other)),
        }
    }
}

// ========== 数据结构 ==========

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 检测框 (像素坐标,原点在左上角)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn center(&self) -> Point2 {
        Point2::new(self.x + self.width / 2., self.y + self.height / 2.)
    }

    pub fn xmax(&self) -> f32 {
        self.x + self.width
    }

    pub fn ymax(&self) -> f32 {
        self.y + self.height
    }
}

impl From<[f32; 4]> for BBox {
    fn from([x, y, width, height]: [f32; 4]) -> Self {
        Self::new(x, y, width, height)
    }
}

impl From<BBox> for [f32; 4] {
    fn from(b: BBox) -> Self {
        [b.x, b.y, b.width, b.height]
    }
}

/// 单个检测结果,生命周期为一帧
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class: ObjectClass,
    pub confidence: f32,
    pub bbox: BBox,
}

impl Detection {
    pub fn new(class: ObjectClass, confidence: f32, bbox: BBox) -> Self {
        Self {
            class,
            confidence,
            bbox,
        }
    }
}

/// 当前帧选中的追踪目标 (不跨帧保存)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target<'a> {
    pub detection: &'a Detection,
    /// 在输入序列中的下标
    pub index: usize,
    pub center: Point2,
}
