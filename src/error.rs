//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `ShelfError` 枚举，所有可能失败的内部操作统一返回
//! `Result<T, ShelfError>`，由拖入/拖出流水线在边界处按策略吞掉或记录。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `std::io::Error` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，便于展示层跨边界传递。

use serde::Serialize;

/// 货架统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum ShelfError {
    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 存储句柄失效或临时目录不可用
    #[error("存储不可用: {0}")]
    Storage(String),

    /// 缩略图提供方失败
    #[error("缩略图获取失败: {0}")]
    Thumbnail(String),

    /// 图片解码失败
    #[error("解码错误: {0}")]
    Decode(String),

    /// 拖出导出失败（临时文件创建 / 写入）
    #[error("导出失败: {0}")]
    Export(String),

    /// 设置文件读写或解析失败
    #[error("设置错误: {0}")]
    Settings(String),

    /// 窗口操作失败
    #[error("窗口操作失败: {0}")]
    Window(String),
}

/// 展示层要求返回值实现 `Serialize`。
/// 将错误序列化为人类可读的字符串。
impl Serialize for ShelfError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShelfError>;
