//! # 拖放数据交换模块（transfer）
//!
//! ## 设计思路
//!
//! 平台拖放传输本身是外部协作者，这里只定义它与货架核心之间交换的数据包：
//!
//! - `DataPackageView`：拖入时平台提供的只读数据视图（文件列表 / 文本 / 位图）
//! - `DataPackage`：拖出时交给平台的数据包
//!
//! 子模块按流水线阶段拆分：
//!
//! ```text
//! 平台拖入事件
//!    ↓
//! ingest.rs（识别格式 → 捕获条目 → 写入集合）
//!    └─ thumbnail.rs（两阶段缩略图，失败静默回退图标）
//!
//! 用户拖出条目
//!    ↓
//! deferral.rs（延迟信号：传输层等待导出完成）
//!    └─ export.rs（条目 → 数据包；位图落盘为临时文件）
//! ```

mod deferral;
mod export;
mod ingest;
mod thumbnail;

pub use deferral::{DragDeferral, PendingDrag, start_drag};
pub use export::DragExporter;
pub use ingest::DropIngestor;
pub use thumbnail::{
    ImageFileThumbnailProvider, ThumbnailMode, ThumbnailProvider, ThumbnailTarget,
    decode_thumbnail,
};

use crate::storage::{BitmapStream, StorageEntry};

/// 拖放请求的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragOperation {
    #[default]
    None,
    Copy,
}

/// 标准数据格式，按优先级排列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFormat {
    StorageItems,
    Text,
    Bitmap,
}

/// 拖入时平台提供的数据视图
///
/// 一个数据包可能同时提供多种表示，货架只取最具体的一种：
/// 文件系统条目 > 文本 > 位图。
#[derive(Debug, Default)]
pub struct DataPackageView {
    storage_items: Option<Vec<StorageEntry>>,
    text: Option<String>,
    bitmap: Option<BitmapStream>,
}

impl DataPackageView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_storage_items(mut self, items: Vec<StorageEntry>) -> Self {
        self.storage_items = Some(items);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_bitmap(mut self, bitmap: BitmapStream) -> Self {
        self.bitmap = Some(bitmap);
        self
    }

    pub fn contains(&self, format: StandardFormat) -> bool {
        match format {
            StandardFormat::StorageItems => self.storage_items.is_some(),
            StandardFormat::Text => self.text.is_some(),
            StandardFormat::Bitmap => self.bitmap.is_some(),
        }
    }

    /// 按优先级选出的格式；不含任何可识别表示时为 `None`
    pub fn preferred_format(&self) -> Option<StandardFormat> {
        [
            StandardFormat::StorageItems,
            StandardFormat::Text,
            StandardFormat::Bitmap,
        ]
        .into_iter()
        .find(|format| self.contains(*format))
    }

    pub fn storage_items(&self) -> Option<&[StorageEntry]> {
        self.storage_items.as_deref()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn bitmap(&self) -> Option<&BitmapStream> {
        self.bitmap.as_ref()
    }
}

/// 拖出时交给平台的数据包
#[derive(Debug, Default)]
pub struct DataPackage {
    pub storage_items: Vec<StorageEntry>,
    pub text: Option<String>,
    pub bitmap: Option<BitmapStream>,
    pub requested_operation: DragOperation,
}

impl DataPackage {
    /// 数据包是否没有任何内容
    pub fn is_empty(&self) -> bool {
        self.storage_items.is_empty() && self.text.is_none() && self.bitmap.is_none()
    }
}

/// 拖入悬停时的界面提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragUiOverride {
    pub caption: String,
    pub is_caption_visible: bool,
    pub is_content_visible: bool,
    pub is_glyph_visible: bool,
}

/// 拖入悬停反馈：接受的操作 + 界面提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragOverFeedback {
    pub accepted_operation: DragOperation,
    pub ui: DragUiOverride,
}

impl DragOverFeedback {
    pub fn copy_with_caption(caption: &str) -> Self {
        Self {
            accepted_operation: DragOperation::Copy,
            ui: DragUiOverride {
                caption: caption.to_string(),
                is_caption_visible: true,
                is_content_visible: true,
                is_glyph_visible: true,
            },
        }
    }
}
