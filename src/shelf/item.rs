//! 货架条目模型
//!
//! # 设计思路
//!
//! `ShelfItem` 表示一份被拖入的内容及其缓存的展示元数据。
//! 载荷是封闭的和类型 `ItemPayload`：文件 / 文件夹 / 文本 / 位图四选一，
//! "恰好一个载荷有效"由类型系统保证，无需对无关字段判空。
//!
//! # 实现思路
//!
//! - `kind()` 由载荷推导，条目构造后没有任何修改载荷的入口，因此类别永不改变。
//! - 缩略图是唯一可变字段，放在 `Mutex` 中原地更新，不属于集合结构变更。
//! - `thumbnail_pending` 保证同一条目同时至多一个缩略图任务在途。
//! - 条目标识 `ItemId` 由全局递增计数器分配，集合按标识删除。

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use chrono::{DateTime, Local};
use serde::Serialize;

use super::icon::IconGlyph;
use crate::storage::{BitmapStream, StorageFile, StorageFolder};

static NEXT_ITEM_ID: AtomicU64 = AtomicU64::new(1);

/// 条目唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ItemId(u64);

impl ItemId {
    fn next() -> Self {
        Self(NEXT_ITEM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// 条目类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemKind {
    File,
    Folder,
    Text,
    Bitmap,
}

/// 条目载荷，恰好一种
#[derive(Debug)]
pub enum ItemPayload {
    File(StorageFile),
    Folder(StorageFolder),
    Text(String),
    /// 独占的位图流，始终位于偏移 0；导出时只读取其副本
    Bitmap(BitmapStream),
}

impl ItemPayload {
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::File(_) => ItemKind::File,
            Self::Folder(_) => ItemKind::Folder,
            Self::Text(_) => ItemKind::Text,
            Self::Bitmap(_) => ItemKind::Bitmap,
        }
    }
}

/// 解码后的缩略图（RGBA）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// 展示元数据
#[derive(Debug, Clone)]
pub struct ItemPresentation {
    pub display_name: String,
    pub description: String,
    pub icon: IconGlyph,
    /// 无意义大小的类别（文件夹）为空串
    pub size_text: String,
}

/// 一个货架条目
#[derive(Debug)]
pub struct ShelfItem {
    id: ItemId,
    presentation: ItemPresentation,
    captured_at: DateTime<Local>,
    payload: ItemPayload,
    thumbnail: Mutex<Option<Arc<Thumbnail>>>,
    thumbnail_pending: AtomicBool,
}

impl ShelfItem {
    pub fn new(presentation: ItemPresentation, payload: ItemPayload) -> Self {
        Self {
            id: ItemId::next(),
            presentation,
            captured_at: Local::now(),
            payload,
            thumbnail: Mutex::new(None),
            thumbnail_pending: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn kind(&self) -> ItemKind {
        self.payload.kind()
    }

    pub fn display_name(&self) -> &str {
        &self.presentation.display_name
    }

    pub fn description(&self) -> &str {
        &self.presentation.description
    }

    /// 无缩略图时使用的回退图标，捕获时确定后不再变化
    pub fn icon(&self) -> IconGlyph {
        self.presentation.icon
    }

    pub fn size_text(&self) -> &str {
        &self.presentation.size_text
    }

    pub fn captured_at(&self) -> DateTime<Local> {
        self.captured_at
    }

    pub fn payload(&self) -> &ItemPayload {
        &self.payload
    }

    /// 文本条目的完整内容
    pub fn text_content(&self) -> Option<&str> {
        match &self.payload {
            ItemPayload::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn thumbnail(&self) -> Option<Arc<Thumbnail>> {
        self.thumbnail
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn has_thumbnail(&self) -> bool {
        self.thumbnail
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub(crate) fn set_thumbnail(&self, thumbnail: Thumbnail) {
        *self.thumbnail.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(thumbnail));
    }

    /// 尝试占用缩略图任务槽位
    ///
    /// 已有任务在途时返回 `None`。守卫只持有弱引用，不会延长条目的生命周期；
    /// 守卫释放时归还槽位。
    pub(crate) fn begin_thumbnail_task(self: &Arc<Self>) -> Option<ThumbnailTaskGuard> {
        if self.thumbnail_pending.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(ThumbnailTaskGuard {
            item: Arc::downgrade(self),
        })
    }

    pub fn thumbnail_pending(&self) -> bool {
        self.thumbnail_pending.load(Ordering::Acquire)
    }
}

/// 缩略图任务槽位的 RAII 守卫
pub(crate) struct ThumbnailTaskGuard {
    item: Weak<ShelfItem>,
}

impl ThumbnailTaskGuard {
    /// 条目仍然存活时返回它
    pub(crate) fn item(&self) -> Option<Arc<ShelfItem>> {
        self.item.upgrade()
    }
}

impl Drop for ThumbnailTaskGuard {
    fn drop(&mut self) {
        if let Some(item) = self.item.upgrade() {
            item.thumbnail_pending.store(false, Ordering::Release);
        }
    }
}
