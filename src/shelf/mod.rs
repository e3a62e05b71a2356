//! # 货架条目模块（shelf）
//!
//! ## 设计思路
//!
//! 按职责拆分为四个叶子模块，自下而上：
//!
//! - `format`：字节大小与文本预览格式化（纯函数）
//! - `icon`：扩展名 → 图标类别（纯查表）
//! - `item`：条目模型，载荷为封闭和类型
//! - `collection`：主窗口与扩展窗口共享的可观察有序集合
//!
//! ## 实现思路
//!
//! 本模块不依赖任何窗口或拖放框架，拖入/拖出流水线（`transfer`）
//! 与视图（`window`）都只通过这里暴露的类型交互。

mod collection;
mod format;
mod icon;
mod item;

pub use collection::{ChangeAction, CollectionChange, ShelfCollection, Subscription};
pub use format::{format_size, text_preview};
pub use icon::{resolve_icon, IconGlyph};
pub use item::{ItemId, ItemKind, ItemPayload, ItemPresentation, ShelfItem, Thumbnail};
