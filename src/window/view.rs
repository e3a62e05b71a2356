//! 窗口视图与多窗口同步桥
//!
//! # 设计思路
//!
//! 扩展窗口与主窗口的关系支持两种配置（`SyncMode`）：
//!
//! - 共享实例：扩展窗口直接持有主窗口的同一个 `ShelfCollection`，观察天然一致。
//! - 回调：扩展窗口持有只读镜像 + `on_item_deleted` 回调。删除只经回调交给主集合，
//!   主集合的通知再同步回镜像，两个窗口不会分叉。
//!
//! # 实现思路
//!
//! - 镜像本身也是一个 `ShelfCollection`，视图层对两种模式使用同一套订阅接口。
//!   镜像只在视图内部可写，对外只暴露条目读取、计数与订阅。
//! - 镜像先订阅主集合再填充快照，填充时跳过已被通知加入的条目。
//! - 集合与视图归单一 UI 线程所有。通知同步分发，在该线程上删除时，
//!   回调返回前两个窗口已一致；若另一线程正在分发主集合的通知，
//!   删除只会入队，由那个线程的分发循环稍后同步到镜像。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::WindowRole;
use crate::settings::ShelfSettings;
use crate::shelf::{
    ChangeAction, CollectionChange, ItemId, ShelfCollection, ShelfItem, Subscription,
};
use crate::transfer::DragOverFeedback;

type DeleteCallback = Arc<dyn Fn(&Arc<ShelfItem>) + Send + Sync>;

enum ViewMode {
    Shared,
    Callback {
        on_item_deleted: DeleteCallback,
        _mirror: Subscription,
    },
}

/// 视图状态栏
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewStatus {
    /// 主窗口为"{n} items"，扩展窗口标题为"{n} item" / "{n} items"
    pub count_label: String,
    /// 空状态占位是否可见
    pub placeholder_visible: bool,
}

/// 一个窗口对条目的视图
pub struct ShelfView {
    role: WindowRole,
    items: ShelfCollection,
    mode: ViewMode,
    drop_overlay: AtomicBool,
    drag_over_caption: String,
}

impl ShelfView {
    /// 共享实例模式：直接观察给定集合
    pub fn shared(role: WindowRole, collection: ShelfCollection, settings: &ShelfSettings) -> Self {
        Self {
            role,
            items: collection,
            mode: ViewMode::Shared,
            drop_overlay: AtomicBool::new(false),
            drag_over_caption: settings.labels.drag_over_caption.clone(),
        }
    }

    /// 回调模式：持有 `source` 的只读镜像，删除通过 `on_item_deleted` 交给条目所有者
    pub fn with_callback<F>(
        role: WindowRole,
        source: &ShelfCollection,
        settings: &ShelfSettings,
        on_item_deleted: F,
    ) -> Self
    where
        F: Fn(&Arc<ShelfItem>) + Send + Sync + 'static,
    {
        let mirror = ShelfCollection::new();

        let sink = mirror.clone();
        let subscription = source.subscribe(move |change: &CollectionChange| match &change.action {
            ChangeAction::Added { item, .. } => {
                if !sink.contains(item.id()) {
                    sink.add(Arc::clone(item));
                }
            }
            ChangeAction::Removed { item, .. } => {
                sink.remove(item.id());
            }
        });

        for item in source.snapshot() {
            if !mirror.contains(item.id()) {
                mirror.add(item);
            }
        }

        Self {
            role,
            items: mirror,
            mode: ViewMode::Callback {
                on_item_deleted: Arc::new(on_item_deleted),
                _mirror: subscription,
            },
            drop_overlay: AtomicBool::new(false),
            drag_over_caption: settings.labels.drag_over_caption.clone(),
        }
    }

    pub fn role(&self) -> WindowRole {
        self.role
    }

    /// 共享实例模式下绑定的集合；回调模式下镜像不对外暴露，返回 `None`
    pub fn shared_collection(&self) -> Option<&ShelfCollection> {
        match self.mode {
            ViewMode::Shared => Some(&self.items),
            ViewMode::Callback { .. } => None,
        }
    }

    pub fn is_callback_mode(&self) -> bool {
        matches!(self.mode, ViewMode::Callback { .. })
    }

    pub fn items(&self) -> Vec<Arc<ShelfItem>> {
        self.items.snapshot()
    }

    pub fn count(&self) -> usize {
        self.items.count()
    }

    /// 注册重绘监听器
    pub fn on_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CollectionChange) + Send + Sync + 'static,
    {
        self.items.subscribe(listener)
    }

    pub fn status(&self) -> ViewStatus {
        let count = self.count();
        let count_label = match (self.role, count) {
            (WindowRole::Expanded, 1) => "1 item".to_string(),
            (_, n) => format!("{} items", n),
        };
        ViewStatus {
            count_label,
            placeholder_visible: count == 0,
        }
    }

    /// 用户在本窗口删除条目，返回条目是否存在
    pub fn delete(&self, id: ItemId) -> bool {
        match &self.mode {
            ViewMode::Shared => self.items.remove(id).is_some(),
            ViewMode::Callback {
                on_item_deleted, ..
            } => match self.items.get(id) {
                Some(item) => {
                    on_item_deleted(&item);
                    true
                }
                None => false,
            },
        }
    }

    /// 拖动悬停：接受复制并显示投放遮罩
    pub fn drag_over(&self) -> DragOverFeedback {
        self.drop_overlay.store(true, Ordering::Release);
        DragOverFeedback::copy_with_caption(&self.drag_over_caption)
    }

    pub fn drag_leave(&self) {
        self.drop_overlay.store(false, Ordering::Release);
    }

    /// 投放完成，隐藏遮罩
    pub fn drop_completed(&self) {
        self.drop_overlay.store(false, Ordering::Release);
    }

    pub fn drop_overlay_visible(&self) -> bool {
        self.drop_overlay.load(Ordering::Acquire)
    }
}
