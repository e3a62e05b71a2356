//! # 应用组装
//!
//! `ShelfApp` 是组合根：持有唯一的条目集合，把拖入流水线、拖出导出器
//! 与主窗口连到一起，并按 `SyncMode` 打开扩展窗口。
//! 展示层只需调用这里的方法，平台事件原样转发即可。

use std::sync::Arc;

use crate::error::Result;
use crate::settings::{ShelfSettings, SyncMode};
use crate::shelf::{ShelfCollection, ShelfItem};
use crate::storage::TempStorageInfo;
use crate::transfer::{
    DataPackageView, DragExporter, DragOverFeedback, DropIngestor, PendingDrag,
    ThumbnailProvider, start_drag,
};
use crate::window::{PresenceController, ShelfView, ShelfWindow, WindowHost, WindowRole};

pub struct ShelfApp {
    settings: Arc<ShelfSettings>,
    collection: ShelfCollection,
    ingestor: DropIngestor,
    exporter: Arc<DragExporter>,
    primary: ShelfWindow,
}

impl ShelfApp {
    /// 组装应用并应用主窗口外观
    pub fn new(
        settings: ShelfSettings,
        provider: Arc<dyn ThumbnailProvider>,
        primary_host: Arc<dyn WindowHost>,
    ) -> Result<Self> {
        let settings = Arc::new(settings);
        let collection = ShelfCollection::new();

        let ingestor = DropIngestor::new(collection.clone(), provider, Arc::clone(&settings));
        let exporter = Arc::new(DragExporter::new(&settings));
        let primary = ShelfWindow {
            view: ShelfView::shared(WindowRole::Primary, collection.clone(), &settings),
            presence: PresenceController::new(primary_host, WindowRole::Primary, &settings)?,
        };

        log::info!(
            "✅ 货架已就绪，临时目录: {}",
            exporter.temp_dir().display()
        );

        Ok(Self {
            settings,
            collection,
            ingestor,
            exporter,
            primary,
        })
    }

    pub fn settings(&self) -> &ShelfSettings {
        &self.settings
    }

    /// 唯一的权威条目集合
    pub fn collection(&self) -> &ShelfCollection {
        &self.collection
    }

    pub fn primary(&self) -> &ShelfWindow {
        &self.primary
    }

    pub fn exporter(&self) -> &DragExporter {
        &self.exporter
    }

    /// 主窗口拖动悬停
    pub fn drag_over(&self) -> DragOverFeedback {
        self.primary.view.drag_over()
    }

    pub fn drag_leave(&self) {
        self.primary.view.drag_leave();
    }

    /// 主窗口投放
    pub async fn handle_drop(&self, view: &DataPackageView) -> Vec<Arc<ShelfItem>> {
        let ingest = self.ingestor.handle_drop(view);
        self.primary.view.drop_completed();
        ingest.await
    }

    /// 开始拖出条目，传输层等待返回的 `PendingDrag`
    pub fn begin_drag(&self, item: Arc<ShelfItem>) -> PendingDrag {
        start_drag(Arc::clone(&self.exporter), item)
    }

    /// 等待所有在途缩略图任务
    pub async fn settle(&self) {
        self.ingestor.settle().await;
    }

    /// 按配置的同步模式打开扩展窗口
    pub fn open_expanded(&self, host: Arc<dyn WindowHost>) -> Result<ShelfWindow> {
        self.open_expanded_with(host, self.settings.sync_mode)
    }

    pub fn open_expanded_with(&self, host: Arc<dyn WindowHost>, mode: SyncMode) -> Result<ShelfWindow> {
        let view = match mode {
            SyncMode::Shared => {
                ShelfView::shared(WindowRole::Expanded, self.collection.clone(), &self.settings)
            }
            SyncMode::Callback => {
                let owner = self.collection.clone();
                ShelfView::with_callback(
                    WindowRole::Expanded,
                    &self.collection,
                    &self.settings,
                    move |item| {
                        owner.remove(item.id());
                    },
                )
            }
        };
        let presence = PresenceController::new(host, WindowRole::Expanded, &self.settings)?;
        presence.open();

        log::info!("🪟 扩展窗口已打开（{:?} 模式，{} 个条目）", mode, view.count());
        Ok(ShelfWindow { view, presence })
    }

    pub fn purge_temp_files(&self) -> Result<usize> {
        self.exporter.purge_temp_files()
    }

    pub fn temp_storage_info(&self) -> TempStorageInfo {
        self.exporter.temp_storage_info()
    }
}
