//! 拖出延迟信号
//!
//! 平台传输层在拖动开始时拿到 `PendingDrag`，在其完成前视拖动为进行中；
//! 导出任务持有 `DragDeferral`，无论成功、失败还是 panic 都恰好完成一次：
//! 显式 `complete` 之外，守卫被丢弃时自动以"无数据"完成。

use std::sync::Arc;

use tokio::sync::oneshot;

use super::{DataPackage, DragExporter};
use crate::shelf::ShelfItem;

/// 导出侧持有的完成信号
#[derive(Debug)]
pub struct DragDeferral {
    sender: Option<oneshot::Sender<Option<DataPackage>>>,
}

/// 传输侧等待的拖出结果
#[derive(Debug)]
pub struct PendingDrag {
    receiver: oneshot::Receiver<Option<DataPackage>>,
}

impl DragDeferral {
    /// 创建一对相互关联的延迟信号与等待端
    pub fn pair() -> (Self, PendingDrag) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                sender: Some(sender),
            },
            PendingDrag { receiver },
        )
    }

    /// 以导出结果完成拖动
    pub fn complete(mut self, package: Option<DataPackage>) {
        self.signal(package);
    }

    fn signal(&mut self, package: Option<DataPackage>) {
        if let Some(sender) = self.sender.take() {
            // 等待端已放弃时无需处理
            let _ = sender.send(package);
        }
    }
}

impl Drop for DragDeferral {
    fn drop(&mut self) {
        if self.sender.is_some() {
            log::warn!("⚠️ 拖出延迟未显式完成，按无数据结束");
            self.signal(None);
        }
    }
}

impl PendingDrag {
    /// 等待导出完成；导出失败或导出任务异常时为 `None`
    pub async fn wait(self) -> Option<DataPackage> {
        self.receiver.await.ok().flatten()
    }
}

/// 开始拖出：在后台导出条目，立即返回等待端
///
/// 必须在 tokio 运行时内调用。
pub fn start_drag(exporter: Arc<DragExporter>, item: Arc<ShelfItem>) -> PendingDrag {
    let (deferral, pending) = DragDeferral::pair();
    tokio::spawn(async move {
        let package = exporter.begin_drag(&item).await;
        deferral.complete(package);
    });
    pending
}
