//! # 拖入流水线
//!
//! ## 设计思路
//!
//! 将平台拖入的数据视图转换为零个或多个 `ShelfItem` 并写入共享集合。
//! 每种类别一条捕获规则：
//!
//! - 文件：读取大小（失败则只放弃这一个文件），描述为"扩展名 · 大小"，按扩展名解析图标
//! - 文件夹：不计算大小，固定描述与图标
//! - 文本：名称与描述都是截断预览，大小按完整文本的 UTF-8 字节数计算
//! - 位图：立即复制平台流，大小从副本读取，缩略图从另一份副本解码
//!
//! ## 实现思路
//!
//! - `handle_drop` 在同步前缀中取出所需数据（位图流立即复制），
//!   返回的 future 不再借用平台的数据视图。
//! - 条目捕获完成即整体追加到集合，缩略图增强随后在 `JoinSet` 中异步执行，
//!   完成时只做原地字段更新；条目已被删除时丢弃结果。
//! - 所有捕获失败都在本层吞掉并记录，不向展示层抛出。

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinSet;

use super::thumbnail::{acquire_thumbnail, decode_off_thread, ThumbnailProvider, ThumbnailTarget};
use super::{DataPackageView, StandardFormat};
use crate::error::{Result, ShelfError};
use crate::settings::{Labels, ShelfSettings};
use crate::shelf::{
    format_size, resolve_icon, text_preview, IconGlyph, ItemPayload, ItemPresentation,
    ShelfCollection, ShelfItem, Thumbnail,
};
use crate::storage::{BitmapStream, StorageEntry, StorageFile, StorageFolder};

/// 从数据视图中取出的拖入内容（已脱离平台对象）
enum DropContent {
    Entries(Vec<StorageEntry>),
    Text(String),
    Bitmap(BitmapStream),
}

/// 缩略图增强任务的输入
enum EnrichmentJob {
    Provider(ThumbnailTarget),
    Bitmap(BitmapStream),
}

/// 拖入流水线
pub struct DropIngestor {
    collection: ShelfCollection,
    provider: Arc<dyn ThumbnailProvider>,
    settings: Arc<ShelfSettings>,
    enrichment: Mutex<JoinSet<()>>,
}

impl DropIngestor {
    pub fn new(
        collection: ShelfCollection,
        provider: Arc<dyn ThumbnailProvider>,
        settings: Arc<ShelfSettings>,
    ) -> Self {
        Self {
            collection,
            provider,
            settings,
            enrichment: Mutex::new(JoinSet::new()),
        }
    }

    pub fn collection(&self) -> &ShelfCollection {
        &self.collection
    }

    /// 处理一次拖入
    ///
    /// 返回本次成功加入集合的条目，顺序即捕获完成顺序。
    /// 不支持的数据包与单个条目的捕获失败都只记录日志，不报错。
    pub fn handle_drop<'a>(
        &'a self,
        view: &DataPackageView,
    ) -> impl Future<Output = Vec<Arc<ShelfItem>>> + Send + use<'a> {
        let content = take_content(view);
        async move {
            match content {
                Some(DropContent::Entries(entries)) => self.ingest_entries(entries).await,
                Some(DropContent::Text(text)) => vec![self.ingest_text(text)],
                Some(DropContent::Bitmap(stream)) => vec![self.ingest_bitmap(stream)],
                None => {
                    log::debug!("拖入的数据包不含可识别格式，忽略");
                    Vec::new()
                }
            }
        }
    }

    /// 等待所有在途的缩略图任务完成
    pub async fn settle(&self) {
        loop {
            let mut tasks = std::mem::take(&mut *self.tasks());
            if tasks.is_empty() {
                break;
            }
            while let Some(result) = tasks.join_next().await {
                if let Err(err) = result {
                    log::warn!("缩略图任务异常退出: {}", err);
                }
            }
        }
    }

    async fn ingest_entries(&self, entries: Vec<StorageEntry>) -> Vec<Arc<ShelfItem>> {
        let mut added = Vec::with_capacity(entries.len());
        for entry in entries {
            let captured = match entry {
                StorageEntry::File(file) => self.capture_file(file).await,
                StorageEntry::Folder(folder) => Ok(self.capture_folder(folder)),
            };
            match captured {
                Ok(item) => added.push(item),
                Err(err) => log::warn!("⚠️ 放弃拖入的条目: {}", err),
            }
        }
        added
    }

    async fn capture_file(&self, file: StorageFile) -> Result<Arc<ShelfItem>> {
        let properties = file.basic_properties().await?;
        let presentation = file_presentation(&file, properties.size, &self.settings.labels);
        let target = ThumbnailTarget::File(file.clone());

        let item = self.commit(presentation, ItemPayload::File(file));
        self.spawn_enrichment(&item, EnrichmentJob::Provider(target));
        Ok(item)
    }

    fn capture_folder(&self, folder: StorageFolder) -> Arc<ShelfItem> {
        let presentation = folder_presentation(&folder, &self.settings.labels);
        let target = ThumbnailTarget::Folder(folder.clone());

        let item = self.commit(presentation, ItemPayload::Folder(folder));
        self.spawn_enrichment(&item, EnrichmentJob::Provider(target));
        item
    }

    fn ingest_text(&self, text: String) -> Arc<ShelfItem> {
        let presentation = text_presentation(&text, &self.settings);
        self.commit(presentation, ItemPayload::Text(text))
    }

    fn ingest_bitmap(&self, stream: BitmapStream) -> Arc<ShelfItem> {
        let presentation = bitmap_presentation(stream.size(), &self.settings.labels);
        let decode_copy = stream.duplicate();

        let item = self.commit(presentation, ItemPayload::Bitmap(stream));
        self.spawn_enrichment(&item, EnrichmentJob::Bitmap(decode_copy));
        item
    }

    fn commit(&self, presentation: ItemPresentation, payload: ItemPayload) -> Arc<ShelfItem> {
        let item = Arc::new(ShelfItem::new(presentation, payload));
        self.collection.add(Arc::clone(&item));
        log::info!(
            "📥 已加入条目 {:?}「{}」（{:?}）",
            item.id(),
            item.display_name(),
            item.kind()
        );
        item
    }

    fn spawn_enrichment(&self, item: &Arc<ShelfItem>, job: EnrichmentJob) {
        let Some(guard) = item.begin_thumbnail_task() else {
            return;
        };
        let collection = self.collection.clone();
        let provider = Arc::clone(&self.provider);
        let size = self.settings.thumbnail_size;

        let mut tasks = self.tasks();
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            let thumbnail = match job {
                EnrichmentJob::Provider(target) => {
                    acquire_thumbnail(provider.as_ref(), &target, size).await
                }
                EnrichmentJob::Bitmap(stream) => decode_bitmap(stream, size).await,
            };
            let Some(thumbnail) = thumbnail else {
                return;
            };

            match guard.item() {
                Some(item) if collection.contains(item.id()) => {
                    item.set_thumbnail(thumbnail);
                    log::debug!("🖼️ 缩略图已就绪 {:?}", item.id());
                }
                _ => log::debug!("条目已删除，丢弃迟到的缩略图"),
            }
        });
    }

    fn tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.enrichment
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// 同步取出拖入内容，位图流在此立即复制
fn take_content(view: &DataPackageView) -> Option<DropContent> {
    match view.preferred_format()? {
        StandardFormat::StorageItems => view
            .storage_items()
            .map(|items| DropContent::Entries(items.to_vec())),
        StandardFormat::Text => view.text().map(|text| DropContent::Text(text.to_string())),
        StandardFormat::Bitmap => view
            .bitmap()
            .map(|bitmap| DropContent::Bitmap(bitmap.duplicate())),
    }
}

async fn decode_bitmap(mut stream: BitmapStream, size: u32) -> Option<Thumbnail> {
    let decoded = match stream.read_remaining() {
        Ok(bytes) => decode_off_thread(bytes, size).await,
        Err(err) => Err(ShelfError::from(err)),
    };
    match decoded {
        Ok(thumbnail) => Some(thumbnail),
        Err(err) => {
            log::debug!("位图缩略图解码失败，保持图标: {}", err);
            None
        }
    }
}

fn with_separator(kind: &str, size: &str, labels: &Labels) -> String {
    if kind.is_empty() {
        size.to_string()
    } else {
        format!("{}{}{}", kind, labels.separator, size)
    }
}

fn file_presentation(file: &StorageFile, size: u64, labels: &Labels) -> ItemPresentation {
    let file_type = file.file_type();
    let size_text = format_size(size);
    ItemPresentation {
        display_name: file.name(),
        description: with_separator(&file_type.to_uppercase(), &size_text, labels),
        icon: resolve_icon(&file_type),
        size_text,
    }
}

fn folder_presentation(folder: &StorageFolder, labels: &Labels) -> ItemPresentation {
    ItemPresentation {
        display_name: folder.name(),
        description: labels.folder_description.clone(),
        icon: IconGlyph::Folder,
        size_text: String::new(),
    }
}

fn text_presentation(text: &str, settings: &ShelfSettings) -> ItemPresentation {
    let preview = text_preview(text, settings.preview_chars, &settings.ellipsis);
    ItemPresentation {
        display_name: preview.clone(),
        description: preview,
        icon: IconGlyph::PlainText,
        size_text: format_size(text.len() as u64),
    }
}

fn bitmap_presentation(size: u64, labels: &Labels) -> ItemPresentation {
    let size_text = format_size(size);
    ItemPresentation {
        display_name: labels.bitmap_name.clone(),
        description: with_separator(&labels.bitmap_description, &size_text, labels),
        icon: IconGlyph::Image,
        size_text,
    }
}
