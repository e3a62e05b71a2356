//! # 拖出流水线
//!
//! ## 设计思路
//!
//! 将条目转换为交给平台的拖出数据包，请求的操作始终为复制：
//!
//! - 文件 / 文件夹：直接附加存储句柄
//! - 文本：附加完整文本
//! - 位图：复制条目的流并写入应用私有临时目录下的新文件，
//!   同时附加该临时文件与位图流（双重表示，接收方各取所需）
//!
//! ## 实现思路
//!
//! - 条目自身的位图流从不被读取，每次导出都取独立副本，重复导出结果逐字节一致。
//! - 临时文件名为"前缀 + UUID v4 + 固定扩展名"，已存在时直接覆盖。
//! - `export` 返回 `Result` 供调用方区分失败原因；`begin_drag` 吞掉失败，
//!   导出失败的拖动不携带任何数据。

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::{DataPackage, DragOperation};
use crate::error::{Result, ShelfError};
use crate::settings::ShelfSettings;
use crate::shelf::{ItemPayload, ShelfItem};
use crate::storage::{self, BitmapStream, StorageEntry, StorageFile, TempStorageInfo};

/// 拖出导出器
#[derive(Debug, Clone)]
pub struct DragExporter {
    temp_dir: PathBuf,
    file_prefix: String,
    file_extension: String,
}

impl DragExporter {
    pub fn new(settings: &ShelfSettings) -> Self {
        Self {
            temp_dir: settings.temp_dir(),
            file_prefix: settings.temp_file_prefix.clone(),
            file_extension: settings.temp_file_extension.clone(),
        }
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// 拖动开始：导出条目，失败时返回 `None`
    pub async fn begin_drag(&self, item: &ShelfItem) -> Option<DataPackage> {
        match self.export(item).await {
            Ok(package) => Some(package),
            Err(err) => {
                log::warn!("⚠️ 拖出导出失败，本次拖动不携带数据: {}", err);
                None
            }
        }
    }

    /// 将条目转换为拖出数据包
    pub async fn export(&self, item: &ShelfItem) -> Result<DataPackage> {
        let mut package = DataPackage::default();

        match item.payload() {
            ItemPayload::File(file) => {
                package.storage_items.push(StorageEntry::File(file.clone()));
            }
            ItemPayload::Folder(folder) => {
                package.storage_items.push(StorageEntry::Folder(folder.clone()));
            }
            ItemPayload::Text(text) => {
                package.text = Some(text.clone());
            }
            ItemPayload::Bitmap(stream) => {
                let temp_file = self.materialize_bitmap(stream).await?;
                package.storage_items.push(StorageEntry::File(temp_file));
                package.bitmap = Some(stream.duplicate());
            }
        }

        package.requested_operation = DragOperation::Copy;
        log::info!("📤 已导出条目 {:?}（{:?}）", item.id(), item.kind());
        Ok(package)
    }

    /// 将位图写入新的临时文件
    async fn materialize_bitmap(&self, stream: &BitmapStream) -> Result<StorageFile> {
        let temp_dir = storage::ensure_temp_dir(&self.temp_dir)
            .await
            .map_err(|e| ShelfError::Export(e.to_string()))?;

        let file_name = format!(
            "{}{}.{}",
            self.file_prefix,
            Uuid::new_v4(),
            self.file_extension
        );
        let path = temp_dir.join(file_name);

        if let Err(err) = write_stream(&path, stream.duplicate()).await {
            if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                log::debug!("清理未写完的临时文件失败: {}", cleanup);
            }
            return Err(ShelfError::Export(format!(
                "写入临时文件 '{}' 失败: {}",
                path.display(),
                err
            )));
        }

        log::debug!("💾 位图已写入临时文件: {}", path.display());
        Ok(StorageFile::new(path))
    }

    /// 删除临时目录中本应用生成的导出文件
    ///
    /// 只匹配"前缀 + 扩展名"的文件，返回删除数量。
    pub fn purge_temp_files(&self) -> Result<usize> {
        if !self.temp_dir.exists() {
            return Ok(0);
        }

        let suffix = format!(".{}", self.file_extension);
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.temp_dir)?.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            let is_export = name.starts_with(&self.file_prefix) && name.ends_with(&suffix);
            if !is_export || !entry.path().is_file() {
                continue;
            }
            match std::fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(err) => log::warn!("删除临时文件 '{}' 失败: {}", name, err),
            }
        }

        if removed > 0 {
            log::info!("🧹 已清理 {} 个临时导出文件", removed);
        }
        Ok(removed)
    }

    pub fn temp_storage_info(&self) -> TempStorageInfo {
        storage::temp_storage_info(&self.temp_dir)
    }
}

async fn write_stream(path: &Path, stream: BitmapStream) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut reader = stream.into_reader();
    tokio::io::copy(&mut reader, &mut file).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shelf::{IconGlyph, ItemPresentation};
    use crate::storage::StorageFolder;

    fn item(payload: ItemPayload) -> ShelfItem {
        ShelfItem::new(
            ItemPresentation {
                display_name: "x".to_string(),
                description: "x".to_string(),
                icon: IconGlyph::Document,
                size_text: String::new(),
            },
            payload,
        )
    }

    fn exporter_in(dir: &Path) -> DragExporter {
        let mut settings = ShelfSettings::default();
        settings.temp_dir = Some(dir.to_path_buf());
        DragExporter::new(&settings)
    }

    #[tokio::test]
    async fn file_and_folder_export_their_handles() {
        let dir = tempfile::tempdir().expect("tempdir");
        let exporter = exporter_in(dir.path());

        let file = StorageFile::new("/tmp/a.txt");
        let package = exporter
            .export(&item(ItemPayload::File(file.clone())))
            .await
            .expect("export");
        assert_eq!(package.storage_items, vec![StorageEntry::File(file)]);
        assert_eq!(package.requested_operation, DragOperation::Copy);

        let folder = StorageFolder::new("/tmp");
        let package = exporter
            .export(&item(ItemPayload::Folder(folder.clone())))
            .await
            .expect("export");
        assert_eq!(package.storage_items, vec![StorageEntry::Folder(folder)]);
    }

    #[tokio::test]
    async fn text_export_carries_full_text() {
        let dir = tempfile::tempdir().expect("tempdir");
        let long = "x".repeat(200);
        let package = exporter_in(dir.path())
            .export(&item(ItemPayload::Text(long.clone())))
            .await
            .expect("export");
        assert_eq!(package.text, Some(long));
        assert!(package.storage_items.is_empty());
    }

    #[tokio::test]
    async fn bitmap_export_writes_unique_temp_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let exporter = exporter_in(dir.path());
        let bytes = vec![7u8; 4096];
        let bitmap = item(ItemPayload::Bitmap(BitmapStream::new(bytes.clone())));

        let first = exporter.export(&bitmap).await.expect("first export");
        let second = exporter.export(&bitmap).await.expect("second export");

        let first_path = first.storage_items[0].path().to_path_buf();
        let second_path = second.storage_items[0].path().to_path_buf();
        assert_ne!(first_path, second_path);
        assert_eq!(std::fs::read(&first_path).expect("read"), bytes);
        assert_eq!(std::fs::read(&second_path).expect("read"), bytes);

        let name = first_path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("temp_image_"));
        assert!(name.ends_with(".png"));

        let mut inline = second.bitmap.expect("inline bitmap");
        assert_eq!(inline.read_remaining().expect("read"), bytes);
    }

    #[tokio::test]
    async fn bitmap_export_creates_missing_temp_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let exporter = exporter_in(&dir.path().join("not").join("yet"));
        let bitmap = item(ItemPayload::Bitmap(BitmapStream::new(vec![9u8; 8])));

        let package = exporter.export(&bitmap).await.expect("export");
        assert!(package.storage_items[0].path().starts_with(exporter.temp_dir()));
        assert!(exporter.temp_dir().is_dir());
    }

    #[tokio::test]
    async fn export_failure_yields_no_payload() {
        let dir = tempfile::tempdir().expect("tempdir");
        // 临时目录路径被普通文件占用，无法创建目录
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, b"").expect("write");
        let exporter = exporter_in(&blocker.join("nested"));

        let bitmap = item(ItemPayload::Bitmap(BitmapStream::new(vec![1u8, 2, 3])));
        assert!(matches!(
            exporter.export(&bitmap).await,
            Err(ShelfError::Export(_))
        ));
        assert!(exporter.begin_drag(&bitmap).await.is_none());
    }

    #[tokio::test]
    async fn purge_only_removes_export_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let exporter = exporter_in(dir.path());
        let bitmap = item(ItemPayload::Bitmap(BitmapStream::new(vec![1u8; 16])));
        exporter.export(&bitmap).await.expect("export");
        exporter.export(&bitmap).await.expect("export");
        std::fs::write(dir.path().join("keep.png"), b"user").expect("write");

        assert_eq!(exporter.temp_storage_info().file_count, 3);
        assert_eq!(exporter.purge_temp_files().expect("purge"), 2);
        assert!(dir.path().join("keep.png").exists());
        assert_eq!(exporter.temp_storage_info().file_count, 1);
    }
}
