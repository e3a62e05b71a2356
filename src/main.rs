//! # DropShelf — 无界面驱动程序
//!
//! 把命令行参数中的路径作为一次拖入（无参数时读取标准输入：
//! UTF-8 文本按文本拖入，其它字节按位图拖入），打印货架内容，
//! 再逐个拖出条目，展示位图的临时文件落盘。

use std::sync::Arc;

use dropshelf::error::Result;
use dropshelf::settings::ShelfSettings;
use dropshelf::storage::{BitmapStream, StorageEntry};
use dropshelf::transfer::{DataPackage, DataPackageView, ImageFileThumbnailProvider};
use dropshelf::window::{WindowChrome, WindowHost};
use dropshelf::ShelfApp;
use tokio::io::AsyncReadExt;

/// 没有原生窗口时的宿主：记录外观并总是接受激活
struct HeadlessHost;

impl WindowHost for HeadlessHost {
    fn apply_chrome(&self, chrome: &WindowChrome) -> Result<()> {
        log::debug!(
            "窗口外观: {}x{}，置顶: {}，可调整大小: {}",
            chrome.width,
            chrome.height,
            chrome.always_on_top,
            chrome.resizable
        );
        Ok(())
    }

    fn activate(&self) -> bool {
        true
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run().await {
        log::error!("❌ 运行失败: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let settings_path = ShelfSettings::resolve_path(None)?;
    let settings = ShelfSettings::load(&settings_path)?;

    let app = ShelfApp::new(
        settings,
        Arc::new(ImageFileThumbnailProvider::default()),
        Arc::new(HeadlessHost),
    )?;
    app.primary().presence.open();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    let view = if paths.is_empty() {
        read_stdin_view().await?
    } else {
        read_path_view(paths).await
    };

    app.drag_over();
    app.handle_drop(&view).await;
    app.settle().await;

    let status = app.primary().view.status();
    println!("DropShelf: {}", status.count_label);
    for item in app.collection().snapshot() {
        let preview = match item.thumbnail() {
            Some(thumbnail) => format!("{}x{}", thumbnail.width, thumbnail.height),
            None => item.icon().glyph().escape_unicode().to_string(),
        };
        println!(
            "  [{}] {}  {}  ({})",
            preview,
            item.display_name(),
            item.description(),
            item.captured_at().format("%H:%M:%S")
        );
    }

    for item in app.collection().snapshot() {
        let name = item.display_name().to_string();
        match app.begin_drag(item).wait().await {
            Some(package) => println!("drag out {}: {}", name, describe(&package)),
            None => println!("drag out {}: no data", name),
        }
    }

    let info = app.temp_storage_info();
    println!(
        "temp: {} ({} files, {} bytes)",
        info.path, info.file_count, info.total_size
    );
    Ok(())
}

async fn read_path_view(paths: Vec<String>) -> DataPackageView {
    let mut entries = Vec::with_capacity(paths.len());
    for path in paths {
        match StorageEntry::from_path(&path).await {
            Ok(entry) => entries.push(entry),
            Err(err) => log::warn!("⚠️ 跳过 {}: {}", path, err),
        }
    }
    DataPackageView::new().with_storage_items(entries)
}

async fn read_stdin_view() -> Result<DataPackageView> {
    let mut bytes = Vec::new();
    tokio::io::stdin().read_to_end(&mut bytes).await?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => DataPackageView::new().with_text(text),
        Err(err) => DataPackageView::new().with_bitmap(BitmapStream::new(err.into_bytes())),
    })
}

fn describe(package: &DataPackage) -> String {
    let mut parts: Vec<String> = package
        .storage_items
        .iter()
        .map(|entry| entry.path().display().to_string())
        .collect();
    if let Some(text) = &package.text {
        parts.push(format!("text ({} bytes)", text.len()));
    }
    if let Some(bitmap) = &package.bitmap {
        parts.push(format!("bitmap ({} bytes)", bitmap.size()));
    }
    format!("{:?} [{}]", package.requested_operation, parts.join(", "))
}
