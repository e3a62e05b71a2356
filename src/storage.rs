//! 存储句柄与临时目录管理模块
//!
//! # 设计思路
//!
//! - `StorageFile` / `StorageFolder`：拖入的文件系统条目的轻量引用，只保存路径与名称，
//!   属性（大小）按需异步读取；句柄失效时读取失败，由上层决定放弃该条目。
//! - `BitmapStream`：独占、可寻址的位图字节流。内部使用 `Bytes` 共享底层缓冲，
//!   `duplicate()` 得到位置归零的独立副本，从而"复制而非共享"流对象本身。
//! - 临时目录：位图拖出时落盘的应用私有区域，不存在时自动创建。
//!
//! # 实现思路
//!
//! - 属性读取使用 `tokio::fs::metadata`，不阻塞调用线程。
//! - `BitmapStream` 不实现 `Clone`，副本只能通过 `duplicate()` 显式获得。
//! - 所有可能失败的操作均返回 `Result`，不使用 `expect()` / `unwrap()`。

use std::ffi::OsStr;
use std::fs;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::Serialize;

use crate::error::{Result, ShelfError};

/// 文件基本属性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicProperties {
    /// 字节大小
    pub size: u64,
}

/// 已拖入文件的引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageFile {
    path: PathBuf,
}

impl StorageFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 文件名（含扩展名）
    pub fn name(&self) -> String {
        entry_name(&self.path)
    }

    /// 带点号的扩展名，如 `.png`；无扩展名时为空串
    pub fn file_type(&self) -> String {
        self.path
            .extension()
            .and_then(OsStr::to_str)
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default()
    }

    /// 读取基本属性
    ///
    /// 文件已被删除或路径已不是普通文件时返回 `ShelfError::Storage`。
    pub async fn basic_properties(&self) -> Result<BasicProperties> {
        let metadata = tokio::fs::metadata(&self.path).await.map_err(|e| {
            ShelfError::Storage(format!("读取文件属性失败 '{}': {}", self.path.display(), e))
        })?;
        if !metadata.is_file() {
            return Err(ShelfError::Storage(format!(
                "'{}' 不是文件",
                self.path.display()
            )));
        }
        Ok(BasicProperties {
            size: metadata.len(),
        })
    }
}

/// 已拖入文件夹的引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageFolder {
    path: PathBuf,
}

impl StorageFolder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> String {
        entry_name(&self.path)
    }
}

/// 文件系统条目：文件或文件夹
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageEntry {
    File(StorageFile),
    Folder(StorageFolder),
}

impl StorageEntry {
    /// 根据磁盘上的实际类型构造条目
    pub async fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let metadata = tokio::fs::metadata(&path).await.map_err(|e| {
            ShelfError::Storage(format!("无法访问 '{}': {}", path.display(), e))
        })?;
        if metadata.is_dir() {
            Ok(Self::Folder(StorageFolder::new(path)))
        } else {
            Ok(Self::File(StorageFile::new(path)))
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::File(file) => file.path(),
            Self::Folder(folder) => folder.path(),
        }
    }
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

// ============================================================================
// BitmapStream
// ============================================================================

/// 独占的位图字节流
///
/// 新建或复制出的流都位于偏移 0。读取会推进本实例的位置，
/// 但不影响任何其他副本。
#[derive(Debug)]
pub struct BitmapStream {
    cursor: Cursor<Bytes>,
}

impl BitmapStream {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            cursor: Cursor::new(bytes.into()),
        }
    }

    /// 复制出一个位置归零的独立流
    pub fn duplicate(&self) -> Self {
        Self::new(self.cursor.get_ref().clone())
    }

    /// 流总长度（字节）
    pub fn size(&self) -> u64 {
        self.cursor.get_ref().len() as u64
    }

    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// 读出从当前位置到末尾的全部字节
    pub fn read_remaining(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.size().saturating_sub(self.position()) as usize);
        self.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// 转为 `tokio` 可异步读取的游标
    pub fn into_reader(self) -> Cursor<Bytes> {
        self.cursor
    }
}

impl Read for BitmapStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Seek for BitmapStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

// ============================================================================
// 临时目录
// ============================================================================

/// 临时目录信息（路径 + 占用大小 + 文件数）
#[derive(Debug, Clone, Serialize)]
pub struct TempStorageInfo {
    pub path: String,
    pub total_size: u64,
    pub file_count: u64,
}

/// 获取应用私有临时目录，不存在时自动创建
///
/// # 返回
/// - `Ok(PathBuf)` — 可用的临时目录
/// - `Err(ShelfError::Storage)` — 无法创建目录
pub async fn ensure_temp_dir(dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        ShelfError::Storage(format!("创建临时目录 '{}' 失败: {}", dir.display(), e))
    })?;
    Ok(dir.to_path_buf())
}

/// 统计临时目录下的文件
pub fn temp_storage_info(dir: &Path) -> TempStorageInfo {
    let mut total_size: u64 = 0;
    let mut file_count: u64 = 0;

    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            if let Ok(metadata) = entry.metadata() {
                if metadata.is_file() {
                    total_size += metadata.len();
                    file_count += 1;
                }
            }
        }
    }

    TempStorageInfo {
        path: dir.to_string_lossy().to_string(),
        total_size,
        file_count,
    }
}
