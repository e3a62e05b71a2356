//! # 缩略图获取模块
//!
//! ## 设计思路
//!
//! 缩略图是"尽力而为"的增强：条目先出现在集合中，缩略图稍后原地补上。
//! 获取失败不是错误，条目永久使用捕获时确定的回退图标。
//!
//! ## 实现思路
//!
//! 1. 阶段一：向提供方请求 `SingleItem` 预览，非空且可解码即采用
//! 2. 阶段二（仅文件）：阶段一无可用结果时请求 `DocumentsView`
//! 3. 两个阶段各自吞掉错误，提供方异常不会中断整个拖入
//! 4. 解码在阻塞线程池执行，先按像素上限快速拒绝，再降采样到目标边长

use std::path::Path;

use async_trait::async_trait;
use fast_image_resize as fr;
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageFormat, Rgba};

use crate::error::{Result, ShelfError};
use crate::shelf::Thumbnail;
use crate::storage::{StorageFile, StorageFolder};

/// 解码前允许的最大像素数，超出即放弃缩略图
const MAX_DECODED_PIXELS: u64 = 40_000_000;

/// 缩略图请求模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailMode {
    /// 单个条目的内容预览（图片、视频帧等）
    SingleItem,
    /// 文档视图图标（文件类型关联图标）
    DocumentsView,
}

/// 缩略图请求对象
#[derive(Debug, Clone)]
pub enum ThumbnailTarget {
    File(StorageFile),
    Folder(StorageFolder),
}

impl ThumbnailTarget {
    pub fn path(&self) -> &Path {
        match self {
            Self::File(file) => file.path(),
            Self::Folder(folder) => folder.path(),
        }
    }
}

/// 平台缩略图提供方
///
/// 返回编码后的图片字节；`Ok(None)` 或空字节表示没有可用缩略图。
#[async_trait]
pub trait ThumbnailProvider: Send + Sync {
    async fn get_thumbnail(
        &self,
        target: &ThumbnailTarget,
        mode: ThumbnailMode,
        size: u32,
    ) -> Result<Option<Vec<u8>>>;
}

/// 基于 `image` crate 的默认提供方
///
/// 只能为可解码的图片文件生成单条目预览；文档视图与文件夹均无结果。
#[derive(Debug, Clone)]
pub struct ImageFileThumbnailProvider {
    /// 读取源文件的体积上限（字节）
    pub max_file_size: u64,
}

impl Default for ImageFileThumbnailProvider {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
        }
    }
}

#[async_trait]
impl ThumbnailProvider for ImageFileThumbnailProvider {
    async fn get_thumbnail(
        &self,
        target: &ThumbnailTarget,
        mode: ThumbnailMode,
        _size: u32,
    ) -> Result<Option<Vec<u8>>> {
        let ThumbnailTarget::File(file) = target else {
            return Ok(None);
        };
        if mode != ThumbnailMode::SingleItem {
            return Ok(None);
        }

        let decodable = ImageFormat::from_path(file.path())
            .map(|format| format.reading_enabled())
            .unwrap_or(false);
        if !decodable {
            return Ok(None);
        }

        let metadata = tokio::fs::metadata(file.path()).await?;
        if metadata.len() > self.max_file_size {
            log::debug!(
                "图片过大（{} bytes），跳过缩略图: {}",
                metadata.len(),
                file.path().display()
            );
            return Ok(None);
        }

        Ok(Some(tokio::fs::read(file.path()).await?))
    }
}

/// 两阶段获取缩略图
///
/// 任一阶段成功即返回；全部失败返回 `None`，从不报错。
pub async fn acquire_thumbnail(
    provider: &dyn ThumbnailProvider,
    target: &ThumbnailTarget,
    size: u32,
) -> Option<Thumbnail> {
    if let Some(thumbnail) = try_stage(provider, target, ThumbnailMode::SingleItem, size).await {
        return Some(thumbnail);
    }

    if matches!(target, ThumbnailTarget::File(_)) {
        return try_stage(provider, target, ThumbnailMode::DocumentsView, size).await;
    }

    None
}

async fn try_stage(
    provider: &dyn ThumbnailProvider,
    target: &ThumbnailTarget,
    mode: ThumbnailMode,
    size: u32,
) -> Option<Thumbnail> {
    let bytes = match provider.get_thumbnail(target, mode, size).await {
        Ok(Some(bytes)) if !bytes.is_empty() => bytes,
        Ok(_) => {
            log::debug!("缩略图 {:?} 无结果: {}", mode, target.path().display());
            return None;
        }
        Err(err) => {
            log::debug!("缩略图 {:?} 获取失败，继续回退: {}", mode, err);
            return None;
        }
    };

    match decode_off_thread(bytes, size).await {
        Ok(thumbnail) => Some(thumbnail),
        Err(err) => {
            log::debug!("缩略图 {:?} 解码失败，继续回退: {}", mode, err);
            None
        }
    }
}

/// 在阻塞线程池中解码
pub(crate) async fn decode_off_thread(bytes: Vec<u8>, size: u32) -> Result<Thumbnail> {
    tokio::task::spawn_blocking(move || decode_thumbnail(&bytes, size))
        .await
        .map_err(|e| ShelfError::Thumbnail(format!("解码线程执行失败: {}", e)))?
}

/// 将编码后的图片字节解码为不超过 `size`×`size` 的 RGBA 缩略图
///
/// 保持宽高比，只缩小不放大。
pub fn decode_thumbnail(bytes: &[u8], size: u32) -> Result<Thumbnail> {
    let (header_width, header_height) = inspect_dimensions(bytes)?;
    let pixels = (header_width as u64).saturating_mul(header_height as u64);
    if pixels > MAX_DECODED_PIXELS {
        return Err(ShelfError::Decode(format!(
            "图片像素过大：{} 像素（限制：{} 像素）",
            pixels, MAX_DECODED_PIXELS
        )));
    }

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| ShelfError::Decode(format!("图片解码失败：{}", e)))?;
    let scaled = downscale_to_fit(decoded, size.max(1));
    let (width, height) = scaled.dimensions();

    Ok(Thumbnail {
        width,
        height,
        rgba: scaled.to_rgba8().into_raw(),
    })
}

fn inspect_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    image::ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ShelfError::Decode(format!("无法识别图片格式：{}", e)))?
        .into_dimensions()
        .map_err(|e| ShelfError::Decode(format!("无法读取图片尺寸：{}", e)))
}

fn downscale_to_fit(image: DynamicImage, size: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width <= size && height <= size {
        return image;
    }

    let scale = (size as f64 / width as f64).min(size as f64 / height as f64);
    let target_width = ((width as f64 * scale).round() as u32).clamp(1, size);
    let target_height = ((height as f64 * scale).round() as u32).clamp(1, size);

    match resize_with_fast_image_resize(&image, target_width, target_height) {
        Ok(resized) => resized,
        Err(err) => {
            log::debug!("fast_image_resize 降采样失败，回退 image::resize_exact：{}", err);
            image.resize_exact(
                target_width,
                target_height,
                image::imageops::FilterType::Triangle,
            )
        }
    }
}

fn resize_with_fast_image_resize(
    image: &DynamicImage,
    target_width: u32,
    target_height: u32,
) -> Result<DynamicImage> {
    let src = image.to_rgba8();
    let (src_width, src_height) = src.dimensions();

    let src_image =
        fr::images::Image::from_vec_u8(src_width, src_height, src.into_raw(), fr::PixelType::U8x4)
            .map_err(|e| ShelfError::Decode(format!("构建源图像缓冲失败：{}", e)))?;

    let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new()
        .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Bilinear));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| ShelfError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

    let rgba = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(
        target_width,
        target_height,
        dst_image.into_vec(),
    )
    .ok_or_else(|| ShelfError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))?;

    Ok(DynamicImage::ImageRgba8(rgba))
}
