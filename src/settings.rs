//! 应用设置模块
//!
//! # 设计思路
//!
//! 将所有"可调策略"集中到 `ShelfSettings`：缩略图尺寸、文本预览长度、
//! 临时目录、窗口尺寸与标题栏配色、本地化标签以及多窗口同步模式。
//! 每个字段都有默认值，设置文件缺失时直接使用默认配置。
//!
//! # 实现思路
//!
//! - 使用 `serde` 派生，字段以 camelCase 存储，缺省字段回退到 `Default`。
//! - 设置文件路径：显式参数 > 环境变量 `DROPSHELF_SETTINGS` > 系统配置目录。
//! - 文件不存在返回默认值；解析失败返回 `ShelfError::Settings`。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, ShelfError};

/// 设置文件路径的环境变量
pub const SETTINGS_ENV_VAR: &str = "DROPSHELF_SETTINGS";

/// 多窗口同步模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// 扩展窗口直接观察同一个集合实例
    #[default]
    Shared,
    /// 扩展窗口持有快照 + 删除回调
    Callback,
}

/// ARGB 颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argb {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Argb {
    pub const TRANSPARENT: Argb = Argb::new(0, 255, 255, 255);

    pub const fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }
}

/// 标题栏按钮配色
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TitleBarSettings {
    pub button_background: Argb,
    pub button_inactive_background: Argb,
    pub button_hover_background: Argb,
    pub button_pressed_background: Argb,
}

impl Default for TitleBarSettings {
    fn default() -> Self {
        Self {
            button_background: Argb::TRANSPARENT,
            button_inactive_background: Argb::TRANSPARENT,
            button_hover_background: Argb::new(255, 232, 17, 35),
            button_pressed_background: Argb::new(255, 197, 15, 31),
        }
    }
}

/// 单个窗口的尺寸与行为配置
///
/// 反序列化时缺省的字段回退到所属角色（主窗口 / 扩展窗口）的默认值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    /// 失焦后是否立即重新激活
    pub retain_focus: bool,
    pub always_on_top: bool,
}

/// 设置文件中窗口对象的原始形态，字段均可缺省
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct WindowOverrides {
    width: Option<u32>,
    height: Option<u32>,
    resizable: Option<bool>,
    retain_focus: Option<bool>,
    always_on_top: Option<bool>,
}

impl WindowOverrides {
    fn apply(self, base: WindowSettings) -> WindowSettings {
        WindowSettings {
            width: self.width.unwrap_or(base.width),
            height: self.height.unwrap_or(base.height),
            resizable: self.resizable.unwrap_or(base.resizable),
            retain_focus: self.retain_focus.unwrap_or(base.retain_focus),
            always_on_top: self.always_on_top.unwrap_or(base.always_on_top),
        }
    }
}

fn primary_window_or_default<'de, D>(deserializer: D) -> std::result::Result<WindowSettings, D::Error>
where
    D: Deserializer<'de>,
{
    WindowOverrides::deserialize(deserializer).map(|o| o.apply(WindowSettings::primary()))
}

fn expanded_window_or_default<'de, D>(deserializer: D) -> std::result::Result<WindowSettings, D::Error>
where
    D: Deserializer<'de>,
{
    WindowOverrides::deserialize(deserializer).map(|o| o.apply(WindowSettings::expanded()))
}

impl WindowSettings {
    fn primary() -> Self {
        Self {
            width: 318,
            height: 315,
            resizable: false,
            retain_focus: false,
            always_on_top: true,
        }
    }

    fn expanded() -> Self {
        Self {
            width: 700,
            height: 550,
            resizable: true,
            retain_focus: true,
            always_on_top: true,
        }
    }
}

/// 本地化的固定文案
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Labels {
    pub folder_description: String,
    pub bitmap_name: String,
    pub bitmap_description: String,
    pub drag_over_caption: String,
    /// 描述行中类型与大小之间的分隔符
    pub separator: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            folder_description: "Folder".to_string(),
            bitmap_name: "Image".to_string(),
            bitmap_description: "Bitmap".to_string(),
            drag_over_caption: "Add to DropShelf".to_string(),
            separator: " · ".to_string(),
        }
    }
}

/// 货架设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShelfSettings {
    /// 缩略图边长（像素）
    pub thumbnail_size: u32,
    /// 文本预览保留的字符数
    pub preview_chars: usize,
    /// 文本被截断时追加的省略标记
    pub ellipsis: String,
    /// 临时目录覆盖；为空时使用系统临时目录下的 `dropshelf`
    pub temp_dir: Option<PathBuf>,
    pub temp_file_prefix: String,
    pub temp_file_extension: String,
    #[serde(deserialize_with = "primary_window_or_default")]
    pub primary_window: WindowSettings,
    #[serde(deserialize_with = "expanded_window_or_default")]
    pub expanded_window: WindowSettings,
    pub title_bar: TitleBarSettings,
    pub labels: Labels,
    pub sync_mode: SyncMode,
}

impl Default for ShelfSettings {
    fn default() -> Self {
        Self {
            thumbnail_size: 48,
            preview_chars: 50,
            ellipsis: "...".to_string(),
            temp_dir: None,
            temp_file_prefix: "temp_image_".to_string(),
            temp_file_extension: "png".to_string(),
            primary_window: WindowSettings::primary(),
            expanded_window: WindowSettings::expanded(),
            title_bar: TitleBarSettings::default(),
            labels: Labels::default(),
            sync_mode: SyncMode::default(),
        }
    }
}

impl ShelfSettings {
    /// 解析设置文件路径
    ///
    /// 显式路径优先，其次是 `DROPSHELF_SETTINGS`，最后是系统配置目录。
    pub fn resolve_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path);
        }
        if let Some(path) = std::env::var_os(SETTINGS_ENV_VAR) {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ShelfError::Settings("无法获取系统配置目录".to_string()))?;
        Ok(config_dir.join("dropshelf").join("settings.json"))
    }

    /// 读取设置文件
    ///
    /// # 返回
    /// - `Ok(ShelfSettings)` — 文件不存在时为默认配置
    /// - `Err(ShelfError::Settings)` — 文件存在但无法解析
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("设置文件不存在，使用默认配置: {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| ShelfError::Settings(format!("解析设置文件失败: {}", e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ShelfError::Settings(format!("创建设置目录失败: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ShelfError::Settings(format!("序列化设置失败: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// 应用私有的临时目录
    pub fn temp_dir(&self) -> PathBuf {
        match &self.temp_dir {
            Some(dir) if !dir.as_os_str().is_empty() => dir.clone(),
            _ => std::env::temp_dir().join("dropshelf"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = ShelfSettings::load(&dir.path().join("absent.json")).expect("defaults");
        assert_eq!(settings, ShelfSettings::default());
        assert_eq!(settings.thumbnail_size, 48);
        assert_eq!(settings.primary_window.width, 318);
        assert_eq!(settings.expanded_window.height, 550);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "previewChars": 10, "syncMode": "callback" }"#).expect("write");

        let settings = ShelfSettings::load(&path).expect("parse");
        assert_eq!(settings.preview_chars, 10);
        assert_eq!(settings.sync_mode, SyncMode::Callback);
        assert_eq!(settings.ellipsis, "...");
        assert_eq!(settings.labels, Labels::default());
    }

    #[test]
    fn partial_window_object_keeps_role_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{ "primaryWindow": { "retainFocus": true }, "expandedWindow": { "width": 900 } }"#,
        )
        .expect("write");

        let settings = ShelfSettings::load(&path).expect("parse");
        assert!(settings.primary_window.retain_focus);
        assert_eq!(settings.primary_window.width, 318);
        assert_eq!(settings.primary_window.height, 315);
        assert!(!settings.primary_window.resizable);
        assert!(settings.primary_window.always_on_top);

        assert_eq!(settings.expanded_window.width, 900);
        assert_eq!(settings.expanded_window.height, 550);
        assert!(settings.expanded_window.resizable);
        assert!(settings.expanded_window.retain_focus);
    }

    #[test]
    fn malformed_file_is_a_settings_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").expect("write");

        let err = ShelfSettings::load(&path).unwrap_err();
        assert!(matches!(err, ShelfError::Settings(_)));
    }

    #[test]
    fn save_then_load_preserves_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = ShelfSettings::default();
        settings.temp_dir = Some(dir.path().join("tmp"));
        settings.expanded_window.retain_focus = false;
        settings.save(&path).expect("save");

        let loaded = ShelfSettings::load(&path).expect("load");
        assert_eq!(loaded.temp_dir(), dir.path().join("tmp"));
        assert!(!loaded.expanded_window.retain_focus);
    }

    #[test]
    fn explicit_path_wins() {
        let path = PathBuf::from("/tmp/custom.json");
        assert_eq!(ShelfSettings::resolve_path(Some(path.clone())).expect("path"), path);
    }
}
