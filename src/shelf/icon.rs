//! 文件类型图标解析
//!
//! 扩展名 → 字形类别的固定映射表，大小写不敏感，未知扩展名回退到通用文档图标。

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

/// 图标字形类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IconGlyph {
    Image,
    Video,
    Audio,
    Document,
    Archive,
    Executable,
    Code,
    PlainText,
    Folder,
}

impl IconGlyph {
    /// Segoe MDL2 Assets 字体中的码位
    pub fn glyph(self) -> char {
        match self {
            Self::Image => '\u{EB9F}',
            Self::Video => '\u{E8B2}',
            Self::Audio => '\u{EC4F}',
            Self::Document | Self::PlainText => '\u{E8A5}',
            Self::Archive | Self::Folder => '\u{E8B7}',
            Self::Executable => '\u{E8AB}',
            Self::Code => '\u{E943}',
        }
    }
}

static EXTENSION_TABLE: Lazy<HashMap<&'static str, IconGlyph>> = Lazy::new(|| {
    let groups: [(&[&str], IconGlyph); 8] = [
        (&["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp"], IconGlyph::Image),
        (&["mp4", "avi", "mkv", "mov", "wmv"], IconGlyph::Video),
        (&["mp3", "wav", "flac", "aac", "wma"], IconGlyph::Audio),
        (&["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx"], IconGlyph::Document),
        (&["zip", "rar", "7z", "tar", "gz"], IconGlyph::Archive),
        (&["exe", "msi"], IconGlyph::Executable),
        (
            &["cs", "cpp", "h", "py", "js", "html", "css", "json", "xml", "rs"],
            IconGlyph::Code,
        ),
        (&["txt", "log"], IconGlyph::PlainText),
    ];

    groups
        .into_iter()
        .flat_map(|(exts, glyph)| exts.iter().map(move |ext| (*ext, glyph)))
        .collect()
});

/// 根据扩展名解析图标
///
/// 接受带或不带前导点号的扩展名，如 `.PNG` 或 `png`。
///
/// # 示例
/// ```
/// use dropshelf::shelf::{resolve_icon, IconGlyph};
///
/// assert_eq!(resolve_icon(".PNG"), IconGlyph::Image);
/// assert_eq!(resolve_icon(".unknownext"), IconGlyph::Document);
/// ```
pub fn resolve_icon(extension: &str) -> IconGlyph {
    let normalized = extension.trim().trim_start_matches('.').to_lowercase();
    EXTENSION_TABLE
        .get(normalized.as_str())
        .copied()
        .unwrap_or(IconGlyph::Document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(resolve_icon(".PNG"), resolve_icon(".png"));
        assert_eq!(resolve_icon(".Mp4"), IconGlyph::Video);
        assert_eq!(resolve_icon("FLAC"), IconGlyph::Audio);
    }

    #[test]
    fn each_category_resolves() {
        assert_eq!(resolve_icon(".docx"), IconGlyph::Document);
        assert_eq!(resolve_icon(".7z"), IconGlyph::Archive);
        assert_eq!(resolve_icon(".msi"), IconGlyph::Executable);
        assert_eq!(resolve_icon(".json"), IconGlyph::Code);
        assert_eq!(resolve_icon(".log"), IconGlyph::PlainText);
    }

    #[test]
    fn unknown_or_empty_falls_back_to_document() {
        assert_eq!(resolve_icon(".unknownext"), IconGlyph::Document);
        assert_eq!(resolve_icon(""), IconGlyph::Document);
        assert_eq!(resolve_icon("."), IconGlyph::Document);
    }

    #[test]
    fn glyphs_match_font_code_points() {
        assert_eq!(IconGlyph::Image.glyph(), '\u{EB9F}');
        assert_eq!(IconGlyph::Folder.glyph(), '\u{E8B7}');
        assert_eq!(IconGlyph::PlainText.glyph(), IconGlyph::Document.glyph());
    }
}
