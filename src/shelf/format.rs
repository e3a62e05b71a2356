//! 展示文本格式化：字节大小与文本预览

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// 将字节数格式化为人类可读的大小
///
/// 每满 1024 进一级单位（最大 TB），最多保留两位小数并去掉末尾的 0。
///
/// # 示例
/// ```
/// use dropshelf::shelf::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(1536), "1.5 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    let mut len = bytes as f64;
    let mut order = 0;

    while len >= 1024.0 && order < SIZE_UNITS.len() - 1 {
        order += 1;
        len /= 1024.0;
    }

    // 中点远离零舍入，`{:.2}` 对 1.125 这类值会舍成 1.12
    let len = (len * 100.0).round() / 100.0;
    let rounded = format!("{:.2}", len);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[order])
}

/// 截取文本预览
///
/// 不超过 `max_chars` 个字符时原样返回，否则保留前 `max_chars` 个字符并追加 `ellipsis`。
pub fn text_preview(text: &str, max_chars: usize, ellipsis: &str) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ellipsis),
        None => text.to_string(),
    }
}
