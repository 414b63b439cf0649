//! 存储文件名生成：UUID 加原始扩展名。

use uuid::Uuid;

/// 为上传文件生成新的随机存储名。
pub fn generate_stored_name(original: &str) -> String {
    stored_name(Uuid::new_v4(), original)
}

pub fn stored_name(id: Uuid, original: &str) -> String {
    format!("{}{}", id, extension_of(original))
}

/// Extension of the last path segment including the leading dot, or "" when there is none.
///
/// A dot at the start of the segment marks a hidden file, not an extension.
pub fn extension_of(original: &str) -> &str {
    let base = original.rsplit('/').next().unwrap_or(original);
    if base.bytes().all(|b| b == b'.') {
        return "";
    }
    match base.rfind('.') {
        Some(0) | None => "",
        Some(index) => &base[index..],
    }
}
