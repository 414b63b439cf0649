//! 媒体文件只读访问：把 `/media` 映射到存储根目录。

use tower_http::services::ServeDir;

use crate::storage::Storage;

/// Serves `<category>/<name>` straight from the storage root.
///
/// Content type comes from the file extension. Directories are never listed
/// and unknown paths answer 404.
pub fn media_service(storage: &Storage) -> ServeDir {
    ServeDir::new(storage.root_path()).append_index_html_on_directories(false)
}
