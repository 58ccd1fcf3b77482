use crate::config::FileTypeTable;
use anyhow::Result;
use log::warn;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 遞迴掃描目錄，回傳副檔名符合影片類型的檔案（依路徑排序）
///
/// 先收集完整清單再處理，處理過程中新產生的檔案不會被重複列入。
pub fn scan_video_files(directory: &Path, file_type_table: &FileTypeTable) -> Result<Vec<PathBuf>> {
    let mut video_files: Vec<PathBuf> = WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("無法讀取，略過: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| file_type_table.is_video_file(entry.path()))
        .map(walkdir::DirEntry::into_path)
        .collect();

    video_files.sort();
    Ok(video_files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_filters_by_extension_recursively() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("deeper");
        fs::create_dir_all(&nested).unwrap();

        fs::write(temp_dir.path().join("a.mp4"), b"a").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), b"n").unwrap();
        fs::write(nested.join("B.MKV"), b"b").unwrap();
        fs::write(nested.join("c.webm"), b"c").unwrap();
        fs::write(nested.join("mp4"), b"no extension").unwrap();

        let table = FileTypeTable::default();
        let files = scan_video_files(temp_dir.path(), &table).unwrap();

        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| table.is_video_file(f)));
        assert!(!files.iter().any(|f| f.ends_with("notes.txt")));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let locked = temp_dir.path().join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("hidden.mp4"), b"h").unwrap();
        fs::write(temp_dir.path().join("visible.mp4"), b"v").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let result = scan_video_files(temp_dir.path(), &FileTypeTable::default());
        // root 不受權限限制，此時目錄仍可讀取
        let still_readable = fs::read_dir(&locked).is_ok();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let files = result.unwrap();
        assert!(files.iter().any(|f| f.ends_with("visible.mp4")));
        if !still_readable {
            assert_eq!(files.len(), 1);
        }
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let files = scan_video_files(temp_dir.path(), &FileTypeTable::default()).unwrap();
        assert!(files.is_empty());
    }
}
