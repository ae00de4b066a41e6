//! 数据目录文件操作

use mldm_core::{MldmError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 创建目录（含父目录），已存在时直接返回
pub fn ensure_dir<P: AsRef<Path>>(dir: P) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| {
        MldmError::Storage(format!("无法创建目录 {}: {}", dir.display(), e))
    })?;
    Ok(dir.to_path_buf())
}

/// 列出目录下（不递归）满足条件的普通文件，按文件名排序
pub fn list_files_where<P, F>(dir: P, predicate: F) -> Result<Vec<PathBuf>>
where
    P: AsRef<Path>,
    F: Fn(&Path) -> bool,
{
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(MldmError::NotFound(format!("目录不存在: {}", dir.display())));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && predicate(&path) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!("目录 {:?} 中匹配文件数: {}", dir, files.len());
    Ok(files)
}

/// 列出目录下（不递归）指定扩展名的文件，扩展名区分大小写
pub fn list_files_with_extension<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
    list_files_where(dir, |path| mldm_core::utils::has_extension(path, extension))
}

/// 将文件复制到目标目录，保留文件名；返回目标路径
pub fn copy_into<P: AsRef<Path>, Q: AsRef<Path>>(file: P, dest_dir: Q) -> Result<PathBuf> {
    let file = file.as_ref();
    let file_name = file
        .file_name()
        .ok_or_else(|| MldmError::InvalidInput(format!("无效文件路径: {}", file.display())))?;

    let target = dest_dir.as_ref().join(file_name);
    fs::copy(file, &target).map_err(|e| {
        MldmError::Storage(format!(
            "复制文件失败 {} -> {}: {}",
            file.display(),
            target.display(),
            e
        ))
    })?;
    Ok(target)
}

/// 文件名（不含扩展名）
pub fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| MldmError::InvalidInput(format!("无效文件名: {}", path.display())))
}

/// 文件名
pub fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| MldmError::InvalidInput(format!("无效文件名: {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_files_with_extension() {
        let dir = TempDir::new().unwrap();
        for name in ["b.png", "a.png", "c.PNG", "d.dcm"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.png")).unwrap();

        let files = list_files_with_extension(dir.path(), "png").unwrap();
        let names: Vec<_> = files.iter().map(|p| file_name(p).unwrap()).collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
    }

    #[test]
    fn test_list_files_missing_dir() {
        let result = list_files_with_extension("/nonexistent/dir", "png");
        assert!(matches!(result, Err(MldmError::NotFound(_))));
    }

    #[test]
    fn test_copy_into_preserves_name_and_source() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.png");
        fs::write(&src, b"pixels").unwrap();
        let dest = ensure_dir(dir.path().join("out/train")).unwrap();

        let copied = copy_into(&src, &dest).unwrap();

        assert_eq!(copied, dest.join("a.png"));
        assert_eq!(fs::read(&copied).unwrap(), b"pixels");
        assert!(src.exists());
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Path::new("x/scan01.dcm")).unwrap(), "scan01");
    }
}
