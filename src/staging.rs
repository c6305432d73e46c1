//! 解压暂存目录：仅在选择器是压缩包时清空并重建，作为解压目标

use std::{fs::{self, File}, path::{Path, PathBuf}};
use zip::ZipArchive;

use crate::error::ResolveError;

#[derive(Debug, Clone)]
pub(crate) struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// 删除旧目录（尽力而为）并重新创建，保证上次运行的文件不会残留
    pub(crate) fn reset(dir: impl Into<PathBuf>) -> Result<Self, ResolveError> {
        let dir = dir.into();
        if let Err(e) = fs::remove_dir_all(&dir) {
            tracing::debug!(path = %dir.display(), error = %e, "staging dir not removed");
        }
        fs::create_dir_all(&dir).map_err(|source| ResolveError::Staging { path: dir.clone(), source })?;
        tracing::debug!(path = %dir.display(), "staging dir ready");
        Ok(Self { dir })
    }

    /// 为压缩包准备暂存目录：拒绝会删掉压缩包本身的目录，然后重建
    pub(crate) fn for_archive(dir: impl Into<PathBuf>, archive: &Path) -> Result<Self, ResolveError> {
        let dir = dir.into();
        if let (Ok(stage), Ok(source)) = (fs::canonicalize(&dir), fs::canonicalize(archive)) {
            if source.starts_with(&stage) {
                return Err(ResolveError::StagingConflict { staging: dir, path: archive.to_path_buf() });
            }
        }
        Self::reset(dir)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.dir
    }

    /// 将整个压缩包解压到暂存目录
    pub(crate) fn extract(&self, archive: &Path) -> Result<(), ResolveError> {
        let unzip_err = |source| ResolveError::Unzip { path: archive.to_path_buf(), source };
        let file = File::open(archive).map_err(|e| unzip_err(zip::result::ZipError::Io(e)))?;
        let mut zip = ZipArchive::new(file).map_err(unzip_err)?;
        tracing::debug!(entries = zip.len(), archive = %archive.display(), "extracting");
        zip.extract(&self.dir).map_err(unzip_err)?;
        Ok(())
    }
}
