//! 选择器分类：按顺序匹配（先匹配者优先）
//! 1. Scratch 项目 URL  2. 以数字开头的文本  3. 本地路径（文件或目录）

use once_cell::sync::Lazy;
use regex::Regex;
use std::{fs, path::PathBuf};

use crate::error::ResolveError;

static SCRATCH_PROJECT_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://scratch\.mit\.edu/projects/(\d+)").expect("valid regex"));

// 只看开头的数字：`123abc` 解析为 `123`（保留的宽松匹配）
static SCRATCH_PROJECT_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)").expect("valid regex"));

/// 已分类的项目来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Selector {
    RemoteById(String),
    LocalArchive(PathBuf),
    LocalDirectory(PathBuf),
}

impl Selector {
    /// 分类选择器；本地路径不存在时报错
    pub(crate) fn classify(raw: &str) -> Result<Self, ResolveError> {
        if let Some(id) = remote_id(raw) {
            return Ok(Selector::RemoteById(id));
        }
        let path = PathBuf::from(raw);
        let meta = fs::metadata(&path).map_err(|_| ResolveError::PathNotFound(path.clone()))?;
        if meta.is_dir() {
            Ok(Selector::LocalDirectory(path))
        } else {
            Ok(Selector::LocalArchive(path))
        }
    }

    /// 人类可读的来源描述（用于日志）
    pub(crate) fn describe(&self) -> String {
        match self {
            Selector::RemoteById(id) => format!("remote project {}", id),
            Selector::LocalArchive(p) => format!("archive {}", p.display()),
            Selector::LocalDirectory(p) => format!("directory {}", p.display()),
        }
    }
}

/// 从 URL 或数字前缀中提取项目 id
pub(crate) fn remote_id(raw: &str) -> Option<String> {
    SCRATCH_PROJECT_URL
        .captures(raw)
        .or_else(|| SCRATCH_PROJECT_ID.captures(raw))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
