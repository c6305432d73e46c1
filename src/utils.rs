//! 通用辅助函数：
//! - 环境变量读取与解析
//! - 资源 id 的安全校验、选择器的显示名称

use std::{env, path::{Path, PathBuf}};

/// 可选读取 PATH 环境变量为 PathBuf。
pub(crate) fn env_opt_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from).filter(|p| !p.as_os_str().is_empty())
}

/// 可选读取 String 环境变量。
pub(crate) fn env_opt_string(key: &str) -> Option<String> {
    env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// 可选读取 u16 环境变量（端口）。
pub(crate) fn env_opt_u16(key: &str) -> Option<u16> {
    env::var(key).ok().and_then(|s| s.trim().parse::<u16>().ok())
}

/// 可选读取 u64 环境变量。
pub(crate) fn env_opt_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|s| s.trim().parse::<u64>().ok())
}

/// 资源 id 只能是单个文件名片段：不含路径分隔符，不是 `.` / `..`。
pub(crate) fn is_safe_asset_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains('/')
        && !id.contains('\\')
        && !id.contains('\0')
}

/// 选择器路径的基本名（文件名或目录名），取不到时回退为原始文本。
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// 去掉 URL 末尾的 `/`，便于拼接。
pub(crate) fn trim_base(url: &str) -> &str {
    url.trim_end_matches('/')
}
