//! 终端输出：带标签的进度行（`[fetch]`、`[unzip]` ...）
//! 颜色由 `colored` 处理，设置 NO_COLOR 时自动关闭。

use colored::{ColoredString, Colorize};

pub(crate) fn banner(s: &str) -> ColoredString {
    s.yellow()
}

pub(crate) fn step(s: &str) -> ColoredString {
    s.cyan()
}

pub(crate) fn success(s: &str) -> ColoredString {
    s.green()
}

pub(crate) fn error(s: &str) -> ColoredString {
    s.red()
}

/// 打印一行进度：`[tag] message`
pub(crate) fn progress(tag: &str, message: impl AsRef<str>) {
    println!("{}", step(&format!("[{}] {}", tag, message.as_ref())));
}

/// 打印一行错误到 stderr：`[tag] message`
pub(crate) fn failure(tag: &str, message: impl AsRef<str>) {
    eprintln!("{}", error(&format!("[{}] {}", tag, message.as_ref())));
}
