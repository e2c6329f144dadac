use once_cell::sync::Lazy;

// shell 自身的标准输入输出在启动后不会再变，只需探测一次
static INTERACTIVE: Lazy<bool> = Lazy::new(|| unsafe {
    libc::isatty(libc::STDIN_FILENO) == 1 && libc::isatty(libc::STDOUT_FILENO) == 1
});

/// 标准输入和标准输出都连接到终端时才算交互式。
/// 非交互式运行（重定向、管道）时不输出提示符和各类报告。
pub fn is_interactive() -> bool {
    *INTERACTIVE
}
