use log::error;
use nix::sys::signal::{signal, SigHandler, Signal};

/// shell 本身忽略 SIGINT：Ctrl-C 只应打断前台子进程。
/// 子进程在 exec 之前把处置恢复为默认（见 executor）。
pub fn ignore_interactive_signals() {
    unsafe {
        if let Err(e) = signal(Signal::SIGINT, SigHandler::SigIgn) {
            error!("设置 SIGINT 处置失败: {}", e);
        }
    }
}

/// 子进程 exec 前调用：恢复默认的 SIGINT 处置，
/// 否则外部程序会继承 shell 的忽略设置。
pub fn restore_default_signals() {
    unsafe {
        let _ = signal(Signal::SIGINT, SigHandler::SigDfl);
    }
}
