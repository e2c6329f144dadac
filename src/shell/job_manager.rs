use std::io::{self, Write};
use std::time::Instant;

use log::{error, warn};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

/// 后台任务表容量。表满时任务照常启动，只是不再跟踪耗时。
pub const MAX_BG: usize = 256;

#[derive(Debug, Clone, Copy)]
pub struct BackgroundJob {
    pub pid: Pid,
    pub started: Instant,
}

/// 有界的后台任务表：pid → 启动时刻。
/// shell 是单线程的，所有修改都发生在提示符周期之间，无需加锁。
pub struct JobTable {
    jobs: Vec<BackgroundJob>,
}

impl JobTable {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// 登记一个后台进程。表满时降级：进程不被跟踪，但仍会被收割。
    pub fn record(&mut self, pid: Pid, started: Instant) -> bool {
        if self.jobs.len() >= MAX_BG {
            warn!("后台任务表已满，PID {} 不再跟踪耗时", pid);
            eprintln!(
                "minsh: background job table full; timing for PID {} will not be reported",
                pid
            );
            return false;
        }
        self.jobs.push(BackgroundJob { pid, started });
        true
    }

    fn remove(&mut self, pid: Pid) -> Option<BackgroundJob> {
        let pos = self.jobs.iter().position(|job| job.pid == pid)?;
        Some(self.jobs.remove(pos))
    }

    /// 非阻塞收割所有已结束的子进程，直到没有就绪的为止。
    /// 每个提示符周期之前和 shell 退出时各调用一次。
    /// 完成报告只在交互式运行时输出。
    pub fn reap_all(&mut self, interactive: bool) {
        loop {
            match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => break,
                Ok(status) => {
                    let Some(pid) = status.pid() else {
                        break;
                    };
                    let tracked = self.remove(pid);
                    if interactive {
                        report_completion(pid, status, tracked);
                    }
                }
                Err(Errno::ECHILD) => break,
                Err(Errno::EINTR) => continue,
                Err(e) => {
                    error!("收割后台进程失败: {}", e);
                    break;
                }
            }
        }
    }
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

/// 表里找得到的进程附带耗时；表满时未跟踪的进程只报 pid 和结果。
fn report_completion(pid: Pid, status: WaitStatus, tracked: Option<BackgroundJob>) {
    let elapsed_ms = tracked.map(|job| job.started.elapsed().as_secs_f64() * 1000.0);
    match status {
        WaitStatus::Exited(_, code) => match elapsed_ms {
            Some(ms) => println!(
                "[BG] PID {} exited with code={}, Real time: {:.3} ms",
                pid, code, ms
            ),
            None => println!("[BG] PID {} exited with code={}", pid, code),
        },
        WaitStatus::Signaled(_, signal, _) => match elapsed_ms {
            Some(ms) => println!(
                "[BG] PID {} killed by signal {}, Real time: {:.3} ms",
                pid, signal as i32, ms
            ),
            None => println!("[BG] PID {} killed by signal {}", pid, signal as i32),
        },
        _ => {}
    }
    let _ = io::stdout().flush();
}
