use std::env;
use std::ffi::CString;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::os::unix::io::IntoRawFd;
use std::time::{Duration, Instant};

use log::{debug, error};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};

use super::pipeline::{build_stages, RedirectionSpec, Stage};
use crate::shell::job_manager::JobTable;
use crate::shell::parser::Command;
use crate::shell::signals;
use crate::utils::config::Config;
use crate::utils::term::is_interactive;

/// 一条前台命令的执行结果，退出状态驱动下一条命令的门控
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// 0–255 的退出码，被信号终止时为 128+信号编号
    pub status: i32,
    pub elapsed: Duration,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    Completed(ExecutionOutcome),
    /// exit 内建：要求终止 shell 循环，不是普通的退出状态
    Exit,
}

/// 必须在 shell 自身进程里执行的命令的封闭集合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Exit,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Builtin> {
        match name {
            "cd" => Some(Builtin::Cd),
            "exit" => Some(Builtin::Exit),
            _ => None,
        }
    }
}

/// 阶段的接线计划：fork 之前算好每个阶段复制哪些描述符，
/// 子进程里只做机械套用，避免散落的 dup2/close 逻辑
#[derive(Debug, Clone, Copy)]
struct StageWiring {
    stdin_fd: Option<RawFd>,
    stdout_fd: Option<RawFd>,
}

pub struct Executor {
    jobs: JobTable,
    deny_write_paths: Vec<String>,
}

impl Executor {
    pub fn new(jobs: JobTable, config: &Config) -> Self {
        Self {
            jobs,
            deny_write_paths: config.deny_write_paths.clone(),
        }
    }

    /// 当前被跟踪的后台任务数
    pub fn tracked_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// 收割所有已结束的后台进程
    pub fn reap_background(&mut self) {
        self.jobs.reap_all(is_interactive());
    }

    /// 执行一条已经过门控判定的命令
    pub fn execute(&mut self, command: &Command) -> CommandOutcome {
        let Some(name) = command.argv.first() else {
            return CommandOutcome::Completed(ExecutionOutcome {
                status: 0,
                elapsed: Duration::ZERO,
            });
        };

        // 内建命令只在无管道时按内建执行；管道里的 cd/exit 是普通单词
        let has_pipe = command.argv.iter().any(|token| token == "|");
        if !has_pipe {
            if let Some(builtin) = Builtin::lookup(name) {
                debug!("执行内建命令: {:?}", command.argv);
                match builtin {
                    Builtin::Exit => return CommandOutcome::Exit,
                    Builtin::Cd => {
                        let start = Instant::now();
                        let status = builtin_cd(&command.argv);
                        return CommandOutcome::Completed(ExecutionOutcome {
                            status,
                            elapsed: start.elapsed(),
                        });
                    }
                }
            }
        }

        let stages = match build_stages(&command.argv) {
            Ok(stages) => stages,
            Err(e) => {
                debug!("语法错误: {}", e);
                println!("Syntax error");
                let _ = io::stdout().flush();
                return CommandOutcome::Completed(ExecutionOutcome {
                    status: 2,
                    elapsed: Duration::ZERO,
                });
            }
        };

        debug!("执行外部命令，{} 个阶段: {:?}", stages.len(), command.argv);
        self.run_pipeline(&stages, command.background)
    }

    /// 每个阶段 fork 一个子进程，按接线计划接好管道后 exec。
    /// 前台等待所有阶段，状态取最后一个阶段；后台登记最后阶段的 pid 立即返回。
    fn run_pipeline(&mut self, stages: &[Stage], background: bool) -> CommandOutcome {
        let start = Instant::now();

        let pipes = match create_pipes(stages.len()) {
            Ok(pipes) => pipes,
            Err(e) => {
                error!("创建管道失败: {}", e);
                eprintln!("minsh: pipe: {}", e);
                return CommandOutcome::Completed(ExecutionOutcome {
                    status: 1,
                    elapsed: start.elapsed(),
                });
            }
        };
        let plan = wiring_plan(stages.len(), &pipes);

        let mut pids = Vec::with_capacity(stages.len());
        for (i, stage) in stages.iter().enumerate() {
            match unsafe { unistd::fork() } {
                Ok(ForkResult::Parent { child }) => pids.push(child),
                Ok(ForkResult::Child) => self.exec_stage(stage, plan[i], &pipes),
                Err(e) => {
                    error!("fork 失败: {}", e);
                    eprintln!("minsh: fork: {}", e);
                    // 已经跑起来的阶段留给 reaper 收割
                    drop(pipes);
                    return CommandOutcome::Completed(ExecutionOutcome {
                        status: 1,
                        elapsed: start.elapsed(),
                    });
                }
            }
        }

        // 父进程关掉全部管道端，读端才能在写端退出后看到 EOF
        drop(pipes);

        let Some(&last) = pids.last() else {
            return CommandOutcome::Completed(ExecutionOutcome {
                status: 1,
                elapsed: start.elapsed(),
            });
        };

        if background {
            self.jobs.record(last, start);
            if is_interactive() {
                if pids.len() > 1 {
                    println!("[BG] pipeline started, last PID {}", last);
                } else {
                    println!("[BG] started PID {}", last);
                }
                let _ = io::stdout().flush();
            }
            // 真实结果之后由 reaper 异步报告
            return CommandOutcome::Completed(ExecutionOutcome {
                status: 0,
                elapsed: Duration::ZERO,
            });
        }

        let mut status = 1;
        for &pid in &pids {
            let code = wait_for(pid);
            if pid == last {
                status = code;
            }
        }
        CommandOutcome::Completed(ExecutionOutcome {
            status,
            elapsed: start.elapsed(),
        })
    }

    /// 子进程侧：套用接线计划、关掉所有管道端、做文件重定向，然后 exec。
    /// 任何失败都以 `_exit` 结束，绝不返回到父进程的逻辑里。
    fn exec_stage(&self, stage: &Stage, wiring: StageWiring, pipes: &[(OwnedFd, OwnedFd)]) -> ! {
        if apply_wiring(wiring, pipes).is_err() {
            unsafe { libc::_exit(1) }
        }
        if self.apply_redirections(&stage.redirect).is_err() {
            print_child_message("I/O error\n");
            unsafe { libc::_exit(1) }
        }
        signals::restore_default_signals();
        exec_argv(&stage.argv)
    }

    /// 打开重定向文件并复制到标准输入/输出。只在子进程里调用。
    fn apply_redirections(&self, redirect: &RedirectionSpec) -> io::Result<()> {
        if let Some(path) = &redirect.input {
            let file = OpenOptions::new().read(true).open(path)?;
            let fd = file.into_raw_fd();
            unistd::dup2(fd, libc::STDIN_FILENO).map_err(io::Error::from)?;
            let _ = unistd::close(fd);
        }
        if let Some(path) = &redirect.output {
            if self.deny_write_paths.iter().any(|denied| denied == path) {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "write target denied",
                ));
            }
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?;
            let fd = file.into_raw_fd();
            unistd::dup2(fd, libc::STDOUT_FILENO).map_err(io::Error::from)?;
            let _ = unistd::close(fd);
        }
        Ok(())
    }
}

/// cd 在 shell 自身进程里执行；失败只报告，不影响命令级状态
fn builtin_cd(argv: &[String]) -> i32 {
    let target = match argv.get(1) {
        Some(path) => path.clone(),
        None => env::var("HOME").unwrap_or_else(|_| String::from("/")),
    };
    let target = shellexpand::tilde(&target);
    if let Err(e) = env::set_current_dir(target.as_ref()) {
        eprintln!("cd: {}: {}", target, e);
    }
    0
}

fn create_pipes(stage_count: usize) -> nix::Result<Vec<(OwnedFd, OwnedFd)>> {
    let mut pipes = Vec::with_capacity(stage_count.saturating_sub(1));
    for _ in 1..stage_count {
        pipes.push(unistd::pipe()?);
    }
    Ok(pipes)
}

/// 阶段 i 的 stdin 来自管道 i-1 的读端，stdout 去管道 i 的写端；
/// 首尾阶段保持继承（或被文件重定向覆盖）
fn wiring_plan(stage_count: usize, pipes: &[(OwnedFd, OwnedFd)]) -> Vec<StageWiring> {
    (0..stage_count)
        .map(|i| StageWiring {
            stdin_fd: (i > 0).then(|| pipes[i - 1].0.as_raw_fd()),
            stdout_fd: (i + 1 < stage_count).then(|| pipes[i].1.as_raw_fd()),
        })
        .collect()
}

/// 子进程里按计划 dup2，然后关闭所有管道描述符
fn apply_wiring(wiring: StageWiring, pipes: &[(OwnedFd, OwnedFd)]) -> nix::Result<()> {
    if let Some(fd) = wiring.stdin_fd {
        unistd::dup2(fd, libc::STDIN_FILENO)?;
    }
    if let Some(fd) = wiring.stdout_fd {
        unistd::dup2(fd, libc::STDOUT_FILENO)?;
    }
    for (read_end, write_end) in pipes {
        let _ = unistd::close(read_end.as_raw_fd());
        let _ = unistd::close(write_end.as_raw_fd());
    }
    Ok(())
}

/// execvp；只有失败才会走到末尾，按约定报告并以 127 退出
fn exec_argv(argv: &[String]) -> ! {
    let cargs: Result<Vec<CString>, _> = argv
        .iter()
        .map(|arg| CString::new(arg.as_bytes()))
        .collect();
    if let Ok(cargs) = cargs {
        if let Some(program) = cargs.first() {
            let _ = unistd::execvp(program, &cargs);
        }
    }
    print_child_message("Command not found\n");
    unsafe { libc::_exit(127) }
}

/// 等待单个阶段结束，折算成门控用的退出状态
fn wait_for(pid: Pid) -> i32 {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => return code,
            Ok(WaitStatus::Signaled(_, signal, _)) => return 128 + signal as i32,
            Ok(_) => continue,
            Err(Errno::EINTR) => continue,
            Err(e) => {
                error!("waitpid 失败: {}", e);
                return 1;
            }
        }
    }
}

/// 子进程里的诊断按约定走标准输出
fn print_child_message(message: &str) {
    let mut stdout = io::stdout();
    let _ = stdout.write_all(message.as_bytes());
    let _ = stdout.flush();
}
