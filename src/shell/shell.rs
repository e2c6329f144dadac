use std::error::Error;
use std::io::{self, Write};

use log::{debug, error};

use crate::shell::executor::{Builtin, CommandOutcome, Executor};
use crate::shell::job_manager::JobTable;
use crate::shell::parser::{parse_commands, preprocess_line, tokenize};
use crate::shell::readline::{ReadlineError, ReadlineManager};
use crate::shell::signals;
use crate::utils::config::Config;
use crate::utils::term::is_interactive;

pub struct Shell<'a> {
    readline: ReadlineManager<'a>,
    executor: Executor,
}

impl<'a> Shell<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            readline: ReadlineManager::new(config, is_interactive()),
            executor: Executor::new(JobTable::new(), config),
        }
    }

    pub fn run(&mut self) -> Result<(), Box<dyn Error>> {
        debug!("初始化 minsh...");
        // Ctrl-C 不应终止 shell 本身
        signals::ignore_interactive_signals();
        self.readline.load_history();

        self.run_loop();

        // 退出前再收割一次后台任务
        self.executor.reap_background();
        self.readline.save_history();
        debug!("退出 minsh...");
        Ok(())
    }

    fn run_loop(&mut self) {
        loop {
            // 每个提示符周期开始时先收割后台进程
            self.executor.reap_background();

            let prompt = if is_interactive() { "$ " } else { "" };
            match self.readline.readline(prompt) {
                Ok(line) => {
                    if !self.handle_line(&line) {
                        break;
                    }
                }
                Err(ReadlineError::Eof) => {
                    if is_interactive() {
                        println!();
                    }
                    break;
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(e) => {
                    error!("读取输入失败: {}", e);
                    eprintln!("minsh: {}", e);
                    break;
                }
            }
        }
    }

    /// 解析并执行一行；返回 false 表示 exit 内建要求终止循环
    fn handle_line(&mut self, line: &str) -> bool {
        if line.trim().is_empty() {
            return true;
        }
        self.readline.add_history(line);

        let pre = preprocess_line(line);
        let tokens = tokenize(&pre);
        if tokens.is_empty() {
            return true;
        }
        let commands = match parse_commands(&tokens) {
            Ok(commands) => commands,
            Err(e) => {
                // 超限等解析错误丢弃整行，不做部分执行
                eprintln!("{}", e);
                return true;
            }
        };

        debug!("解析出 {} 条命令: {:?}", commands.len(), line);
        let mut last_status = 0;
        for command in &commands {
            if !command.gate.allows(last_status) {
                // 被门控跳过的命令不改变 last_status
                continue;
            }
            match self.executor.execute(command) {
                CommandOutcome::Exit => return false,
                CommandOutcome::Completed(outcome) => {
                    let is_builtin = command
                        .argv
                        .first()
                        .map(|name| Builtin::lookup(name).is_some())
                        .unwrap_or(false);
                    if is_interactive() && !command.background && !is_builtin {
                        println!("Real time: {:.3} ms", outcome.elapsed.as_secs_f64() * 1000.0);
                        let _ = io::stdout().flush();
                    }
                    last_status = outcome.status;
                }
            }
        }
        true
    }
}
