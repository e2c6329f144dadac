use crate::utils::config::Config;
use chrono::Local;
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::fs::{self, File};
use std::io::Write;
use std::process;

/// 初始化日志。日志只写文件，不污染 shell 自身的 stdout/stderr 输出协议。
pub fn init_logger(config: &Config) {
    let level = match &config.logger_level {
        level if level.eq_ignore_ascii_case("error") => LevelFilter::Error,
        level if level.eq_ignore_ascii_case("warn") => LevelFilter::Warn,
        level if level.eq_ignore_ascii_case("info") => LevelFilter::Info,
        level if level.eq_ignore_ascii_case("debug") => LevelFilter::Debug,
        level if level.eq_ignore_ascii_case("trace") => LevelFilter::Trace,
        _ => LevelFilter::Warn,
    };

    let mut builder = Builder::new();
    builder.format(|buf, record| {
        writeln!(
            buf,
            "[PID:{}][{}] {} - {}",
            process::id(),
            record.level(),
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.args()
        )
    });
    builder.filter(None, level);

    // 创建日志目录失败时退回 stderr
    match open_log_file(config) {
        Some(file) => {
            builder.target(Target::Pipe(Box::new(file)));
        }
        None => {
            builder.target(Target::Stderr);
        }
    }

    // 测试等场景下可能重复初始化，忽略
    let _ = builder.try_init();
}

fn open_log_file(config: &Config) -> Option<File> {
    fs::create_dir_all(&config.logger_dir).ok()?;
    let date = Local::now().format("%Y-%m-%d");
    let log_file = config.logger_dir.join(format!("minsh_{}.log", date));
    File::create(log_file).ok()
}
