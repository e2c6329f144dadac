use dotenv::dotenv;
use rustyline::EditMode;
use std::env;
use std::fs;
use std::path::PathBuf;

/// 输出重定向默认拒绝写入的路径
pub const DEFAULT_DENY_WRITE: &[&str] = &["/sys/proc/foo/bar"];

pub struct Config {
    pub logger_level: String,
    pub logger_dir: PathBuf,
    pub history_file: PathBuf,
    pub editor_mode: String,
    pub deny_write_paths: Vec<String>,
}

impl Config {
    fn get_config_dir() -> PathBuf {
        if let Ok(home) = env::var("HOME") {
            PathBuf::from(home).join(".config/minsh")
        } else {
            env::temp_dir().join("minsh")
        }
    }

    fn default() -> Self {
        let config_dir = Self::get_config_dir();
        Config {
            logger_level: String::from("warn"),
            logger_dir: config_dir.join("logs"),
            history_file: config_dir.join("history"),
            editor_mode: String::from("vi"),
            deny_write_paths: DEFAULT_DENY_WRITE.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn new() -> Self {
        // 优先加载环境变量
        dotenv().ok();

        let mut config = Config::default();

        if let Ok(level) = env::var("MINSH_LOG") {
            config.logger_level = level;
        }

        if let Ok(dir) = env::var("MINSH_LOG_DIR") {
            config.logger_dir = PathBuf::from(dir);
        }

        if let Ok(history) = env::var("MINSH_HISTORY") {
            config.history_file = PathBuf::from(history);
        }

        if let Ok(editor) = env::var("MINSH_EDITOR") {
            config.editor_mode = editor;
        }

        // 额外的拒绝写入路径，冒号分隔
        if let Ok(extra) = env::var("MINSH_DENY_WRITE") {
            config
                .deny_write_paths
                .extend(extra.split(':').filter(|p| !p.is_empty()).map(String::from));
        }

        // 保证历史文件目录存在，失败时历史记录静默不可用
        if let Some(parent) = config.history_file.parent() {
            let _ = fs::create_dir_all(parent);
        }

        config
    }

    pub fn get_edit_mode(&self) -> EditMode {
        match self.editor_mode.to_lowercase().as_str() {
            "emacs" => EditMode::Emacs,
            _ => EditMode::Vi,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_deny_list_present() {
        let config = Config::default();
        assert!(config
            .deny_write_paths
            .iter()
            .any(|p| p == "/sys/proc/foo/bar"));
    }
}
