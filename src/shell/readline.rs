use std::io::{self, BufRead};

use log::{debug, error, warn};
pub use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::{CompletionType, Config as RLConfig, Editor};

use crate::utils::config::Config;

/// 交互式运行时走 rustyline（行编辑 + 历史记录），
/// 输入被重定向时退化成普通的按行读取。
pub struct ReadlineManager<'a> {
    config: &'a Config,
    editor: Option<Editor<(), FileHistory>>,
}

impl<'a> ReadlineManager<'a> {
    pub fn new(config: &'a Config, interactive: bool) -> Self {
        let editor: Option<Editor<(), FileHistory>> = if interactive {
            let rl_config = RLConfig::builder()
                .history_ignore_space(true)
                .completion_type(CompletionType::List)
                .edit_mode(config.get_edit_mode())
                .build();
            match Editor::with_config(rl_config) {
                Ok(editor) => Some(editor),
                Err(e) => {
                    error!("无法初始化 readline，退回标准输入: {}", e);
                    None
                }
            }
        } else {
            None
        };
        Self { config, editor }
    }

    pub fn load_history(&mut self) {
        if let Some(editor) = &mut self.editor {
            if let Err(e) = editor.load_history(&self.config.history_file) {
                warn!(
                    "无法加载历史记录: {} {}",
                    self.config.history_file.display(),
                    e
                );
            } else {
                debug!("历史记录加载成功");
            }
        }
    }

    /// 读取一行，不带行尾换行；输入耗尽时返回 `ReadlineError::Eof`
    pub fn readline(&mut self, prompt: &str) -> Result<String, ReadlineError> {
        match &mut self.editor {
            Some(editor) => editor.readline(prompt),
            None => {
                let mut buf = String::new();
                let n = io::stdin().lock().read_line(&mut buf)?;
                if n == 0 {
                    return Err(ReadlineError::Eof);
                }
                while buf.ends_with('\n') || buf.ends_with('\r') {
                    buf.pop();
                }
                Ok(buf)
            }
        }
    }

    pub fn add_history(&mut self, line: &str) {
        if let Some(editor) = &mut self.editor {
            let _ = editor.add_history_entry(line);
        }
    }

    pub fn save_history(&mut self) {
        if let Some(editor) = &mut self.editor {
            if let Err(e) = editor.save_history(&self.config.history_file) {
                error!("保存历史记录失败: {}", e);
            } else {
                debug!("历史记录保存成功");
            }
        }
    }
}
