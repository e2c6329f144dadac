/// 一条流水线最多的阶段数
pub const MAX_STAGES: usize = 64;

/// 单个阶段的输入/输出重定向，各自至多一个
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct RedirectionSpec {
    pub input: Option<String>,
    pub output: Option<String>,
}

/// 流水线中的一个外部进程：干净的参数向量加重定向说明
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Stage {
    pub argv: Vec<String>,
    pub redirect: RedirectionSpec,
}

/// 把一条命令的参数向量按字面 `|` 拆成阶段，并解析每个阶段的重定向。
///
/// 空阶段（相邻的管道、行首/行尾的管道）是语法错误。
/// 输入重定向只允许出现在第一个阶段，输出重定向只允许在最后一个阶段，
/// 其它位置的描述符已经归管道所有。
pub fn build_stages(argv: &[String]) -> Result<Vec<Stage>, String> {
    let parts = split_stages(argv)?;
    let count = parts.len();

    let mut stages = Vec::with_capacity(count);
    for (i, part) in parts.into_iter().enumerate() {
        let (clean, redirect) = resolve_redirections(part)?;
        if redirect.input.is_some() && i > 0 {
            return Err(String::from("input redirection after a pipe"));
        }
        if redirect.output.is_some() && i + 1 < count {
            return Err(String::from("output redirection before a pipe"));
        }
        stages.push(Stage {
            argv: clean,
            redirect,
        });
    }
    Ok(stages)
}

fn split_stages(argv: &[String]) -> Result<Vec<&[String]>, String> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, token) in argv.iter().enumerate() {
        if token == "|" {
            if i == start {
                return Err(String::from("empty pipeline stage"));
            }
            parts.push(&argv[start..i]);
            start = i + 1;
        }
    }
    if start == argv.len() {
        // 行尾的 `|` 留下了一个空阶段；完全空的参数向量不会走到这里
        return Err(String::from("empty pipeline stage"));
    }
    parts.push(&argv[start..]);
    if parts.len() > MAX_STAGES {
        return Err(String::from("too many pipeline stages"));
    }
    Ok(parts)
}

fn is_redirect_token(token: &str) -> bool {
    token.starts_with('<') || token.starts_with('>')
}

/// 从一个阶段的 token 里摘出重定向，返回干净的参数向量。
/// 路径可以粘在操作符后面（`>file`）也可以是下一个 token（`> file`）。
fn resolve_redirections(tokens: &[String]) -> Result<(Vec<String>, RedirectionSpec), String> {
    let mut clean = Vec::with_capacity(tokens.len());
    let mut spec = RedirectionSpec::default();

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if !is_redirect_token(token) {
            clean.push(token.clone());
            i += 1;
            continue;
        }

        // `>>` 与 `<<` 不在支持的语法里
        if token.starts_with(">>") || token.starts_with("<<") {
            return Err(String::from("append/heredoc redirection not supported"));
        }

        let is_output = token.starts_with('>');
        let path = if token.len() > 1 {
            token[1..].to_string()
        } else {
            // 路径在下一个 token；缺失或又是重定向符都是语法错误
            let Some(next) = tokens.get(i + 1) else {
                return Err(String::from("redirection without a path"));
            };
            if is_redirect_token(next) {
                return Err(String::from("redirection followed by a redirection"));
            }
            i += 1;
            next.clone()
        };

        if is_output {
            if spec.output.is_some() {
                return Err(String::from("multiple output redirections"));
            }
            spec.output = Some(path);
        } else {
            if spec.input.is_some() {
                return Err(String::from("multiple input redirections"));
            }
            spec.input = Some(path);
        }
        i += 1;
    }

    if clean.is_empty() {
        return Err(String::from("redirection without a command"));
    }

    Ok((clean, spec))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn argv(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_single_stage_no_redirection() {
        let stages = build_stages(&argv(&["ls", "-l"])).unwrap();
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].argv, vec!["ls", "-l"]);
        assert_eq!(stages[0].redirect, RedirectionSpec::default());
    }

    #[test]
    fn test_pipeline_splits_into_stages() {
        let stages = build_stages(&argv(&["ls", "|", "grep", "x", "|", "wc"])).unwrap();
        assert_eq!(stages.len(), 3);
        assert_eq!(stages[0].argv, vec!["ls"]);
        assert_eq!(stages[1].argv, vec!["grep", "x"]);
        assert_eq!(stages[2].argv, vec!["wc"]);
    }

    #[test]
    fn test_adjacent_pipes_are_syntax_error() {
        assert!(build_stages(&argv(&["a", "|", "|", "b"])).is_err());
        assert!(build_stages(&argv(&["|", "b"])).is_err());
        assert!(build_stages(&argv(&["a", "|"])).is_err());
    }

    #[test]
    fn test_redirection_attached_and_detached_paths() {
        let stages = build_stages(&argv(&["sort", "<in.txt", ">", "out.txt"])).unwrap();
        assert_eq!(stages[0].argv, vec!["sort"]);
        assert_eq!(stages[0].redirect.input.as_deref(), Some("in.txt"));
        assert_eq!(stages[0].redirect.output.as_deref(), Some("out.txt"));
    }

    #[test]
    fn test_redirection_errors() {
        // 缺路径
        assert!(build_stages(&argv(&["cmd", ">"])).is_err());
        // 重定向符后面又是重定向符
        assert!(build_stages(&argv(&["cmd", ">", "<", "f"])).is_err());
        // 同方向出现两次
        assert!(build_stages(&argv(&["cmd", ">a", ">b"])).is_err());
        assert!(build_stages(&argv(&["cmd", "<a", "<b"])).is_err());
        // 追加与 heredoc 不支持
        assert!(build_stages(&argv(&["cmd", ">>", "f"])).is_err());
        assert!(build_stages(&argv(&["cmd", "<<", "f"])).is_err());
        // 只有重定向没有命令
        assert!(build_stages(&argv(&[">out"])).is_err());
    }

    #[test]
    fn test_redirection_position_inside_pipeline() {
        // 输入只能在第一段，输出只能在最后一段
        assert!(build_stages(&argv(&["a", "|", "b", "<f"])).is_err());
        assert!(build_stages(&argv(&["a", ">f", "|", "b"])).is_err());
        let ok = build_stages(&argv(&["a", "<in", "|", "b", ">out"])).unwrap();
        assert_eq!(ok[0].redirect.input.as_deref(), Some("in"));
        assert_eq!(ok[1].redirect.output.as_deref(), Some("out"));
    }

    #[test]
    fn test_stage_cap() {
        let mut tokens = Vec::new();
        for i in 0..(MAX_STAGES + 1) {
            if i > 0 {
                tokens.push("|");
            }
            tokens.push("x");
        }
        assert!(build_stages(&argv(&tokens)).is_err());
    }
}
