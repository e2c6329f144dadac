use super::ast::{Command, GateOp};
use super::lexer::strip_outer_quotes;

/// 单条命令的最大参数个数
pub const MAX_ARGS: usize = 128;
/// 单行最多的命令条数
pub const MAX_COMMANDS: usize = 256;

/// 把 token 序列按 `;`、`&&`、`||` 切成带门控标记的命令序列。
///
/// `&` 不开启新命令：它回头给刚闭合的那条命令打上后台标记；
/// 行首的孤立 `&` 没有可标记的命令，按无操作忽略。
/// 超过参数或命令上限时整行报错，不做部分执行。
pub fn parse_commands(tokens: &[&str]) -> Result<Vec<Command>, String> {
    let mut commands: Vec<Command> = Vec::new();
    let mut argv: Vec<String> = Vec::new();
    let mut pending = GateOp::None;

    let close_current = |commands: &mut Vec<Command>,
                             argv: &mut Vec<String>,
                             pending: &mut GateOp|
     -> Result<(), String> {
        if argv.is_empty() {
            return Ok(());
        }
        if commands.len() >= MAX_COMMANDS {
            return Err(String::from("minsh: too many commands on one line"));
        }
        commands.push(Command {
            argv: std::mem::take(argv),
            background: false,
            gate: *pending,
        });
        // 闭合之后下一条命令默认按顺序执行，直到被 && / || 覆盖
        *pending = GateOp::Seq;
        Ok(())
    };

    for &token in tokens {
        match token {
            "&&" | "||" | ";" | "&" => {
                close_current(&mut commands, &mut argv, &mut pending)?;
                match token {
                    "&&" => pending = GateOp::And,
                    "||" => pending = GateOp::Or,
                    ";" => pending = GateOp::Seq,
                    _ => {
                        // `&` 标记上一条命令为后台，不推进门控状态
                        if let Some(last) = commands.last_mut() {
                            last.background = true;
                        }
                    }
                }
            }
            _ => {
                if argv.len() >= MAX_ARGS {
                    return Err(String::from("minsh: too many arguments for one command"));
                }
                argv.push(strip_outer_quotes(token).to_string());
            }
        }
    }

    close_current(&mut commands, &mut argv, &mut pending)?;
    Ok(commands)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Vec<Command> {
        use crate::shell::parser::{preprocess_line, tokenize};
        let pre = preprocess_line(line);
        let tokens = tokenize(&pre);
        parse_commands(&tokens).unwrap()
    }

    #[test]
    fn test_simple_command() {
        let cmds = parse("ls -l");
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].argv, vec!["ls", "-l"]);
        assert_eq!(cmds[0].gate, GateOp::None);
        assert!(!cmds[0].background);
    }

    #[test]
    fn test_operators_tag_following_command() {
        let cmds = parse("a && b || c ; d");
        assert_eq!(cmds.len(), 4);
        assert_eq!(cmds[0].gate, GateOp::None);
        assert_eq!(cmds[1].gate, GateOp::And);
        assert_eq!(cmds[2].gate, GateOp::Or);
        assert_eq!(cmds[3].gate, GateOp::Seq);
    }

    #[test]
    fn test_background_marks_previous_command() {
        let cmds = parse("sleep 10 & echo done");
        assert_eq!(cmds.len(), 2);
        assert!(cmds[0].background);
        assert!(!cmds[1].background);
        // `&` 之后的命令按顺序门控
        assert_eq!(cmds[1].gate, GateOp::Seq);
    }

    #[test]
    fn test_stray_ampersand_is_ignored() {
        assert!(parse("&").is_empty());
        let cmds = parse("& echo hi");
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].argv, vec!["echo", "hi"]);
        assert!(!cmds[0].background);
    }

    #[test]
    fn test_quotes_are_stripped_from_arguments() {
        let cmds = parse("echo \"hello world\" ''");
        assert_eq!(cmds[0].argv, vec!["echo", "hello world", ""]);
    }

    #[test]
    fn test_pipe_tokens_stay_in_argv() {
        // 管道在执行阶段才拆分
        let cmds = parse("ls | wc -l");
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].argv, vec!["ls", "|", "wc", "-l"]);
    }

    #[test]
    fn test_too_many_arguments_aborts_line() {
        let args: Vec<&str> = std::iter::repeat("x").take(MAX_ARGS + 1).collect();
        assert!(parse_commands(&args).is_err());
    }

    #[test]
    fn test_empty_commands_are_dropped() {
        assert!(parse("; ; ;").is_empty());
        let cmds = parse(";; echo a ;");
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].argv, vec!["echo", "a"]);
    }
}
