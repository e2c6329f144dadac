/// 单行最多接受的 token 数，超出的部分被丢弃而不是报错
pub const MAX_TOKENS: usize = 512;

/// 把预处理过的行按空格和制表符切成非空 token。
/// 引号此时仍保留在 token 上，作为参数使用前由 [`strip_outer_quotes`] 剥掉，
/// 这样 `""` 才能作为显式的空参数存活下来。
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split([' ', '\t'])
        .filter(|t| !t.is_empty())
        .take(MAX_TOKENS)
        .collect()
}

/// 剥掉一对匹配的外层引号（单引号或双引号）
pub fn strip_outer_quotes(token: &str) -> &str {
    let bytes = token.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &token[1..token.len() - 1];
        }
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_whitespace_runs() {
        assert_eq!(tokenize("ls  -l\t /tmp"), vec!["ls", "-l", "/tmp"]);
    }

    #[test]
    fn test_empty_and_blank_lines() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t  ").is_empty());
    }

    #[test]
    fn test_token_cap_truncates() {
        let line = "a ".repeat(MAX_TOKENS + 20);
        assert_eq!(tokenize(&line).len(), MAX_TOKENS);
    }

    #[test]
    fn test_strip_outer_quotes() {
        assert_eq!(strip_outer_quotes("\"hello world\""), "hello world");
        assert_eq!(strip_outer_quotes("'foo'"), "foo");
        assert_eq!(strip_outer_quotes("\"\""), "");
        // 不匹配的引号不剥
        assert_eq!(strip_outer_quotes("\"a'"), "\"a'");
        assert_eq!(strip_outer_quotes("'"), "'");
        assert_eq!(strip_outer_quotes("plain"), "plain");
    }
}
