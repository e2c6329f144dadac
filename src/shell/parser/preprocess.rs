/// 预处理后行的最大字节数，超出部分直接截断
pub const MAX_LINE: usize = 4096;

/// 规范化控制操作符的间距：在引号外出现的 `&&`、`||`、`;`、`&`、`|`
/// 两侧补上空格，使后续按空白分词不会把操作符和单词粘在一起。
///
/// 引号内（单引号或双引号，不嵌套、不处理转义）的内容原样拷贝；
/// 未闭合的引号按“引到行尾”处理。输出超过 [`MAX_LINE`] 时截断。
pub fn preprocess_line(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(MAX_LINE.min(input.len() * 2));
    let mut i = 0;

    while i < chars.len() {
        if out.len() + 1 >= MAX_LINE {
            break;
        }
        let c = chars[i];

        // 引号段整体拷贝，操作符在引号内不生效
        if c == '"' || c == '\'' {
            push_char(&mut out, c);
            i += 1;
            while i < chars.len() && chars[i] != c {
                if !push_char(&mut out, chars[i]) {
                    break;
                }
                i += 1;
            }
            if i < chars.len() && chars[i] == c {
                push_char(&mut out, c);
                i += 1;
            }
            continue;
        }

        // 双字符操作符优先于其单字符前缀
        if c == '&' {
            if chars.get(i + 1) == Some(&'&') {
                push_str(&mut out, " && ");
                i += 2;
            } else {
                push_str(&mut out, " & ");
                i += 1;
            }
            continue;
        }
        if c == '|' {
            if chars.get(i + 1) == Some(&'|') {
                push_str(&mut out, " || ");
                i += 2;
            } else {
                push_str(&mut out, " | ");
                i += 1;
            }
            continue;
        }
        if c == ';' {
            push_str(&mut out, " ; ");
            i += 1;
            continue;
        }

        push_char(&mut out, c);
        i += 1;
    }

    out
}

fn push_char(out: &mut String, c: char) -> bool {
    if out.len() + c.len_utf8() < MAX_LINE {
        out.push(c);
        true
    } else {
        false
    }
}

fn push_str(out: &mut String, s: &str) -> bool {
    if out.len() + s.len() < MAX_LINE {
        out.push_str(s);
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators_get_spaced() {
        assert_eq!(preprocess_line("a&&b"), "a && b");
        assert_eq!(preprocess_line("a||b"), "a || b");
        assert_eq!(preprocess_line("a;b"), "a ; b");
        assert_eq!(preprocess_line("a|b"), "a | b");
        assert_eq!(preprocess_line("a&"), "a & ");
    }

    #[test]
    fn test_two_char_operators_are_atomic() {
        // "&&" 不能被拆成两个 "&"
        assert_eq!(preprocess_line("a&&&b"), "a &&  & b");
        assert_eq!(preprocess_line("a|||b"), "a ||  | b");
    }

    #[test]
    fn test_quotes_protect_operators() {
        assert_eq!(preprocess_line("echo \"a&&b\""), "echo \"a&&b\"");
        assert_eq!(preprocess_line("echo 'x|y'"), "echo 'x|y'");
    }

    #[test]
    fn test_unterminated_quote_runs_to_end_of_line() {
        assert_eq!(preprocess_line("echo \"a && b"), "echo \"a && b");
    }

    #[test]
    fn test_output_is_truncated_at_capacity() {
        let long = "x".repeat(MAX_LINE * 2);
        let out = preprocess_line(&long);
        assert!(out.len() < MAX_LINE);
    }

    #[test]
    fn test_spaced_operators_gain_extra_padding_harmlessly() {
        // 多余的空格由分词阶段吸收
        assert_eq!(preprocess_line("ls -l | grep foo"), "ls -l  |  grep foo");
    }
}
