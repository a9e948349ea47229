// 提案コマンドの読み込み
//
// SQLファイルをセミコロン区切りでコマンド列に分割します。
// 引用符内とコメント内のセミコロンは区切りとして扱いません。

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scan {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// SQL文字列をコマンドに分割
///
/// 前後の空白は除去され、コメントだけのコマンドは含まれません。
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut scan = Scan::Code;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match scan {
            Scan::Code => match c {
                '\'' | '"' | '`' => scan = Scan::Quoted(c),
                '-' if chars.peek() == Some(&'-') => scan = Scan::LineComment,
                '/' if chars.peek() == Some(&'*') => scan = Scan::BlockComment,
                ';' => {
                    push_statement(&mut statements, &current);
                    current.clear();
                    continue;
                }
                _ => {}
            },
            // 二重の引用符はエスケープとして同じ状態に戻る
            Scan::Quoted(quote) if c == quote => scan = Scan::Code,
            Scan::Quoted(_) => {}
            Scan::LineComment if c == '\n' => scan = Scan::Code,
            Scan::LineComment => {}
            Scan::BlockComment if c == '*' && chars.peek() == Some(&'/') => {
                current.push(c);
                if let Some(slash) = chars.next() {
                    current.push(slash);
                }
                scan = Scan::Code;
                continue;
            }
            Scan::BlockComment => {}
        }
        current.push(c);
    }
    push_statement(&mut statements, &current);

    statements
}

fn push_statement(statements: &mut Vec<String>, candidate: &str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() && !strip_comments(trimmed).trim().is_empty() {
        statements.push(trimmed.to_string());
    }
}

fn strip_comments(statement: &str) -> String {
    let mut out = String::new();
    let mut rest = statement;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.split_once('\n').map(|(_, r)| r).unwrap_or("");
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map(|(_, r)| r).unwrap_or("");
        } else {
            let next = rest
                .char_indices()
                .skip(1)
                .find(|(i, _)| rest[*i..].starts_with("--") || rest[*i..].starts_with("/*"))
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            out.push_str(&rest[..next]);
            rest = &rest[next..];
        }
    }
    out
}

/// SQLファイルからコマンド列を読み込む
pub fn load_commands(path: &Path) -> Result<Vec<String>> {
    let sql = fs::read_to_string(path)
        .with_context(|| format!("Failed to read command file: {:?}", path))?;
    Ok(split_statements(&sql))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_statements() {
        let statements = split_statements("CREATE TABLE a (id INT); CREATE TABLE b (id INT);");
        assert_eq!(statements, vec!["CREATE TABLE a (id INT)", "CREATE TABLE b (id INT)"]);
    }

    #[test]
    fn test_semicolon_in_literal() {
        let statements = split_statements("INSERT INTO t VALUES ('a;b'); SELECT 1");
        assert_eq!(statements, vec!["INSERT INTO t VALUES ('a;b')", "SELECT 1"]);
    }

    #[test]
    fn test_escaped_quote() {
        let statements = split_statements("INSERT INTO t VALUES ('it''s;'); SELECT 1;");
        assert_eq!(statements[0], "INSERT INTO t VALUES ('it''s;')");
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_comments_are_not_separators() {
        let statements = split_statements("SELECT 1 -- a; b\nFROM t; SELECT /* ; */ 2;");
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[1], "SELECT /* ; */ 2");
    }

    #[test]
    fn test_comment_only_statements_dropped() {
        let statements = split_statements("-- header\n; /* note */; SELECT 1;");
        assert_eq!(statements, vec!["SELECT 1"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(split_statements("  \n ").is_empty());
    }
}
