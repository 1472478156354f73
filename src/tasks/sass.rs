// src/tasks/sass.rs

//! Conversion of the indented Sass syntax into SCSS.
//!
//! `grass` only parses SCSS, so `.sass` sources are rewritten before
//! compilation: indentation becomes braces, statements get semicolons,
//! `=`/`+` shorthands become `@mixin`/`@include`, and unquoted import
//! targets are quoted. Silent (`//`) comments are dropped, loud (`/* */`)
//! comments are kept.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct SassSyntaxError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug)]
enum LineKind {
    Code(String),
    Comment(String),
}

#[derive(Debug)]
struct LogicalLine {
    number: usize,
    indent: usize,
    kind: LineKind,
}

struct Block {
    indent: usize,
    child_indent: Option<usize>,
}

/// Convert indented-syntax source into equivalent SCSS.
pub fn indented_to_scss(source: &str) -> Result<String, SassSyntaxError> {
    let lines = logical_lines(source);
    let mut out = String::with_capacity(source.len() + source.len() / 4);
    let mut stack: Vec<Block> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let expected = match stack.last_mut() {
            None => 0,
            Some(block) => *block.child_indent.get_or_insert(line.indent),
        };
        if line.indent != expected {
            return Err(SassSyntaxError {
                line: line.number,
                message: format!(
                    "inconsistent indentation (expected {expected} characters, found {})",
                    line.indent
                ),
            });
        }

        let next_indent = lines.get(i + 1).map(|l| l.indent).unwrap_or(0);
        push_indent(&mut out, stack.len());

        match &line.kind {
            LineKind::Comment(body) => {
                out.push_str("/*");
                out.push_str(body);
                out.push_str("*/\n");
            }
            LineKind::Code(text) => {
                let code = convert_statement(text);
                if next_indent > line.indent {
                    out.push_str(&code);
                    out.push_str(" {\n");
                    stack.push(Block {
                        indent: line.indent,
                        child_indent: None,
                    });
                } else {
                    out.push_str(&code);
                    out.push_str(";\n");
                }
            }
        }

        while stack.last().is_some_and(|b| b.indent >= next_indent) {
            stack.pop();
            push_indent(&mut out, stack.len());
            out.push_str("}\n");
        }
    }

    Ok(out)
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ' || *c == '\t').count()
}

/// Split the source into statements, folding comment bodies and
/// comma-continued selectors into a single entry.
fn logical_lines(source: &str) -> Vec<LogicalLine> {
    let physical: Vec<&str> = source.lines().collect();
    let mut lines = Vec::new();
    let mut i = 0;

    while i < physical.len() {
        let raw = physical[i];
        let number = i + 1;
        i += 1;

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let indent = indent_of(raw);

        if trimmed.starts_with("//") || trimmed.starts_with("/*") {
            let mut body = vec![trimmed.to_string()];
            while i < physical.len()
                && (physical[i].trim().is_empty() || indent_of(physical[i]) > indent)
            {
                if !physical[i].trim().is_empty() {
                    body.push(physical[i].trim().to_string());
                }
                i += 1;
            }
            if trimmed.starts_with("/*") {
                let joined = body.join("\n");
                let inner = joined
                    .trim_start_matches("/*")
                    .trim_end_matches("*/")
                    .to_string();
                lines.push(LogicalLine {
                    number,
                    indent,
                    kind: LineKind::Comment(inner),
                });
            }
            continue;
        }

        let mut text = strip_silent_comment(trimmed).trim_end().to_string();
        while text.ends_with(',') && i < physical.len() {
            let next = physical[i].trim();
            i += 1;
            if next.is_empty() {
                continue;
            }
            text.push(' ');
            text.push_str(strip_silent_comment(next).trim_end());
        }

        if !text.is_empty() {
            lines.push(LogicalLine {
                number,
                indent,
                kind: LineKind::Code(text),
            });
        }
    }

    lines
}

/// Cut a trailing `// ...` comment that is outside strings and parentheses.
fn strip_silent_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut quote: Option<u8> = None;
    let mut depth = 0usize;

    for (i, &b) in bytes.iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                b'/' if depth == 0 && bytes.get(i + 1) == Some(&b'/') => {
                    if i == 0 || bytes[i - 1].is_ascii_whitespace() {
                        return &line[..i];
                    }
                }
                _ => {}
            },
        }
    }
    line
}

fn convert_statement(text: &str) -> String {
    let text = text.trim_end_matches(';').trim_end();

    if let Some(rest) = text.strip_prefix('=') {
        return format!("@mixin {}", rest.trim_start());
    }
    if let Some(rest) = text.strip_prefix('+') {
        if rest.starts_with(|c: char| c.is_alphabetic() || c == '_' || c == '-') {
            return format!("@include {rest}");
        }
    }
    if let Some(rest) = text.strip_prefix("@import ") {
        let targets: Vec<String> = rest.split(',').map(import_target).collect();
        return format!("@import {}", targets.join(", "));
    }
    for directive in ["@use ", "@forward "] {
        if let Some(rest) = text.strip_prefix(directive) {
            let rest = rest.trim_start();
            let (target, tail) = rest.split_at(rest.find(char::is_whitespace).unwrap_or(rest.len()));
            return format!("{directive}{}{tail}", import_target(target));
        }
    }
    text.to_string()
}

/// Quote an import target and point `.sass` files at their SCSS twin.
fn import_target(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with("url(") {
        return raw.to_string();
    }

    let (quote, inner) = match raw.chars().next() {
        Some(q @ ('"' | '\'')) if raw.len() >= 2 && raw.ends_with(q) => (q, &raw[1..raw.len() - 1]),
        _ => ('"', raw),
    };

    let inner = inner.strip_suffix(".sass").unwrap_or(inner);
    format!("{quote}{inner}{quote}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squash(s: &str) -> String {
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn nesting_becomes_braces() {
        let src = "nav\n  ul\n    margin: 0\n    padding: 0\n  li\n    display: inline-block\n\na\n  color: red\n";
        let scss = indented_to_scss(src).unwrap();
        assert_eq!(
            squash(&scss),
            "nav { ul { margin: 0; padding: 0; } li { display: inline-block; } } a { color: red; }"
        );
    }

    #[test]
    fn mixin_shorthands_and_variables() {
        let src = "$gap: 4px\n=pad($n)\n  padding: $n\n.box\n  +pad($gap)\n  &:hover\n    color: blue\n";
        let scss = indented_to_scss(src).unwrap();
        assert_eq!(
            squash(&scss),
            "$gap: 4px; @mixin pad($n) { padding: $n; } .box { @include pad($gap); &:hover { color: blue; } }"
        );
    }

    #[test]
    fn imports_are_quoted_and_sass_extension_dropped() {
        let scss = indented_to_scss("@import variables, mixins.sass\n@use sass:math\n").unwrap();
        assert_eq!(
            squash(&scss),
            "@import \"variables\", \"mixins\"; @use \"sass:math\";"
        );
    }

    #[test]
    fn silent_comments_dropped_loud_comments_kept() {
        let src = "// header\n  more header\n/* keep me */\nbody\n  margin: 0 // trailing\n  background: url(http://x.test/a.png)\n";
        let scss = indented_to_scss(src).unwrap();
        assert!(!scss.contains("header"));
        assert!(!scss.contains("trailing"));
        assert!(scss.contains("/* keep me */"));
        assert!(scss.contains("url(http://x.test/a.png)"));
    }

    #[test]
    fn comma_continued_selectors_join() {
        let scss = indented_to_scss("h1,\nh2\n  margin: 0\n").unwrap();
        assert_eq!(squash(&scss), "h1, h2 { margin: 0; }");
    }

    #[test]
    fn inconsistent_indentation_is_an_error() {
        let err = indented_to_scss("a\n    color: red\n  margin: 0\n").unwrap_err();
        assert_eq!(err.line, 3);
    }
}
