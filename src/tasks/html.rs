// src/tasks/html.rs

use minify_html::{minify, Cfg};

fn html_cfg() -> Cfg {
    let mut cfg = Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.do_not_minify_doctype = true;
    cfg.minify_css = true;
    cfg
}

/// Collapse whitespace and drop comments, keeping closing tags and the
/// doctype untouched.
pub fn minify_html(source: &[u8]) -> Vec<u8> {
    minify(source, &html_cfg())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_and_keeps_structure() {
        let src = b"<!DOCTYPE html>\n<html>\n  <head>\n    <title> Hi </title>\n  </head>\n  <body>\n    <!-- note -->\n    <p>one\n      two</p>\n  </body>\n</html>\n";
        let out = String::from_utf8(minify_html(src)).unwrap();

        assert!(out.starts_with("<!DOCTYPE html>"), "{out}");
        assert!(out.contains("<p>one two</p>"), "{out}");
        assert!(out.contains("</body>"), "{out}");
        assert!(!out.contains("note"));
        assert!(out.len() < src.len());
    }
}
