// src/tasks/svg.rs

//! SVG optimization over a `quick-xml` event stream.

use std::borrow::Cow;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};

use crate::tasks::error::TransformError;

const EDITOR_PREFIXES: &[&[u8]] = &[b"sodipodi:", b"inkscape:", b"sketch:"];
const EDITOR_NAMESPACES: &[&[u8]] = &[b"xmlns:sodipodi", b"xmlns:inkscape", b"xmlns:sketch"];

fn svg_error(e: impl std::fmt::Display) -> TransformError {
    TransformError::Svg(e.to_string())
}

fn is_editor_name(name: &[u8]) -> bool {
    EDITOR_PREFIXES.iter().any(|p| name.starts_with(p))
}

fn is_dropped_element(name: &[u8]) -> bool {
    name == b"metadata" || is_editor_name(name)
}

fn is_dropped_attribute(key: &[u8]) -> bool {
    is_editor_name(key) || EDITOR_NAMESPACES.contains(&key)
}

/// Strip editor cruft and minify path data.
///
/// Drops the XML declaration, doctype, processing instructions, comments,
/// `<metadata>`, editor-namespaced elements and attributes, and
/// whitespace-only text.
pub fn optimize(source: &str) -> Result<String, TransformError> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(true);
    let mut writer = Writer::new(Vec::with_capacity(source.len()));

    let mut skip_depth = 0usize;
    let mut saw_root = false;

    loop {
        let event = reader.read_event().map_err(svg_error)?;

        if skip_depth > 0 {
            match event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                Event::Eof => return Err(svg_error("unexpected end of document")),
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(e) => {
                if is_dropped_element(e.name().as_ref()) {
                    skip_depth = 1;
                    continue;
                }
                saw_root = true;
                writer
                    .write_event(Event::Start(rewrite_start(&e)?))
                    .map_err(svg_error)?;
            }
            Event::Empty(e) => {
                if is_dropped_element(e.name().as_ref()) {
                    continue;
                }
                saw_root = true;
                writer
                    .write_event(Event::Empty(rewrite_start(&e)?))
                    .map_err(svg_error)?;
            }
            Event::End(e) => writer.write_event(Event::End(e)).map_err(svg_error)?,
            Event::Text(t) => writer.write_event(Event::Text(t)).map_err(svg_error)?,
            Event::CData(c) => writer.write_event(Event::CData(c)).map_err(svg_error)?,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) => {}
            Event::Eof => break,
        }
    }

    if !saw_root {
        return Err(svg_error("document has no root element"));
    }
    String::from_utf8(writer.into_inner()).map_err(TransformError::from)
}

fn rewrite_start(e: &BytesStart<'_>) -> Result<BytesStart<'static>, TransformError> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(svg_error)?
        .to_string();
    let mut out = BytesStart::new(name);

    for attr in e.attributes() {
        let attr = attr.map_err(svg_error)?;
        let key = attr.key.as_ref();
        if is_dropped_attribute(key) {
            continue;
        }
        if key == b"d" {
            let raw = std::str::from_utf8(&attr.value).map_err(svg_error)?;
            let data = minify_path_data(raw)
                .unwrap_or_else(|| raw.split_whitespace().collect::<Vec<_>>().join(" "));
            out.push_attribute(Attribute {
                key: QName(b"d"),
                value: Cow::Owned(data.into_bytes()),
            });
            continue;
        }
        out.push_attribute(attr);
    }
    Ok(out)
}

fn arity(cmd: u8) -> Option<usize> {
    match cmd.to_ascii_uppercase() {
        b'M' | b'L' | b'T' => Some(2),
        b'H' | b'V' => Some(1),
        b'C' => Some(6),
        b'S' | b'Q' => Some(4),
        b'A' => Some(7),
        b'Z' => Some(0),
        _ => None,
    }
}

struct Segment {
    cmd: u8,
    args: Vec<f64>,
}

/// Round coordinates to three decimals and drop redundant separators and
/// repeated command letters. Returns `None` when `d` is not well-formed
/// path data.
pub fn minify_path_data(d: &str) -> Option<String> {
    let segments = parse_path(d)?;

    let mut out = String::with_capacity(d.len());
    let mut prev_cmd: Option<u8> = None;
    let mut last_num: Option<String> = None;

    for seg in &segments {
        let merge = prev_cmd == Some(seg.cmd) && !matches!(seg.cmd, b'M' | b'm' | b'Z' | b'z');
        if !merge {
            out.push(seg.cmd as char);
            last_num = None;
        }
        for &v in &seg.args {
            let s = format_number(v);
            if let Some(prev) = &last_num {
                if needs_separator(prev, &s) {
                    out.push(' ');
                }
            }
            out.push_str(&s);
            last_num = Some(s);
        }
        prev_cmd = Some(seg.cmd);
    }
    Some(out)
}

fn parse_path(d: &str) -> Option<Vec<Segment>> {
    let bytes = d.as_bytes();
    let mut i = 0;
    let mut segments: Vec<Segment> = Vec::new();

    loop {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b',') {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }

        if arity(bytes[i]).is_some() {
            segments.push(Segment {
                cmd: bytes[i],
                args: Vec::new(),
            });
            i += 1;
            continue;
        }

        let seg = segments.last_mut()?;
        let n = arity(seg.cmd)?;
        if n == 0 {
            return None;
        }
        let pos = seg.args.len() % n;
        let value = if seg.cmd.eq_ignore_ascii_case(&b'a') && (pos == 3 || pos == 4) {
            // Arc flags are single digits and may be packed without separators.
            let flag = match bytes[i] {
                b'0' => 0.0,
                b'1' => 1.0,
                _ => return None,
            };
            i += 1;
            flag
        } else {
            let (v, len) = parse_number(&d[i..])?;
            i += len;
            v
        };
        seg.args.push(value);
    }

    let first = segments.first()?;
    if !matches!(first.cmd, b'M' | b'm') {
        return None;
    }
    for seg in &segments {
        let n = arity(seg.cmd)?;
        let ok = if n == 0 {
            seg.args.is_empty()
        } else {
            !seg.args.is_empty() && seg.args.len() % n == 0
        };
        if !ok {
            return None;
        }
    }
    Some(segments)
}

fn parse_number(s: &str) -> Option<(f64, usize)> {
    let b = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut i = 0;
    if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
        i += 1;
    }
    let int_end = digits_from(i);
    let mut digits = int_end - i;
    i = int_end;
    if i < b.len() && b[i] == b'.' {
        let frac_end = digits_from(i + 1);
        digits += frac_end - (i + 1);
        i = frac_end;
    }
    if digits == 0 {
        return None;
    }
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        let mut j = i + 1;
        if j < b.len() && (b[j] == b'+' || b[j] == b'-') {
            j += 1;
        }
        let exp_end = digits_from(j);
        if exp_end > j {
            i = exp_end;
        }
    }
    s[..i].parse::<f64>().ok().map(|v| (v, i))
}

fn format_number(v: f64) -> String {
    let mut rounded = (v * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        rounded = 0.0;
    }
    let s = format!("{rounded}");
    if let Some(rest) = s.strip_prefix("0.") {
        format!(".{rest}")
    } else if let Some(rest) = s.strip_prefix("-0.") {
        format!("-.{rest}")
    } else {
        s
    }
}

fn needs_separator(prev: &str, next: &str) -> bool {
    !(next.starts_with('-') || (next.starts_with('.') && prev.contains('.')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_data_is_rounded_and_compacted() {
        assert_eq!(
            minify_path_data("M 10.0000 20.5 L 30,40 L 50 60 Z").as_deref(),
            Some("M10 20.5L30 40 50 60Z")
        );
        assert_eq!(
            minify_path_data("M0.5,-0.25 l .1 .2").as_deref(),
            Some("M.5-.25l.1.2")
        );
        assert_eq!(
            minify_path_data("M1.23456 2.0004h-0.0001").as_deref(),
            Some("M1.235 2h0")
        );
    }

    #[test]
    fn packed_arc_flags_are_understood() {
        assert_eq!(
            minify_path_data("M0 0a5 5 0 0110 10").as_deref(),
            Some("M0 0a5 5 0 0 1 10 10")
        );
    }

    #[test]
    fn malformed_path_data_is_rejected() {
        assert_eq!(minify_path_data("M 10"), None);
        assert_eq!(minify_path_data("10 20"), None);
        assert_eq!(minify_path_data("M0 0 X 1"), None);
    }

    #[test]
    fn optimize_strips_editor_cruft() {
        let src = r##"<?xml version="1.0" encoding="UTF-8"?>
<!-- Generator: Sketch -->
<svg xmlns="http://www.w3.org/2000/svg" xmlns:sketch="http://www.bohemiancoding.com/sketch/ns" viewBox="0 0 10 10" sketch:type="MSPage">
  <metadata>rdf stuff</metadata>
  <sodipodi:namedview pagecolor="#fff"/>
  <path d="M 1.0000 1.0000 L 9 9" inkscape:label="x"/>
</svg>
"##;
        let out = optimize(src).unwrap();
        assert_eq!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><path d="M1 1L9 9"/></svg>"#
        );
    }

    #[test]
    fn unparsable_path_data_is_only_collapsed() {
        let out = optimize(r#"<svg><path d="M 1   oops"/></svg>"#).unwrap();
        assert!(out.contains(r#"d="M 1 oops""#), "{out}");
    }

    #[test]
    fn escaped_attribute_values_survive() {
        let out = optimize(r#"<svg><text title="a &amp; b">x</text></svg>"#).unwrap();
        assert!(out.contains(r#"title="a &amp; b""#), "{out}");
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(optimize("<svg><g></svg>").is_err());
    }
}
