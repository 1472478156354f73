// src/tasks/sprite.rs

//! `<symbol>` sprite assembly.

use std::collections::BTreeMap;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::tasks::error::TransformError;
use crate::tasks::svg;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// One icon, already optimized and wrapped in its `<symbol>`.
#[derive(Debug, Clone)]
pub struct SpriteSymbol {
    pub id: String,
    markup: Vec<u8>,
    /// `xmlns:*` declarations of the icon's root, hoisted to the sprite root.
    namespaces: Vec<(String, Vec<u8>)>,
}

fn sprite_error(e: impl std::fmt::Display) -> TransformError {
    TransformError::Sprite(e.to_string())
}

/// Optimize `source` and turn its root `<svg>` into a `<symbol id=..>`
/// carrying the original `viewBox` and `preserveAspectRatio`.
pub fn symbol_from_svg(id: &str, source: &str) -> Result<SpriteSymbol, TransformError> {
    let optimized = svg::optimize(source)?;
    let mut reader = Reader::from_str(&optimized);
    let mut writer = Writer::new(Vec::with_capacity(optimized.len()));
    let mut namespaces = Vec::new();
    let mut depth = 0usize;
    let mut closed = false;

    loop {
        let event = reader.read_event().map_err(sprite_error)?;
        if depth == 0 {
            let (root, self_closing) = match event {
                Event::Start(e) => (e, false),
                Event::Empty(e) => (e, true),
                Event::Eof => break,
                _ => continue,
            };
            if root.name().as_ref() != b"svg" {
                return Err(sprite_error(format!(
                    "root element of '{id}' is not <svg>"
                )));
            }

            let mut symbol = BytesStart::new("symbol");
            symbol.push_attribute(("id", id));
            for attr in root.attributes() {
                let attr = attr.map_err(sprite_error)?;
                let key = attr.key.as_ref();
                if key == b"viewBox" || key == b"preserveAspectRatio" {
                    symbol.push_attribute(attr);
                } else if let Some(prefix) = key.strip_prefix(b"xmlns:") {
                    namespaces.push((
                        String::from_utf8_lossy(prefix).into_owned(),
                        attr.value.into_owned(),
                    ));
                }
            }

            if self_closing {
                writer.write_event(Event::Empty(symbol)).map_err(sprite_error)?;
                closed = true;
                break;
            }
            writer.write_event(Event::Start(symbol)).map_err(sprite_error)?;
            depth = 1;
            continue;
        }

        match event {
            Event::Start(e) => {
                depth += 1;
                writer.write_event(Event::Start(e)).map_err(sprite_error)?;
            }
            Event::End(e) => {
                depth -= 1;
                if depth == 0 {
                    writer
                        .write_event(Event::End(BytesEnd::new("symbol")))
                        .map_err(sprite_error)?;
                    closed = true;
                    break;
                }
                writer.write_event(Event::End(e)).map_err(sprite_error)?;
            }
            Event::Eof => break,
            other => writer.write_event(other).map_err(sprite_error)?,
        }
    }

    if !closed {
        return Err(sprite_error(format!("'{id}' has no complete <svg> root")));
    }

    Ok(SpriteSymbol {
        id: id.to_string(),
        markup: writer.into_inner(),
        namespaces,
    })
}

/// Combine symbols, in the given order, into one inline-able `<svg>`.
pub fn assemble(symbols: &[SpriteSymbol]) -> Result<Vec<u8>, TransformError> {
    let mut seen = BTreeMap::new();
    for symbol in symbols {
        if seen.insert(symbol.id.as_str(), ()).is_some() {
            return Err(sprite_error(format!("duplicate symbol id '{}'", symbol.id)));
        }
    }

    let mut namespaces: BTreeMap<&str, &[u8]> = BTreeMap::new();
    for symbol in symbols {
        for (prefix, uri) in &symbol.namespaces {
            namespaces.entry(prefix.as_str()).or_insert(uri.as_slice());
        }
    }

    let mut root = BytesStart::new("svg");
    root.push_attribute(("xmlns", SVG_NS));
    for (prefix, uri) in &namespaces {
        let key = format!("xmlns:{prefix}");
        root.push_attribute((key.as_bytes(), *uri));
    }

    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Start(root)).map_err(sprite_error)?;
    for symbol in symbols {
        writer.get_mut().extend_from_slice(&symbol.markup);
    }
    writer
        .write_event(Event::End(BytesEnd::new("svg")))
        .map_err(sprite_error)?;
    Ok(writer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLUS: &str = r#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M 11 5 h 2 v 14 h -2 z"/></svg>"#;
    const MINUS: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 24 24" width="24"><rect x="5" y="11" width="14" height="2"/></svg>"#;

    #[test]
    fn two_icons_become_two_symbols() {
        let symbols = vec![
            symbol_from_svg("minus", MINUS).unwrap(),
            symbol_from_svg("plus", PLUS).unwrap(),
        ];
        let sprite = String::from_utf8(assemble(&symbols).unwrap()).unwrap();

        assert_eq!(
            sprite,
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">"#,
                r#"<symbol id="minus" viewBox="0 0 24 24"><rect x="5" y="11" width="14" height="2"/></symbol>"#,
                r#"<symbol id="plus" viewBox="0 0 24 24"><path d="M11 5h2v14h-2z"/></symbol>"#,
                "</svg>"
            )
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let symbols = vec![
            symbol_from_svg("plus", PLUS).unwrap(),
            symbol_from_svg("plus", PLUS).unwrap(),
        ];
        assert!(matches!(assemble(&symbols), Err(TransformError::Sprite(_))));
    }

    #[test]
    fn non_svg_root_is_rejected() {
        assert!(symbol_from_svg("x", "<html><body/></html>").is_err());
    }
}
