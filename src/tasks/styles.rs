// src/tasks/styles.rs

//! Sass/SCSS compilation (`grass`) followed by prefixing, lowering and
//! minification for the configured browsers (`lightningcss`).

use std::io;
use std::path::{Path, PathBuf};

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::config::model::TargetsSection;
use crate::fs::FileSystem;
use crate::tasks::error::TransformError;
use crate::tasks::sass::indented_to_scss;

/// Parse `"major"` or `"major.minor"` into lightningcss' packed version
/// (`major << 16 | minor << 8`).
pub fn parse_browser_version(version: &str) -> Option<u32> {
    let mut parts = version.trim().split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = match parts.next() {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() || major > 0xffff || minor > 0xff {
        return None;
    }
    Some((major << 16) | (minor << 8))
}

/// Browser list for `[targets]`. Versions were checked during config
/// validation; anything unparsable is left untargeted.
pub fn browsers_from_targets(targets: &TargetsSection) -> Browsers {
    let v = |s: &Option<String>| s.as_deref().and_then(parse_browser_version);
    Browsers {
        android: v(&targets.android),
        chrome: v(&targets.chrome),
        edge: v(&targets.edge),
        firefox: v(&targets.firefox),
        ie: None,
        ios_saf: v(&targets.ios_saf),
        opera: v(&targets.opera),
        safari: v(&targets.safari),
        samsung: v(&targets.samsung),
    }
}

/// Sass partials (`_name.sass`) are only compiled through imports.
pub fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

fn is_indented(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "sass")
}

/// View of the project filesystem handed to `grass`.
///
/// `.sass` files are hidden; in their place a `.scss` twin is served whose
/// contents are the converted source, so imports of indented partials
/// resolve like SCSS partials.
#[derive(Debug)]
struct SassFs<'a> {
    fs: &'a dyn FileSystem,
}

impl SassFs<'_> {
    fn indented_twin(&self, path: &Path) -> Option<PathBuf> {
        if path.extension().is_some_and(|e| e == "scss") && !self.fs.is_file(path) {
            let twin = path.with_extension("sass");
            if self.fs.is_file(&twin) {
                return Some(twin);
            }
        }
        None
    }
}

impl grass::Fs for SassFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        self.fs.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        if is_indented(path) {
            return false;
        }
        self.fs.is_file(path) || self.indented_twin(path).is_some()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let to_io = |e: anyhow::Error| io::Error::other(format!("{e:#}"));

        if let Some(twin) = self.indented_twin(path) {
            let source = self.fs.read_to_string(&twin).map_err(to_io)?;
            let scss = indented_to_scss(&source).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("{}: {e}", twin.display()),
                )
            })?;
            return Ok(scss.into_bytes());
        }
        self.fs.read(path).map_err(to_io)
    }
}

/// Compile one entry file to minified CSS.
pub fn compile_entry(
    fs: &dyn FileSystem,
    entry: &Path,
    source: &[u8],
    browsers: Browsers,
) -> Result<Vec<u8>, TransformError> {
    let sass_fs = SassFs { fs };
    let mut options = grass::Options::default().fs(&sass_fs);
    if let Some(dir) = entry.parent() {
        options = options.load_path(dir);
    }

    let text = String::from_utf8(source.to_vec())?;
    let scss = if is_indented(entry) {
        indented_to_scss(&text)?
    } else {
        text
    };

    let css = grass::from_string(scss, &options).map_err(|e| TransformError::Sass(e.to_string()))?;

    let filename = entry.display().to_string();
    finish_css(&css, &filename, browsers).map(String::into_bytes)
}

/// Prefix, lower and minify plain CSS for `browsers`.
pub fn finish_css(css: &str, filename: &str, browsers: Browsers) -> Result<String, TransformError> {
    let targets = Targets::from(browsers);

    let mut sheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: filename.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| TransformError::Css(e.to_string()))?;

    sheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| TransformError::Css(e.to_string()))?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| TransformError::Css(e.to_string()))?;

    Ok(printed.code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn old_safari() -> Browsers {
        Browsers {
            safari: parse_browser_version("13"),
            ..Browsers::default()
        }
    }

    #[test]
    fn browser_versions_pack_major_and_minor() {
        assert_eq!(parse_browser_version("109"), Some(109 << 16));
        assert_eq!(parse_browser_version("15.4"), Some((15 << 16) | (4 << 8)));
        assert_eq!(parse_browser_version("15.x"), None);
        assert_eq!(parse_browser_version("1.2.3"), None);
    }

    #[test]
    fn partials_are_detected_by_leading_underscore() {
        assert!(is_partial(Path::new("source/sass/_vars.sass")));
        assert!(!is_partial(Path::new("source/sass/style.sass")));
    }

    #[test]
    fn compiles_indented_entry_with_indented_partial() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/source/sass/_vars.sass", "$accent: #ff0000\n");
        let entry = "@import vars\n\nbody\n  color: $accent\n  .title\n    margin: 0 0 10px 0\n";
        fs.add_file("/proj/source/sass/style.sass", entry);

        let css = compile_entry(
            &fs,
            Path::new("/proj/source/sass/style.sass"),
            entry.as_bytes(),
            old_safari(),
        )
        .unwrap();
        let css = String::from_utf8(css).unwrap();

        assert!(css.starts_with("body{color:red}"), "{css}");
        assert!(css.contains("body .title{margin:0 0 10px}"), "{css}");
        assert!(!css.contains('\n'));
    }

    #[test]
    fn prefixes_for_old_browsers() {
        let css = finish_css(".a{user-select:none}", "a.css", old_safari()).unwrap();
        assert!(css.contains("-webkit-user-select:none"), "{css}");
    }

    #[test]
    fn undefined_variable_is_a_sass_error() {
        let fs = MockFileSystem::new();
        let entry = "body\n  color: $missing\n";
        let err = compile_entry(
            &fs,
            Path::new("/proj/source/sass/style.sass"),
            entry.as_bytes(),
            old_safari(),
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::Sass(_)), "{err}");
    }
}
