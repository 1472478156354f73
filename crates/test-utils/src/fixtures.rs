//! On-disk sample projects laid out like the built-in `source/` → `build/`
//! project.

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

pub const STYLE_SASS: &str = "\
@import variables

body
  margin: 0
  color: $accent

.button
  display: flex
  user-select: none
  &:hover
    color: $accent-dark
";

pub const VARIABLES_SASS: &str = "\
$accent: #ff6600
$accent-dark: #cc5200
";

pub const INDEX_HTML: &str = "\
<!DOCTYPE html>
<html lang=\"en\">
  <head>
    <title>Sample</title>
    <link rel=\"stylesheet\" href=\"css/style.min.css\">
  </head>
  <body>
    <h1>  Hello   world  </h1>
    <script src=\"js/main.js\"></script>
  </body>
</html>
";

pub const MAIN_JS: &str = "\
function greet(name) {
  const message = 'Hello, ' + name;
  console.log(message);
}
greet('world');
";

pub const PLUS_SVG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- plus icon -->
<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24">
  <path d="M 11.000 5.000 L 13.000 5.000 L 13.000 11.000 L 19.000 11.000 L 19.000 13.000 L 13.000 13.000 L 13.000 19.000 L 11.000 19.000 L 11.000 13.000 L 5.000 13.000 L 5.000 11.000 L 11.000 11.000 Z"/>
</svg>
"#;

pub const MINUS_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24">
  <path d="M 5 11 L 19 11 L 19 13 L 5 13 Z"/>
</svg>
"#;

pub const LOGO_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
  <metadata>generated</metadata>
  <circle cx="5" cy="5" r="4"/>
</svg>
"#;

/// Write `contents` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture dir");
    }
    fs::write(&path, contents).expect("write fixture file");
    path
}

/// Encode a small gradient image in `format`.
pub fn sample_image(format: ImageFormat, size: u32) -> Vec<u8> {
    let mut bytes = std::io::Cursor::new(Vec::new());
    match format {
        ImageFormat::Png => {
            let img = RgbaImage::from_fn(size, size, |x, y| {
                Rgba([(x * 255 / size) as u8, (y * 255 / size) as u8, 128, 255])
            });
            img.write_to(&mut bytes, format).expect("encode png fixture");
        }
        _ => {
            let img = RgbImage::from_fn(size, size, |x, y| {
                Rgb([(x * 255 / size) as u8, 64, (y * 255 / size) as u8])
            });
            img.write_to(&mut bytes, format).expect("encode fixture image");
        }
    }
    bytes.into_inner()
}

/// Populate `root` with a complete sample site under `source/`.
pub fn write_sample_project(root: &Path) {
    write_file(root, "source/sass/style.sass", STYLE_SASS);
    write_file(root, "source/sass/_variables.sass", VARIABLES_SASS);
    write_file(root, "source/index.html", INDEX_HTML);
    write_file(root, "source/js/main.js", MAIN_JS);
    write_file(root, "source/fonts/body.woff2", b"wOF2-fixture");
    write_file(root, "source/favicon.ico", b"ico-fixture");
    write_file(root, "source/manifest.webmanifest", "{\"name\":\"Sample\"}\n");
    write_file(root, "source/img/hero.png", sample_image(ImageFormat::Png, 32));
    write_file(root, "source/img/photos/beach.jpg", sample_image(ImageFormat::Jpeg, 32));
    write_file(root, "source/img/svg/logo.svg", LOGO_SVG);
    write_file(root, "source/img/svg/icons/plus.svg", PLUS_SVG);
    write_file(root, "source/img/svg/icons/minus.svg", MINUS_SVG);
}

/// blake3 digest over every file below `dir`: relative paths and contents,
/// in sorted order.
pub fn tree_hash(dir: &Path) -> String {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(d) = stack.pop() {
        for entry in fs::read_dir(&d).expect("read dir") {
            let path = entry.expect("dir entry").path();
            if path.is_dir() {
                stack.push(path);
            } else {
                files.push(path);
            }
        }
    }
    files.sort();

    let mut hasher = blake3::Hasher::new();
    for file in files {
        let rel = file.strip_prefix(dir).expect("below dir");
        hasher.update(rel.to_string_lossy().as_bytes());
        hasher.update(&[0]);
        hasher.update(&fs::read(&file).expect("read file"));
    }
    hasher.finalize().to_hex().to_string()
}
