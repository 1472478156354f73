// src/config/defaults.rs

//! Built-in project used when no `Sitepipe.toml` is present.
//!
//! Layout: sources under `source/`, everything written to `build/`.

pub const BUILTIN_PROJECT: &str = r#"
[server]
base_dir = "build"
port = 3000
cors = true

[task.clean]
kind = "clean"
dest = "build"

[task.copy]
kind = "copy"
src = ["source/fonts/*.{woff2,woff}", "source/*.ico", "source/*.webmanifest"]
base = "source"
dest = "build"

[task.copy_images]
kind = "copy"
src = ["source/img/**/*.{jpg,png}"]
dest = "build/img"

[task.optimize_images]
kind = "optimize_images"
src = ["source/img/**/*.{jpg,png}"]
dest = "build/img"

[task.webp]
kind = "webp"
src = ["source/img/**/*.{jpg,png}"]
dest = "build/img"

[task.styles]
kind = "styles"
src = ["source/sass/style.sass"]
dest = "build/css"
rename = "style.min.css"

[task.html]
kind = "html"
src = ["source/*.html"]
dest = "build"

[task.scripts]
kind = "scripts"
src = ["source/js/*.js"]
dest = "build/js"

[task.svg]
kind = "svg"
src = ["source/img/svg/*.svg", "source/img/favicons/*.svg", "!source/img/svg/icons/*.svg"]
base = "source"
dest = "build"

[task.sprite]
kind = "sprite"
src = ["source/img/svg/icons/*.svg"]
dest = "build/img/svg"
rename = "sprite.svg"

[pipeline.build]
steps = [
    "clean",
    "copy",
    "optimize_images",
    ["styles", "html", "scripts", "svg", "sprite", "webp"],
]

[pipeline.default]
steps = [
    "clean",
    "copy",
    "copy_images",
    "styles",
    ["html", "scripts", "svg", "sprite", "webp"],
]
serve = true
watch = true
keep_going = true

[[watch]]
src = ["source/sass/**/*.sass"]
task = "styles"
reload = "css"

[[watch]]
src = ["source/*.html"]
task = "html"
reload = "full"
"#;
