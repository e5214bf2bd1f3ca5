// src/config/defaults.rs

//! Built-in pipeline used when no config file is present, and written out by
//! `assetpipe init`.

pub const DEFAULT_CONFIG_TOML: &str = r#"# assetpipe pipeline
#
# Paths are relative to the directory containing this file.

[config]
src = "src"
dest = "dist"
host = "127.0.0.1"
port = 3000
notify = true
# queue | cancel | overlap
overlap = "queue"
debounce_ms = 100

[task.html-task]
src = "src/index.html"
dest = ""
reload = "full"

[task.css-task]
src = "src/assets/sass/style.scss"
dest = "assets/css"
reload = "styles"
steps = [
  { kind = "sass" },
  { kind = "css", minify = true, browsers = ["defaults"] },
]

[task.js-task]
src = "src/js/main.js"
dest = "js"
steps = [
  { kind = "bundle", mode = "development", filename = "script.js", source_map = true },
]

[task.copy-assets]
src = "src/assets/*.*"
dest = "assets"

[task.image-task]
src = "src/assets/img/**/*.*"
dest = "assets/img"
steps = [
  { kind = "image", jpeg_quality = 75, png_compression = "best", svg = { precision = 3 } },
]

[task.fonts-task]
src = "src/assets/fonts/**/*.*"
dest = "assets/fonts"
steps = [{ kind = "image" }]

[task.build-prod-js]
src = "src/js/main.js"
dest = ""
include_in_build = false
reload = "none"
steps = [
  { kind = "bundle", mode = "production", filename = "script.js" },
]

[[watch]]
patterns = ["src/index.html"]
tasks = ["html-task"]

[[watch]]
patterns = ["src/assets/sass/**/*.scss"]
tasks = ["css-task"]

[[watch]]
patterns = ["src/assets/*.*"]
tasks = ["copy-assets"]

[[watch]]
patterns = ["src/assets/img/**/*.*"]
tasks = ["image-task"]

[[watch]]
patterns = ["src/assets/fonts/**/*.*"]
tasks = ["fonts-task"]

[[watch]]
patterns = ["src/js/**/*.js"]
tasks = ["js-task"]
"#;
