#![allow(dead_code)]

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use assetpipe::config::{ConfigFile, load_and_validate};
use assetpipe::fs::RealFileSystem;
use assetpipe::orchestrator::Orchestrator;

pub use assetpipe_test_utils::{init_tracing, with_timeout};

pub const CONFIG_FILE: &str = "Assetpipe.toml";

/// A throwaway project directory with an `Assetpipe.toml`.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new(config_toml: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp project");
        fs::write(dir.path().join(CONFIG_FILE), config_toml).expect("write config");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write fixture");
        path
    }

    pub fn mkdir(&self, rel: &str) {
        fs::create_dir_all(self.path(rel)).expect("create dir");
    }

    pub fn config(&self) -> ConfigFile {
        load_and_validate(self.path(CONFIG_FILE)).expect("valid config")
    }

    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::from_config(&self.config(), Arc::new(RealFileSystem), self.root())
    }

    /// Files below `rel`, relative to it, sorted.
    pub fn files_under(&self, rel: &str) -> Vec<String> {
        let base = self.path(rel);
        let mut out = Vec::new();
        let mut stack = vec![base.clone()];
        while let Some(dir) = stack.pop() {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    let rel = path.strip_prefix(&base).unwrap();
                    out.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        out.sort();
        out
    }
}

fn gradient() -> image::DynamicImage {
    let img = image::RgbImage::from_fn(64, 64, |x, y| {
        image::Rgb([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8])
    });
    image::DynamicImage::ImageRgb8(img)
}

pub fn png_bytes() -> Vec<u8> {
    let mut out = Vec::new();
    gradient()
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

pub fn jpeg_bytes() -> Vec<u8> {
    let mut out = Vec::new();
    gradient()
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Jpeg)
        .unwrap();
    out
}

pub const SVG: &str = r##"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<!-- Created with an editor that likes to leave notes behind. -->
<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10" viewBox="0 0 10 10">
  <metadata>
    <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
      <rdf:Description about="exported icon, revision 42, do not edit by hand"/>
    </rdf:RDF>
  </metadata>
  <g>
    <rect width="10" height="10" fill="#336699"/>
  </g>
</svg>
"##;
