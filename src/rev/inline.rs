//! Inline critical assets into templates.
//!
//! Marked regions are replaced according to their type:
//!
//! ```html
//! <!-- process:css inline extra.css -->
//! <link rel="stylesheet" href="/styles/extra.css">
//! <!-- /process -->
//! ```
//!
//! | Marker                     | Replacement                            |
//! |----------------------------|----------------------------------------|
//! | `css inline <path>`        | `<style>` with the file content        |
//! | `js inline <path>`         | `<script>` with the file content       |
//! | `css <href>`               | single `<link rel="stylesheet">`       |
//! | `js <src>`                 | single `<script src>`                  |
//! | `remove`                   | nothing                                |
//!
//! Inline paths resolve against the include base. Since this runs after the
//! rewrite pass, the path in the marker already names the revisioned file.

use super::RevError;
use crate::utils::glob::FileSet;
use rayon::prelude::*;
use regex::{Captures, Regex};
use std::fs;
use std::path::{Path, PathBuf};

/// Summary of one inline pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineReport {
    pub files_scanned: usize,
    pub files_changed: usize,
    pub blocks: usize,
}

/// Process every template under `templates_dir` matching `patterns`.
pub fn inline_assets<S: AsRef<str>>(
    templates_dir: &Path,
    patterns: &[S],
    include_base: &Path,
    marker: &str,
) -> Result<InlineReport, RevError> {
    let templates = FileSet::new(patterns, &[])?.collect(templates_dir, true)?;
    let inliner = Inliner::new(marker, include_base)?;

    let counts = templates
        .par_iter()
        .map(|path| inline_file(&inliner, path))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(InlineReport {
        files_scanned: templates.len(),
        files_changed: counts.iter().filter(|&&n| n > 0).count(),
        blocks: counts.iter().sum(),
    })
}

fn inline_file(inliner: &Inliner, path: &Path) -> Result<usize, RevError> {
    let content = fs::read_to_string(path).map_err(|e| RevError::io("read", path, e))?;
    let Some((updated, blocks)) = inliner.process(&content, path)? else {
        return Ok(0);
    };
    fs::write(path, updated).map_err(|e| RevError::io("write", path, e))?;
    crate::debug!("inline"; "{}: {} block(s)", path.display(), blocks);
    Ok(blocks)
}

/// Marker matcher bound to an include base.
#[derive(Debug)]
pub struct Inliner {
    regex: Regex,
    base: PathBuf,
}

impl Inliner {
    pub fn new(marker: &str, base: &Path) -> Result<Self, RevError> {
        let m = regex::escape(marker);
        let regex = Regex::new(&format!(
            r"(?s)<!--\s*{m}:(\w+)(\s+inline)?(?:\s+(\S+?))?\s*-->.*?<!--\s*/{m}\s*-->"
        ))?;
        Ok(Self {
            regex,
            base: base.to_path_buf(),
        })
    }

    /// Replace every marked block. `None` when the template has no markers.
    pub fn process(&self, text: &str, template: &Path) -> Result<Option<(String, usize)>, RevError> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        let mut blocks = 0;

        for caps in self.regex.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&text[last..whole.start()]);
            out.push_str(&self.replacement(&caps, template)?);
            last = whole.end();
            blocks += 1;
        }

        if blocks == 0 {
            return Ok(None);
        }
        out.push_str(&text[last..]);
        Ok(Some((out, blocks)))
    }

    fn replacement(&self, caps: &Captures<'_>, template: &Path) -> Result<String, RevError> {
        let kind = &caps[1];
        let inline = caps.get(2).is_some();
        let target = caps.get(3).map(|m| m.as_str());

        match (kind, inline, target) {
            ("remove", _, _) => Ok(String::new()),
            ("css", true, Some(path)) => Ok(format!("<style>{}</style>", self.read(path, template)?)),
            ("js", true, Some(path)) => Ok(format!("<script>{}</script>", self.read(path, template)?)),
            ("css", false, Some(href)) => Ok(format!(r#"<link rel="stylesheet" href="{href}">"#)),
            ("js", false, Some(src)) => Ok(format!(r#"<script src="{src}"></script>"#)),
            ("css" | "js", _, None) => Err(RevError::UnknownInlineType {
                kind: format!("{kind} (missing path)"),
                template: template.to_path_buf(),
            }),
            _ => Err(RevError::UnknownInlineType {
                kind: kind.to_string(),
                template: template.to_path_buf(),
            }),
        }
    }

    fn read(&self, rel: &str, template: &Path) -> Result<String, RevError> {
        let path = self.base.join(rel.trim_start_matches('/'));
        match fs::read_to_string(&path) {
            Ok(content) => Ok(content.trim_end().to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(RevError::MissingInlineSource {
                path,
                template: template.to_path_buf(),
            }),
            Err(e) => Err(RevError::io("read", path, e)),
        }
    }
}
