//! Rewrite template references to revisioned asset names.
//!
//! For a manifest key `js/main.js` the matcher accepts
//!
//! - `js/main.js` anywhere it is not glued to a preceding filename
//!   character (`/js/main.js`, `../js/main.js`, `"js/main.js"`),
//! - the bare `main.js`, when not preceded by `/` or a filename character
//!   and no other key shares that file name,
//!
//! each optionally carrying an old `.<fingerprint>` before the extension, and
//! never followed by a filename character. Rewriting an already rewritten
//! template is therefore a no-op.

use super::{Manifest, RevError};
use crate::utils::glob::FileSet;
use crate::utils::hash::HASH_LEN;
use rayon::prelude::*;
use regex::{Regex, RegexBuilder};
use rustc_hash::FxHashMap;
use std::borrow::Cow;
use std::fs;
use std::path::Path;

/// Summary of one rewrite pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteReport {
    pub files_scanned: usize,
    pub files_changed: usize,
    pub replacements: usize,
}

/// Load `manifest_path` and rewrite every template under `templates_dir`
/// matching `patterns`, in place.
pub fn rewrite_references<S: AsRef<str>>(
    manifest_path: &Path,
    templates_dir: &Path,
    patterns: &[S],
) -> Result<RewriteReport, RevError> {
    let manifest = Manifest::load(manifest_path)?;
    let templates = FileSet::new(patterns, &[])?.collect(templates_dir, true)?;

    let Some(rewriter) = Rewriter::new(&manifest)? else {
        return Ok(RewriteReport {
            files_scanned: templates.len(),
            ..Default::default()
        });
    };

    let counts = templates
        .par_iter()
        .map(|path| rewrite_file(&rewriter, path))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RewriteReport {
        files_scanned: templates.len(),
        files_changed: counts.iter().filter(|&&n| n > 0).count(),
        replacements: counts.iter().sum(),
    })
}

/// Returns the number of replacements; the file is written only if it changed.
fn rewrite_file(rewriter: &Rewriter, path: &Path) -> Result<usize, RevError> {
    let content = fs::read_to_string(path).map_err(|e| RevError::io("read", path, e))?;
    let (rewritten, count) = rewriter.rewrite(&content);
    if let Cow::Owned(updated) = rewritten
        && updated != content
    {
        fs::write(path, updated).map_err(|e| RevError::io("write", path, e))?;
        crate::debug!("rewrite"; "{}: {} reference(s)", path.display(), count);
        return Ok(count);
    }
    Ok(0)
}

/// Characters that may appear inside an asset file name.
#[inline]
fn is_filename_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

#[derive(Debug)]
struct Target {
    replacement: String,
    /// Bare file name form: must not follow `/`.
    bare: bool,
}

/// Compiled matcher for one manifest.
#[derive(Debug)]
pub struct Rewriter {
    regex: Regex,
    /// Capture group index → target.
    targets: Vec<Target>,
}

impl Rewriter {
    /// `None` for an empty manifest.
    pub fn new(manifest: &Manifest) -> Result<Option<Self>, RevError> {
        if manifest.is_empty() {
            return Ok(None);
        }

        let mut basenames: FxHashMap<&str, usize> = FxHashMap::default();
        for (original, _) in manifest.iter() {
            *basenames.entry(file_name(original)).or_default() += 1;
        }

        // (pattern, target), longest first so `js/main.js` beats `main.js`
        let mut alternatives: Vec<(String, Target)> = Vec::new();
        for (original, revisioned) in manifest.iter() {
            let name = file_name(original);
            alternatives.push((
                pattern_for(original),
                Target {
                    replacement: revisioned.to_string(),
                    bare: false,
                },
            ));
            if name.len() != original.len() && basenames.get(name) == Some(&1) {
                alternatives.push((
                    pattern_for(name),
                    Target {
                        replacement: file_name(revisioned).to_string(),
                        bare: true,
                    },
                ));
            }
        }
        alternatives.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let source = alternatives
            .iter()
            .map(|(p, _)| format!("({p})"))
            .collect::<Vec<_>>()
            .join("|");
        let regex = RegexBuilder::new(&source)
            .size_limit(64 * (1 << 20))
            .build()?;
        let targets = alternatives.into_iter().map(|(_, t)| t).collect();

        Ok(Some(Self { regex, targets }))
    }

    /// Rewrite `text`, returning the result and the replacement count.
    pub fn rewrite<'a>(&self, text: &'a str) -> (Cow<'a, str>, usize) {
        let mut out = String::new();
        let mut last = 0;
        let mut pos = 0;
        let mut count = 0;

        while pos <= text.len() {
            let Some(caps) = self.regex.captures_at(text, pos) else {
                break;
            };
            let Some((idx, m)) = caps
                .iter()
                .skip(1)
                .enumerate()
                .find_map(|(i, m)| m.map(|m| (i, m)))
            else {
                break;
            };
            let target = &self.targets[idx];

            if !self.bounded(text, m.start(), m.end(), target.bare) {
                pos = next_char(text, m.start());
                continue;
            }

            out.push_str(&text[last..m.start()]);
            out.push_str(&target.replacement);
            count += usize::from(m.as_str() != target.replacement);
            last = m.end();
            pos = m.end();
        }

        if last == 0 {
            return (Cow::Borrowed(text), 0);
        }
        out.push_str(&text[last..]);
        (Cow::Owned(out), count)
    }

    fn bounded(&self, text: &str, start: usize, end: usize, bare: bool) -> bool {
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();
        let before_ok = match before {
            None => true,
            Some('/') => !bare,
            Some(c) => !is_filename_char(c),
        };
        before_ok && !after.is_some_and(is_filename_char)
    }
}

/// `[dir/]stem[.<hash>]ext` for one manifest key.
fn pattern_for(key: &str) -> String {
    let name_start = key.len() - file_name(key).len();
    let (dir, name) = key.split_at(name_start);
    let (stem, ext) = match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    };
    format!(
        "{}{}(?:\\.[0-9a-f]{{{HASH_LEN}}})?{}",
        regex::escape(dir),
        regex::escape(stem),
        regex::escape(ext)
    )
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn next_char(text: &str, at: usize) -> usize {
    text[at..].chars().next().map_or(at + 1, |c| at + c.len_utf8())
}
