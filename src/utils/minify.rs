//! Minification of compiled bundles.
//!
//! Uses oxc for JavaScript and lightningcss for CSS. A file that fails to
//! parse is left as the compiler wrote it.

use std::fs;
use std::io;
use std::path::Path;

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

/// Minify JavaScript source code.
///
/// Tried as an ES module first, then as a classic script.
pub fn minify_js(source: &str) -> Option<String> {
    [SourceType::mjs(), SourceType::default()]
        .into_iter()
        .find_map(|source_type| minify_js_as(source, source_type))
}

fn minify_js_as(source: &str, source_type: SourceType) -> Option<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        return None;
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Some(code)
}

/// Minify CSS source code.
pub fn minify_css(source: &str) -> Option<String> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default()).ok()?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .ok()?;
    Some(result.code)
}

/// Size before and after minifying a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Savings {
    pub before: usize,
    pub after: usize,
}

/// Minify a `.js` or `.css` file in place.
///
/// Returns `Ok(None)` when the extension is not handled or the content does
/// not parse; the file is then left untouched.
pub fn minify_file(path: &Path) -> io::Result<Option<Savings>> {
    let minify: fn(&str) -> Option<String> = match path.extension().and_then(|e| e.to_str()) {
        Some("js") => minify_js,
        Some("css") => minify_css,
        _ => return Ok(None),
    };

    let source = fs::read_to_string(path)?;
    let Some(minified) = minify(&source) else {
        return Ok(None);
    };
    fs::write(path, &minified)?;
    Ok(Some(Savings {
        before: source.len(),
        after: minified.len(),
    }))
}
