//! End-to-end tests for revision → rewrite → inline over a build tree.

use super::*;
use crate::utils::hash::fingerprint;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const LAYOUT: &str = "**/_layout*.html";

struct Fixture {
    _dir: TempDir,
    build: std::path::PathBuf,
    manifest: std::path::PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let build = dir.path().join("dist");
        let manifest = dir.path().join("rev-manifest.json");
        fs::create_dir_all(build.join("web/js")).unwrap();
        fs::create_dir_all(build.join("web/styles")).unwrap();
        fs::create_dir_all(build.join("templates")).unwrap();
        Self {
            _dir: dir,
            build,
            manifest,
        }
    }

    fn write(&self, rel: &str, content: &str) {
        fs::write(self.build.join(rel), content).unwrap();
    }

    fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.build.join(rel)).unwrap()
    }

    fn web(&self) -> std::path::PathBuf {
        self.build.join("web")
    }

    fn templates(&self) -> std::path::PathBuf {
        self.build.join("templates")
    }

    /// revision + rewrite, as the stages run them.
    fn revision_and_rewrite(&self, patterns: &[&str]) -> (Manifest, RewriteReport) {
        let manifest = assign_revisions(&self.web(), patterns).unwrap();
        manifest.save(&self.manifest).unwrap();
        let report = rewrite_references(&self.manifest, &self.templates(), &[LAYOUT]).unwrap();
        (manifest, report)
    }
}

fn exists(base: &Path, rel: &str) -> bool {
    base.join(rel).exists()
}

#[test]
fn test_script_reference_rewritten() {
    let fx = Fixture::new();
    fx.write("web/js/main.js", "X");
    fx.write("templates/_layout.html", r#"<script src="main.js"></script>"#);

    let (manifest, report) = fx.revision_and_rewrite(&["**/main.js"]);
    let h1 = fingerprint("X");

    assert!(exists(&fx.web(), &format!("js/main.{h1}.js")));
    assert!(!exists(&fx.web(), "js/main.js"));
    assert_eq!(manifest.get("js/main.js"), Some(format!("js/main.{h1}.js").as_str()));
    assert_eq!(
        fx.read("templates/_layout.html"),
        format!(r#"<script src="main.{h1}.js"></script>"#)
    );
    assert_eq!(report.replacements, 1);
}

#[test]
fn test_unbuilt_reference_passes_through() {
    let fx = Fixture::new();
    fx.write("web/js/main.js", "X");
    let template = r#"<script src="other.js"></script>"#;
    fx.write("templates/_layout.html", template);

    let (_, report) = fx.revision_and_rewrite(&["**/main.js"]);
    assert_eq!(fx.read("templates/_layout.html"), template);
    assert_eq!(report.files_changed, 0);
    assert_eq!(report.files_scanned, 1);
}

#[test]
fn test_every_manifest_key_rewritten() {
    let fx = Fixture::new();
    fx.write("web/js/main.js", "js");
    fx.write("web/styles/extra.css", "css");
    fx.write(
        "templates/_layoutBase.html",
        r#"<link href="/styles/extra.css"><script src="/js/main.js"></script>"#,
    );
    fx.write("templates/page.html", r#"<script src="/js/main.js"></script>"#);

    let (manifest, report) = fx.revision_and_rewrite(&["**/main.js", "**/extra.css"]);
    let layout = fx.read("templates/_layoutBase.html");
    for (original, revisioned) in manifest.iter() {
        assert!(!layout.contains(&format!("/{original}\"")), "{original} left in layout");
        assert!(layout.contains(revisioned));
    }
    assert_eq!(report.replacements, 2);
    // not a layout template
    assert_eq!(fx.read("templates/page.html"), r#"<script src="/js/main.js"></script>"#);
}

#[test]
fn test_rewrite_twice_is_stable() {
    let fx = Fixture::new();
    fx.write("web/js/main.js", "X");
    fx.write("templates/_layout.html", r#"<script src="/js/main.js"></script>"#);

    fx.revision_and_rewrite(&["**/main.js"]);
    let once = fx.read("templates/_layout.html");

    let report = rewrite_references(&fx.manifest, &fx.templates(), &[LAYOUT]).unwrap();
    assert_eq!(fx.read("templates/_layout.html"), once);
    assert_eq!(report.files_changed, 0);
}

#[test]
fn test_changed_content_repoints_reference() {
    let fx = Fixture::new();
    fx.write("web/js/main.js", "v1");
    fx.write("templates/_layout.html", r#"<script src="/js/main.js"></script>"#);
    fx.revision_and_rewrite(&["**/main.js"]);

    // A rebuild without clean: fresh bundle, already-rewritten template
    fx.write("web/js/main.js", "v2");
    let previous = Manifest::load(&fx.manifest).unwrap();
    let (manifest, _) = fx.revision_and_rewrite(&["**/main.js"]);
    prune_stale(&fx.web(), &previous, &manifest).unwrap();

    let h2 = fingerprint("v2");
    assert_eq!(
        fx.read("templates/_layout.html"),
        format!(r#"<script src="/js/main.{h2}.js"></script>"#)
    );
    assert!(!exists(&fx.web(), &format!("js/main.{}.js", fingerprint("v1"))));
}

#[test]
fn test_inline_reads_rewritten_path() {
    let fx = Fixture::new();
    fx.write("web/styles/extra.css", "h1{margin:0}");
    fx.write(
        "templates/_layout.html",
        "<!-- process:css inline extra.css -->\n<link rel=\"stylesheet\" href=\"/styles/extra.css\">\n<!-- /process -->",
    );

    fx.revision_and_rewrite(&["**/extra.css"]);
    let rewritten = fx.read("templates/_layout.html");
    let h = fingerprint("h1{margin:0}");
    assert!(rewritten.contains(&format!("inline extra.{h}.css")));

    let report = inline_assets(&fx.templates(), &[LAYOUT], &fx.web().join("styles"), "process").unwrap();
    assert_eq!(report.blocks, 1);
    assert_eq!(fx.read("templates/_layout.html"), "<style>h1{margin:0}</style>");
}

#[test]
fn test_inline_missing_file_is_fatal() {
    let fx = Fixture::new();
    fx.write(
        "templates/_layout.html",
        "<!-- process:css inline extra.css --><!-- /process -->",
    );
    let err = inline_assets(&fx.templates(), &[LAYOUT], &fx.web().join("styles"), "process").unwrap_err();
    assert!(err.to_string().contains("extra.css"));
}

#[test]
fn test_source_tree_untouched() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("templates");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("_layout.html"), r#"<script src="/js/main.js"></script>"#).unwrap();

    let fx = Fixture::new();
    fx.write("web/js/main.js", "X");
    fs::copy(source.join("_layout.html"), fx.build.join("templates/_layout.html")).unwrap();
    fx.revision_and_rewrite(&["**/main.js"]);

    assert_eq!(
        fs::read_to_string(source.join("_layout.html")).unwrap(),
        r#"<script src="/js/main.js"></script>"#
    );
}
