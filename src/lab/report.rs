//! Research bundle writer.
//!
//! Layout of a published bundle:
//!
//! ```text
//! <root>/<job_id>/
//!     result.json          full research result
//!     best.json            best candidate (omitted when there is none)
//!     candidates/<id>.json one file per candidate
//!     index.html           ranked overview
//! ```

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::schema::{Candidate, ResearchResult};
use crate::search::{PublishReceipt, ReportError, RunReporter};

/// Writes research results as JSON bundles under a root directory.
#[derive(Debug, Clone)]
pub struct JsonReporter {
    root: PathBuf,
}

impl JsonReporter {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write the bundle for `result` and return where it went.
    pub fn write_bundle(&self, result: &ResearchResult) -> Result<PublishReceipt, ReportError> {
        let bundle_dir = self.root.join(result.job_id());
        let candidates_dir = bundle_dir.join("candidates");
        fs::create_dir_all(&candidates_dir)?;

        write_json(&bundle_dir.join("result.json"), result)?;

        if let Some(best) = result.best_candidate() {
            write_json(&bundle_dir.join("best.json"), best)?;
        }

        for candidate in result.all_candidates() {
            let path = candidates_dir.join(format!("{}.json", file_stem(candidate.id())));
            write_json(&path, candidate)?;
        }

        let index_path = bundle_dir.join("index.html");
        fs::write(&index_path, render_index(result))?;

        debug!(
            "Wrote {} candidate files under {}",
            result.all_candidates().len(),
            bundle_dir.display()
        );
        Ok(PublishReceipt {
            bundle_dir,
            index_path,
        })
    }
}

impl RunReporter for JsonReporter {
    fn publish(&mut self, result: &ResearchResult) -> Result<PublishReceipt, ReportError> {
        self.write_bundle(result)
    }
}

/// Load a result previously written as `result.json`.
pub fn load_result<P: AsRef<Path>>(path: P) -> Result<ResearchResult, ReportError> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// Ids are engine-minted, but keep anything path-like out of file names.
fn file_stem(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn render_index(result: &ResearchResult) -> String {
    let mut html = String::new();
    let title = format!("Research run {}", result.job_id());

    // Writing to a String cannot fail.
    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(html, "<html><head><meta charset=\"utf-8\">");
    let _ = writeln!(html, "<title>{}</title></head><body>", html_escape::encode_text(&title));
    let _ = writeln!(html, "<h1>{}</h1>", html_escape::encode_text(&title));
    let _ = writeln!(
        html,
        "<p>Status: {:?}. Generations: {}. Candidates: {}.</p>",
        result.status(),
        result.generations_completed(),
        result.all_candidates().len()
    );
    if let Some(reason) = result.stop_reason() {
        let reason = format!("{reason:?}");
        let _ = writeln!(html, "<p>Stopped: {}</p>", html_escape::encode_text(&reason));
    }

    if let Some(best) = result.best_candidate() {
        let _ = writeln!(html, "<h2>Best concept</h2>");
        render_candidate(&mut html, best);
    }

    let _ = writeln!(html, "<h2>Ranking</h2>");
    let _ = writeln!(
        html,
        "<table><tr><th>#</th><th>Id</th><th>Name</th><th>Generation</th><th>Fitness</th></tr>"
    );
    for (rank, candidate) in result.ranked().into_iter().enumerate() {
        let id = file_stem(candidate.id());
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td><a href=\"candidates/{}.json\">{}</a></td><td>{}</td><td>{}</td><td>{:.3}</td></tr>",
            rank + 1,
            html_escape::encode_double_quoted_attribute(&id),
            html_escape::encode_text(candidate.id()),
            html_escape::encode_text(&candidate.name),
            candidate.generation,
            candidate.fitness().unwrap_or(f64::NAN)
        );
    }
    let _ = writeln!(html, "</table>");

    let unranked = result
        .all_candidates()
        .iter()
        .filter(|c| !c.is_rankable())
        .count();
    if unranked > 0 {
        let _ = writeln!(html, "<p>{unranked} candidate(s) without a complete score.</p>");
    }

    let _ = writeln!(html, "</body></html>");
    html
}

fn render_candidate(html: &mut String, candidate: &Candidate) {
    let spec = &candidate.spec;
    let _ = writeln!(
        html,
        "<h3>{}</h3><p>{}</p><dl>",
        html_escape::encode_text(&candidate.name),
        html_escape::encode_text(&candidate.summary)
    );
    for (label, value) in [
        ("Layout", &spec.layout_pattern),
        ("Navigation", &spec.navigation_pattern),
        ("Palette", &spec.color_palette),
        ("Typography", &spec.typography_scale),
        ("Components", &spec.component_library_style),
        ("Interaction", &spec.interaction_notes),
        ("Accessibility", &spec.accessibility_notes),
    ] {
        let _ = writeln!(
            html,
            "<dt>{label}</dt><dd>{}</dd>",
            html_escape::encode_text(value)
        );
    }
    let _ = writeln!(html, "</dl>");
    if let Some(rationale) = candidate.evaluation().and_then(|e| e.rationale()) {
        let _ = writeln!(html, "<p><em>{}</em></p>", html_escape::encode_text(rationale));
    }
}
