// src/presentation.rs
//! Server-rendered page and result fragment

use crate::profile_analysis::AnalysisResult;

pub const PAGE_TITLE: &str = "Hinge Red Flag Check";
pub const LABEL_ANALYZE: &str = "Analyze";
pub const LABEL_REANALYZE: &str = "Reanalyze";
pub const LABEL_ANALYZING: &str = "Analyzing...";

/// What the page shows at a point of the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageState {
    pub image_count: usize,
    pub has_result: bool,
    pub loading: bool,
}

impl PageState {
    /// One analysis in flight at a time, and only once there is something to send
    pub fn analyze_enabled(&self) -> bool {
        self.image_count > 0 && !self.loading
    }

    pub fn analyze_label(&self) -> &'static str {
        if self.loading {
            LABEL_ANALYZING
        } else if self.has_result {
            LABEL_REANALYZE
        } else {
            LABEL_ANALYZE
        }
    }

    pub fn with_images(mut self, count: usize) -> Self {
        self.image_count = count;
        self
    }

    pub fn start_analysis(mut self) -> Self {
        self.loading = true;
        self
    }

    pub fn finish_analysis(mut self, succeeded: bool) -> Self {
        self.loading = false;
        self.has_result = self.has_result || succeeded;
        self
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn render_list(items: &[String]) -> String {
    if items.is_empty() {
        return "<p class=\"empty\">None</p>".to_string();
    }
    let entries: String = items
        .iter()
        .map(|item| format!("<li>{}</li>", escape_html(item)))
        .collect();
    format!("<ul>{}</ul>", entries)
}

/// Score line plus red and green flag lists
pub fn render_result(result: &AnalysisResult) -> String {
    format!(
        concat!(
            "<section id=\"analysis\">",
            "<h3>Analysis Result:</h3>",
            "<p class=\"score\">Red Flag Score: {score}</p>",
            "<h4>Red Flags:</h4>{red}",
            "<h4>Green Flags:</h4>{green}",
            "</section>"
        ),
        score = escape_html(&result.score_text()),
        red = render_list(&result.red_flags()),
        green = render_list(&result.green_flags()),
    )
}

/// Full page. The inline script drives compose, analyze and render.
pub fn render_page(state: &PageState, dev_mode: bool) -> String {
    let disabled = if state.analyze_enabled() { "" } else { " disabled" };
    let test_button = if dev_mode {
        "<button id=\"load-samples\" type=\"button\">Load Test Images</button>"
    } else {
        ""
    };

    PAGE_TEMPLATE
        .replace("{{title}}", PAGE_TITLE)
        .replace("{{disabled}}", disabled)
        .replace("{{label}}", state.analyze_label())
        .replace("{{count}}", &state.image_count.to_string())
        .replace("{{test_button}}", test_button)
        .replace("{{dev_mode}}", if dev_mode { "true" } else { "false" })
        .replace("{{label_analyze}}", LABEL_ANALYZE)
        .replace("{{label_reanalyze}}", LABEL_REANALYZE)
        .replace("{{label_analyzing}}", LABEL_ANALYZING)
}

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{title}}</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 56rem; margin: 0 auto; padding: 3rem 1rem; }
  header { text-align: center; margin-bottom: 2rem; }
  #drop { border: 2px dashed #ccc; padding: 20px; margin-bottom: 20px; }
  #thumbs { display: flex; flex-wrap: wrap; gap: 10px; margin-top: 20px; }
  #thumbs img { width: 100px; height: 100px; object-fit: cover; }
  #strip { width: 100%; height: auto; margin-top: 20px; }
  #error { color: #b91c1c; }
  button { padding: .5rem 1rem; font-weight: bold; }
</style>
</head>
<body>
<header>
  <h1>{{title}}</h1>
  <h2>Analyze your matches for red flags</h2>
</header>
<div id="drop">
  <p>Drag and drop images here</p>
  <input id="files" type="file" multiple accept="image/*">
  <div id="thumbs"></div>
  <p><span id="count">{{count}}</span> images uploaded</p>
  {{test_button}}
</div>
<div id="strip-box" hidden>
  <h3>Processed Strip Image (40 DPI, JPG):</h3>
  <img id="strip" alt="Processed images strip">
</div>
<p id="error" role="alert"></p>
<div id="result"></div>
<button id="analyze" type="button"{{disabled}}>{{label}}</button>
<script>
(() => {
  const DEV_MODE = {{dev_mode}};
  const LABELS = { analyze: "{{label_analyze}}", reanalyze: "{{label_reanalyze}}", analyzing: "{{label_analyzing}}" };
  const state = { files: [], strip: null, hasResult: false, loading: false, composeSeq: 0 };
  const $ = (id) => document.getElementById(id);

  function refreshButton() {
    const button = $("analyze");
    button.disabled = !(state.files.length > 0 && state.strip && !state.loading);
    button.textContent = state.loading ? LABELS.analyzing : (state.hasResult ? LABELS.reanalyze : LABELS.analyze);
  }

  function showError(message) { $("error").textContent = message || ""; }

  async function compose() {
    const seq = ++state.composeSeq;
    state.strip = null;
    refreshButton();
    const form = new FormData();
    state.files.forEach((file) => form.append("images", file, file.name));
    const response = await fetch("/api/compose", { method: "POST", body: form });
    const body = await response.json();
    // a newer compose owns the strip
    if (seq !== state.composeSeq) return;
    if (!response.ok) { showError(body.error); return; }
    showError("");
    state.strip = body.image;
    $("strip").src = body.image;
    $("strip-box").hidden = false;
    refreshButton();
  }

  function addFiles(files) {
    const images = Array.from(files).filter((f) => f.type.startsWith("image/"));
    if (images.length === 0) return;
    state.files = state.files.concat(images);
    $("count").textContent = state.files.length;
    images.forEach((file) => {
      const img = document.createElement("img");
      img.src = URL.createObjectURL(file);
      img.alt = file.name;
      $("thumbs").appendChild(img);
    });
    compose().catch((e) => showError(String(e)));
  }

  async function analyze() {
    if (!state.strip || state.loading) return;
    state.loading = true;
    refreshButton();
    try {
      const response = await fetch("/api/analyze", {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify({ image: state.strip }),
      });
      const body = await response.json();
      if (!response.ok) { showError(body.error || "Analysis failed"); return; }
      const rendered = await fetch("/api/render", {
        method: "POST",
        headers: { "Content-Type": "application/json" },
        body: JSON.stringify({ result: body.result }),
      });
      if (!rendered.ok) {
        const failure = await rendered.json().catch(() => ({}));
        showError(failure.error || "Could not display the result");
        return;
      }
      $("result").innerHTML = await rendered.text();
      state.hasResult = true;
      showError("");
    } catch (e) {
      showError(String(e));
    } finally {
      state.loading = false;
      refreshButton();
    }
  }

  async function loadSamples() {
    const names = await (await fetch("/api/test-images")).json();
    const files = await Promise.all(names.map(async (name) => {
      const blob = await (await fetch("/api/test-images/" + encodeURIComponent(name))).blob();
      return new File([blob], name, { type: blob.type });
    }));
    state.files = [];
    $("thumbs").innerHTML = "";
    addFiles(files);
  }

  const drop = $("drop");
  drop.addEventListener("dragover", (e) => e.preventDefault());
  drop.addEventListener("drop", (e) => { e.preventDefault(); addFiles(e.dataTransfer.files); });
  $("files").addEventListener("change", (e) => addFiles(e.target.files));
  $("analyze").addEventListener("click", analyze);
  if (DEV_MODE) {
    $("load-samples").addEventListener("click", () => loadSamples().catch((e) => showError(String(e))));
    loadSamples().catch((e) => showError(String(e)));
  }
  refreshButton();
})();
</script>
</body>
</html>
"#;
