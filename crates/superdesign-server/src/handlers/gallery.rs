//! Gallery index page

use crate::AppState;
use axum::{extract::State, response::Html};
use std::collections::HashMap;
use std::fmt::Write;
use superdesign_core::scan_assets;

const RELOAD_SCRIPT: &str = r#"<script>
const source = new EventSource('/events');
source.onmessage = (e) => {
  const msg = JSON.parse(e.data);
  if (msg.event === 'file_changed') { location.reload(); }
};
</script>"#;

/// Every design file on disk, newest record data attached when available
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let records = state.workspace.reconcile_assets().await;
    let prompts: HashMap<&str, &str> = records
        .iter()
        .map(|r| (r.file_name.as_str(), r.prompt.as_str()))
        .collect();
    let files = scan_assets(&state.asset_dir()).await;

    let mut page = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Superdesign Gallery</title></head>\n<body>\n",
    );
    let _ = writeln!(page, "<h1>Design iterations ({})</h1>", files.len());
    page.push_str("<ul>\n");
    for file in &files {
        let name = escape(&file.name);
        let _ = write!(
            page,
            "<li><a href=\"/design_iterations/{0}\">{0}</a> <small>{1} bytes</small>",
            name, file.size
        );
        if let Some(prompt) = prompts.get(file.name.as_str()).filter(|p| !p.is_empty()) {
            let _ = write!(page, " <em>{}</em>", escape(prompt));
        }
        page.push_str("</li>\n");
    }
    page.push_str("</ul>\n");
    page.push_str(RELOAD_SCRIPT);
    page.push_str("\n</body>\n</html>\n");
    Html(page)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
