//! # HTML Pages
//!
//! Static viewer pages around a snapshot export.
//!
//! ## Modes
//! - **Embed**: the export is inlined. A document goes in as a JS object literal, an
//!   archive as a base64 string. The viewer runtime is linked from the CDN.
//! - **Self-hosted**: nothing is inlined. The page loads `assets/*` and the data file
//!   by relative path and links the session container for re-editing.

use crate::assembler::SnapshotExport;
use crate::errors::StoryResult;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// How the page gets the viewer runtime and the story data.
#[derive(Debug, Clone, Copy)]
pub enum HtmlMode<'a> {
    Embed {
        export: &'a SnapshotExport,
        script_url: &'a str,
        stylesheet_url: &'a str,
    },
    SelfHosted {
        script_path: &'a str,
        stylesheet_path: &'a str,
        data_path: &'a str,
        session_path: &'a str,
    },
}

/// Escapes text for element content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
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

/// Rewrites markup characters in serialized JSON as `\uXXXX` escapes, so no
/// `</script` or `<!--` sequence survives into an inline `<script>` element.
/// They only occur inside string values, where the escape means the same thing.
fn script_safe(json: String) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            _ => out.push(c),
        }
    }
    out
}

/// A JS string literal safe to place inside a `<script>` element.
fn js_string(text: &str) -> StoryResult<String> {
    Ok(script_safe(serde_json::to_string(text)?))
}

fn embed_loader(export: &SnapshotExport) -> StoryResult<String> {
    let loader = match export {
        SnapshotExport::Document(document) => {
            let literal = script_safe(serde_json::to_string(document)?);
            format!(
                "const format = 'mvsj';\n    const data = JSON.stringify({});",
                literal
            )
        }
        SnapshotExport::Archive(bytes) => format!(
            "const format = 'mvsx';\n    const data = Uint8Array.from(atob('{}'), (c) => c.charCodeAt(0));",
            STANDARD.encode(bytes)
        ),
    };
    Ok(loader)
}

fn self_hosted_loader(data_path: &str) -> StoryResult<String> {
    let format = if data_path.ends_with(".mvsx") { "mvsx" } else { "mvsj" };
    Ok(format!(
        r#"const format = '{format}';
    const response = await fetch({path});
    if (!response.ok) throw new Error('Failed to load story data: ' + response.status);
    const data = format === 'mvsx' ? new Uint8Array(await response.arrayBuffer()) : await response.text();"#,
        format = format,
        path = js_string(data_path)?,
    ))
}

/// Renders the page. `title` is escaped here; pass it raw.
pub fn render_page(title: &str, mode: HtmlMode<'_>) -> StoryResult<String> {
    let (script_src, stylesheet_href, loader, session_link) = match mode {
        HtmlMode::Embed {
            export,
            script_url,
            stylesheet_url,
        } => (script_url, stylesheet_url, embed_loader(export)?, String::new()),
        HtmlMode::SelfHosted {
            script_path,
            stylesheet_path,
            data_path,
            session_path,
        } => (
            script_path,
            stylesheet_path,
            self_hosted_loader(data_path)?,
            format!(
                "\n<a id=\"session\" href=\"{}\" download>Download editable story</a>",
                escape_html(session_path)
            ),
        ),
    };

    Ok(format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" type="text/css" href="{stylesheet}">
<script type="text/javascript" src="{script}"></script>
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  html, body {{ width: 100%; height: 100%; overflow: hidden; }}
  #viewer {{ position: absolute; inset: 0; }}
  #session {{
    position: fixed;
    bottom: 12px;
    left: 16px;
    z-index: 10;
    font-family: sans-serif;
    font-size: 12px;
  }}
</style>
</head>
<body>
<div id="viewer"></div>{session_link}
<script type="text/javascript">
  (async () => {{
    {loader}
    const viewer = await molstar.Viewer.create('viewer', {{
      layoutIsExpanded: false,
      layoutShowControls: false,
      layoutShowLog: false,
      viewportShowExpand: true,
    }});
    await viewer.loadMvsData(data, format);
  }})().catch((err) => console.error(err));
</script>
</body>
</html>
"##,
        title = escape_html(title),
        stylesheet = escape_html(stylesheet_href),
        script = escape_html(script_src),
        session_link = session_link,
        loader = loader,
    ))
}
