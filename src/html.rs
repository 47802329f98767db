//! HTML rendering for the score page.
//!
//! The page is self-contained: inline CSS, and a short script that swaps the
//! table fragment in place whenever the layout selector changes.

use crate::view::{LayoutMode, ViewModel};

const PAGE_CSS: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; margin: 20px; }
h1 { text-align: center; margin-bottom: 20px; font-size: 1.5em; }
.layout-switch { text-align: center; margin-bottom: 20px; }
.layout-switch label { margin: 0 8px; }
.table-wrap { overflow-x: auto; margin: 0 auto; }
table { border-collapse: collapse; margin: 0 auto; }
th, td { padding: 4px 8px; border: 1px solid #ddd; }
th { background-color: black; color: white; font-weight: bold; text-align: left; }
td { text-align: right; }
th.label, td.label { position: sticky; left: 0; z-index: 1; text-align: left; }
td.label { background-color: white; }
"#;

const PAGE_JS: &str = r#"
document.querySelectorAll('input[name="layout-switch"]').forEach(function (input) {
  input.addEventListener('change', function () {
    fetch('/table?layout=' + encodeURIComponent(input.value))
      .then(function (resp) { return resp.text(); })
      .then(function (html) {
        document.getElementById('table-container').innerHTML = html;
      });
  });
});
"#;

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

/// Full page: title, layout selector and the table for `vm`.
pub fn render_page(title: &str, vm: &ViewModel) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
    <h1>{title}</h1>
    {selector}
    <div id="table-container">{table}</div>
    <script>{js}</script>
</body>
</html>"#,
        title = escape(title),
        css = PAGE_CSS,
        js = PAGE_JS,
        selector = render_selector(vm.layout),
        table = render_table(vm),
    )
}

fn render_selector(current: LayoutMode) -> String {
    let options: String = LayoutMode::OPTIONS
        .iter()
        .map(|(label, mode)| {
            let checked = if *mode == current { " checked" } else { "" };
            format!(
                r#"<label><input type="radio" name="layout-switch" value="{}"{}> {}</label>"#,
                mode.as_value(),
                checked,
                escape(label)
            )
        })
        .collect();
    format!(r#"<div class="layout-switch">{}</div>"#, options)
}

/// Table fragment only; this is what replaces `#table-container`.
pub fn render_table(vm: &ViewModel) -> String {
    let mut out = String::new();
    out.push_str(r#"<div class="table-wrap"><table data-layout=""#);
    out.push_str(vm.layout.as_value());
    out.push_str(r#""><thead><tr>"#);
    out.push_str(&format!(r#"<th class="label">{}</th>"#, escape(&vm.label_column)));
    for column in &vm.columns {
        out.push_str(&format!("<th>{}</th>", escape(column)));
    }
    out.push_str("</tr></thead><tbody>");
    for row in &vm.rows {
        out.push_str("<tr>");
        for (idx, cell) in row.iter().enumerate() {
            let class = if idx == 0 { r#" class="label""# } else { "" };
            out.push_str(&format!(
                r#"<td{} style="{}">{}</td>"#,
                class,
                cell.style.css(),
                escape(&cell.text)
            ));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table></div>");
    out
}
