// HTML rendering for the browser UI
//
// Every page is self-contained: one form, inline CSS, no scripts. Results
// are rendered into the same page below the upload form.

use crate::reports::AnalysisResult;
use crate::types::{Cell, RISK_LEVEL};
use crate::util::format_int;

pub const TITLE: &str = "AI Revenue Leakage Detection Agent";
pub const SUCCESS_MESSAGE: &str = "Risk Analysis Completed Successfully";
pub const MISSING_FILES_MESSAGE: &str =
    "Please upload all three required files before running analysis.";

/// Status line shown above the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Success,
    Warning(String),
    Error(String),
}

impl Banner {
    pub fn missing_files() -> Self {
        Banner::Warning(MISSING_FILES_MESSAGE.to_string())
    }

    pub fn processing_error(cause: impl std::fmt::Display) -> Self {
        Banner::Error(format!("Error processing files: {}", cause))
    }

    fn render(&self) -> String {
        let (class, text) = match self {
            Banner::Success => ("success", SUCCESS_MESSAGE),
            Banner::Warning(msg) => ("warning", msg.as_str()),
            Banner::Error(msg) => ("error", msg.as_str()),
        };
        format!(r#"<div class="banner {}">{}</div>"#, class, html_escape(text))
    }
}

/// Render the page: upload form, optional banner, optional results.
pub fn render_page(banner: Option<&Banner>, result: Option<&AnalysisResult>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>AI Revenue Risk Agent</title>
    <style>{css}</style>
</head>
<body>
    <div class="container">
        <h1>{title}</h1>
        <p>Upload AR Aging, Billing, and Contract files to run automated risk analysis.</p>
        {form}
        {banner}
        {results}
    </div>
</body>
</html>"#,
        css = inline_css(),
        title = TITLE,
        form = render_upload_form(),
        banner = banner.map(Banner::render).unwrap_or_default(),
        results = result.map(render_results).unwrap_or_default(),
    )
}

fn render_upload_form() -> String {
    let picker = |field: &str, label: &str| {
        format!(
            r#"
            <label class="picker">{label}
                <input type="file" name="{field}" accept=".xlsx,.xls,.ods,.csv">
            </label>"#
        )
    };
    format!(
        r#"<form method="post" action="/analyze" enctype="multipart/form-data">
        <div class="pickers">{}{}{}
        </div>
        <button type="submit">Run Analysis</button>
    </form>"#,
        picker("ar_file", "Upload AR Aging File"),
        picker("billing_file", "Upload Billing File"),
        picker("contract_file", "Upload Contract File"),
    )
}

fn render_results(result: &AnalysisResult) -> String {
    format!(
        r#"{kpis}
        <p class="meta">Completed {completed}</p>
        {table}
        <a class="download" href="/download">Download Results</a>"#,
        kpis = render_kpis(result),
        completed = result.completed_at.format("%Y-%m-%d %H:%M:%S"),
        table = render_results_table(result),
    )
}

fn render_kpis(result: &AnalysisResult) -> String {
    let s = &result.summary;
    let tiles = [
        ("Total Invoices", s.total),
        ("High Risk", s.high),
        ("Medium Risk", s.medium),
        ("Low Risk", s.low),
    ];
    let cards: String = tiles
        .iter()
        .map(|(label, value)| {
            format!(
                r#"
            <div class="kpi">
                <h3>{}</h3>
                <div class="value">{}</div>
            </div>"#,
                label,
                format_int(*value)
            )
        })
        .collect();
    format!(r#"<div class="kpis">{}</div>"#, cards)
}

fn render_results_table(result: &AnalysisResult) -> String {
    let table = &result.table;
    let level_col = table.column_index(RISK_LEVEL);

    let head: String = table
        .headers
        .iter()
        .map(|h| format!("<th>{}</th>", html_escape(h)))
        .collect();

    let mut body = String::new();
    for row in &table.rows {
        let class = level_col
            .and_then(|i| match &row[i] {
                Cell::Text(level) => Some(level.to_ascii_lowercase()),
                _ => None,
            })
            .unwrap_or_default();
        body.push_str(&format!(r#"<tr class="risk-{}">"#, html_escape(&class)));
        for cell in row {
            let align = if matches!(cell, Cell::Number(_)) { r#" class="num""# } else { "" };
            body.push_str(&format!("<td{}>{}</td>", align, html_escape(&cell.to_string())));
        }
        body.push_str("</tr>\n");
    }

    format!(
        r#"<div class="table-wrap">
        <table>
            <thead><tr>{}</tr></thead>
            <tbody>
{}            </tbody>
        </table>
        </div>"#,
        head, body
    )
}

fn inline_css() -> &'static str {
    r#"
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 0; background: #fafafa; color: #222; }
.container { padding: 24px 40px; }
h1 { margin-bottom: 4px; }
.pickers { display: grid; grid-template-columns: repeat(3, 1fr); gap: 16px; margin: 16px 0; }
.picker { display: flex; flex-direction: column; gap: 8px; padding: 16px; background: #fff; border: 1px dashed #bbb; border-radius: 6px; }
button { padding: 8px 18px; border: 1px solid #ccc; border-radius: 6px; background: #fff; cursor: pointer; }
.banner { margin: 16px 0; padding: 12px 16px; border-radius: 6px; }
.banner.success { background: #e6f4ea; color: #1e6b34; }
.banner.warning { background: #fff8e1; color: #8a6d00; }
.banner.error { background: #fdecea; color: #a4201d; }
.kpis { display: grid; grid-template-columns: repeat(4, 1fr); gap: 16px; margin: 16px 0; }
.kpi { background: #fff; padding: 12px 16px; border-radius: 6px; box-shadow: 0 1px 2px rgba(0,0,0,0.08); }
.kpi h3 { margin: 0; font-size: 14px; font-weight: 400; color: #555; }
.kpi .value { font-size: 32px; }
.meta { color: #777; font-size: 12px; }
.table-wrap { overflow-x: auto; max-height: 480px; }
table { border-collapse: collapse; width: 100%; background: #fff; font-size: 13px; }
th, td { border: 1px solid #e5e5e5; padding: 4px 8px; text-align: left; white-space: nowrap; }
th { position: sticky; top: 0; background: #f3f3f3; }
td.num { text-align: right; }
tr.risk-high td { background: #fdecea; }
tr.risk-medium td { background: #fff8e1; }
.download { display: inline-block; margin-top: 16px; padding: 8px 18px; border: 1px solid #ccc; border-radius: 6px; text-decoration: none; color: #222; background: #fff; }
"#
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RiskSummary, Table};
    use chrono::Local;

    fn result() -> AnalysisResult {
        let mut table = Table::new(
            "merged",
            vec!["Invoice_No".to_string(), "Risk_Level".to_string(), "Risk_Reasons".to_string()],
        );
        table.push_row(vec![
            Cell::text("<INV-1>"),
            Cell::text("High"),
            Cell::text("Invoice overdue > 90 days"),
        ]);
        AnalysisResult {
            table,
            assessments: vec![],
            summary: RiskSummary {
                total: 1,
                high: 1,
                medium: 0,
                low: 0,
            },
            completed_at: Local::now(),
        }
    }

    #[test]
    fn empty_page_has_form_only() {
        let page = render_page(None, None);
        assert!(page.contains(TITLE));
        assert!(page.contains(r#"name="ar_file""#));
        assert!(page.contains(r#"name="billing_file""#));
        assert!(page.contains(r#"name="contract_file""#));
        assert!(!page.contains("Download Results"));
    }

    #[test]
    fn results_are_escaped() {
        let page = render_page(Some(&Banner::Success), Some(&result()));
        assert!(page.contains("&lt;INV-1&gt;"));
        assert!(page.contains("Invoice overdue &gt; 90 days"));
        assert!(page.contains(r#"<tr class="risk-high">"#));
        assert!(page.contains(SUCCESS_MESSAGE));
        assert!(page.contains("Download Results"));
    }

    #[test]
    fn error_banner_carries_cause() {
        let banner = Banner::processing_error("Missing column 'Project_ID' in Contract file");
        let page = render_page(Some(&banner), None);
        assert!(page.contains("Error processing files: Missing column &#39;Project_ID&#39;"));
        assert!(page.contains(r#"class="banner error""#));
    }
}
