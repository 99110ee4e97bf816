//! Report artifacts: HTML page, JSON export, CSV tables.

use std::fmt::Write as _;
use std::io::Write;

use chrono::Local;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::Language;
use crate::error::Result;
use crate::harness::{Evaluation, MethodResult};
use crate::metrics::Metrics;

/// Run parameters shown alongside the metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportContext {
    pub method: String,
    pub language: String,
    pub timestamp: String,
}

impl ReportContext {
    /// Context stamped with the current local time.
    pub fn now(method: impl Into<String>, language: Language) -> Self {
        Self {
            method: method.into(),
            language: language.tag().to_string(),
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// `{metrics, method, language, timestamp}`.
pub fn json_export(metrics: &Metrics, ctx: &ReportContext) -> Value {
    json!({
        "metrics": metrics.to_map(),
        "method": ctx.method,
        "language": ctx.language,
        "timestamp": ctx.timestamp,
    })
}

/// Top-N frequency table as CSV with a `token,frequency` header.
pub fn write_frequency_csv<W: Write>(metrics: &Metrics, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["token", "frequency"])?;
    for row in &metrics.token_freq {
        let count = row.count.to_string();
        csv.write_record([row.token.as_str(), count.as_str()])?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// One CSV row per method result.
pub fn write_results_csv<W: Write>(results: &[MethodResult], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for result in results {
        csv.serialize(result)?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Fixed-width text table of an evaluation, with exclusion notes.
pub fn results_table(eval: &Evaluation) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<14} {:>10} {:>12} {:>10} {:>12} {:>8} {:>7}",
        "method", "vocab", "tokens", "similarity", "ms/1000", "oov %", "failed"
    );
    for r in &eval.results {
        let _ = writeln!(
            out,
            "{:<14} {:>10} {:>12} {:>10.4} {:>12.2} {:>8.2} {:>7}",
            r.method.name(),
            r.vocab_size,
            r.total_tokens,
            r.avg_similarity,
            r.time_per_1000_articles * 1000.0,
            r.oov_percentage,
            r.failed_records
        );
    }
    let _ = writeln!(out, "shared vocabulary: {}", eval.shared_vocab_size);
    for e in &eval.excluded {
        let _ = writeln!(out, "excluded {}: {}", e.method, e.reason);
    }
    out
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const STYLE: &str = "\
body{font-family:'Segoe UI',system-ui,sans-serif;background:#f8fafc;color:#1f2937;margin:0;padding:24px}\
.page{max-width:1100px;margin:0 auto;background:#fff;border-radius:16px;box-shadow:0 4px 25px rgba(0,0,0,.08)}\
header{background:#6366f1;color:#fff;padding:32px;border-radius:16px 16px 0 0}\
.grid{display:grid;grid-template-columns:repeat(3,1fr);gap:16px;padding:32px}\
.metric{border:1px solid #e5e7eb;border-radius:12px;padding:16px}\
.label{color:#6b7280;font-size:.9em}.value{font-size:1.6em;font-weight:700}\
table{width:calc(100% - 64px);margin:0 32px 32px;border-collapse:collapse}\
th,td{padding:8px 12px;border-bottom:1px solid #e5e7eb;text-align:left}\
footer{color:#6b7280;padding:16px 32px}";

/// Self-contained HTML report for one analysis.
pub fn render_html(metrics: &Metrics, ctx: &ReportContext) -> String {
    let top_total: usize = metrics.token_freq.iter().map(|f| f.count).sum();
    let mut rows = String::new();
    for (rank, row) in metrics.token_freq.iter().enumerate() {
        let share = if top_total > 0 {
            row.count as f64 / top_total as f64 * 100.0
        } else {
            0.0
        };
        let _ = write!(
            rows,
            "<tr><td>{}</td><td><strong>{}</strong></td><td>{}</td><td>{:.2}%</td></tr>",
            rank + 1,
            escape_html(&row.token),
            row.count,
            share
        );
    }

    let metric = |label: &str, value: String| {
        format!(
            "<div class=\"metric\"><div class=\"label\">{}</div><div class=\"value\">{}</div></div>",
            label, value
        )
    };
    let cards = [
        metric("Метод обработки", escape_html(&ctx.method.to_uppercase())),
        metric("Язык анализа", escape_html(&ctx.language.to_uppercase())),
        metric("Размер словаря", metrics.vocab_size.to_string()),
        metric("Доля OOV", format!("{:.2}%", metrics.oov_percentage)),
        metric("Всего токенов", metrics.total_tokens.to_string()),
        metric("Средняя длина токена", format!("{:.1}", metrics.mean_token_length())),
    ]
    .concat();

    format!(
        "<!DOCTYPE html>\n<html lang=\"ru\">\n<head>\n<meta charset=\"UTF-8\">\n\
<title>Анализ текстовых данных</title>\n<style>{style}</style>\n</head>\n<body>\n\
<div class=\"page\">\n<header><h1>Анализ текстовых данных</h1></header>\n\
<section class=\"grid\">{cards}</section>\n\
<h2 style=\"margin:0 32px 16px\">Частотность токенов (Топ-{top})</h2>\n\
<table>\n<thead><tr><th>#</th><th>Токен</th><th>Частота</th><th>Доля</th></tr></thead>\n\
<tbody>{rows}</tbody>\n</table>\n\
<footer>Сгенерировано автоматически • {timestamp}</footer>\n</div>\n</body>\n</html>\n",
        style = STYLE,
        cards = cards,
        top = metrics.token_freq.len(),
        rows = rows,
        timestamp = escape_html(&ctx.timestamp),
    )
}
