use itertools::Itertools;
use std::fs;
use std::path::{Path, PathBuf};

use crate::session::SessionResult;

pub const ISSUER: &str = "Issued by Depth Knowledge";
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Presentational summary of a finished test
#[derive(Debug, Clone, PartialEq)]
pub struct Certificate<'a> {
    result: &'a SessionResult,
    name: &'a str,
}

impl<'a> Certificate<'a> {
    pub fn new(result: &'a SessionResult, name: &'a str) -> Self {
        Self { result, name }
    }

    fn fields(&self) -> [(&'static str, String); 6] {
        let r = self.result;
        [
            ("Name", self.name.to_string()),
            ("Date & Time", r.timestamp.format(DATE_FORMAT).to_string()),
            ("Level", r.level.to_string()),
            ("Speed", format!("{} WPM", r.gross_wpm)),
            ("Net Speed", format!("{} WPM", r.net_wpm)),
            ("Accuracy", format!("{}%", r.accuracy)),
        ]
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec!["Typing Test Certificate".to_string(), String::new()];
        lines.extend(
            self.fields()
                .into_iter()
                .map(|(label, value)| format!("{label}: {value}")),
        );
        lines.push(String::new());
        lines.push(ISSUER.to_string());
        lines
    }

    pub fn to_html(&self) -> String {
        let rows = self
            .fields()
            .into_iter()
            .map(|(label, value)| {
                format!(
                    "      <p><b>{}:</b> {}</p>",
                    escape_html(label),
                    escape_html(&value)
                )
            })
            .join("\n");

        format!(
            "<div class=\"certificate\">\n      <h2>Typing Test Certificate</h2>\n{rows}\n      <p>{}</p>\n    </div>\n",
            escape_html(ISSUER)
        )
    }

    /// Write the HTML form into `dir`, returning the file path
    pub fn save_html(&self, dir: &Path) -> std::io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let file_name = format!(
            "certificate-{}-{}.html",
            self.result.timestamp.format("%Y%m%d-%H%M%S"),
            self.result.level
        );
        let path = dir.join(file_name);
        fs::write(&path, self.to_html())?;
        Ok(path)
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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
