//! JSON renderer: structured output for tooling integration.
//!
//! Serializes the RoleReport directly.

use crate::render::Renderer;
use crate::report::RoleReport;
use anyhow::Result;

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, report: &RoleReport) -> Result<String> {
        let mut out = serde_json::to_string_pretty(report)?;
        out.push('\n');
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}
