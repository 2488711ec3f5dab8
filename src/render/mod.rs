//! Renderer module: trait-based format dispatch.

pub mod json;
pub mod markdown;

use crate::report::RoleReport;
use anyhow::{anyhow, Result};

/// Trait for rendering a RoleReport into a specific output format.
pub trait Renderer {
    fn render(&self, report: &RoleReport) -> Result<String>;
    fn file_extension(&self) -> &str;
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str) -> Result<Box<dyn Renderer>> {
    match format {
        "markdown" | "md" => Ok(Box::new(markdown::MarkdownRenderer)),
        "json" => Ok(Box::new(json::JsonRenderer)),
        _ => Err(anyhow!("unknown format: {}. Use markdown or json", format)),
    }
}
