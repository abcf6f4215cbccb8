pub mod anchor;
pub mod config;
pub mod footer;
pub mod frontmatter;
pub mod lines;
pub mod toc;
pub mod transform;

use napi::bindgen_prelude::Result as NapiResult;
use napi_derive::napi;
use serde_json::Value;

pub use config::{ConfigError, TransformConfig};
pub use lines::Heading;
pub use toc::TocBlock;
pub use transform::{transform, transform_lines};

// =============================================================================
// Types
// =============================================================================

#[napi(object)]
pub struct HeadingInfo {
    #[napi(js_name = "lineIndex")]
    pub line_index: u32,
    pub level: u32,
    pub text: String,
}

impl From<Heading> for HeadingInfo {
    fn from(heading: Heading) -> Self {
        Self {
            line_index: heading.line_index as u32,
            level: u32::from(heading.level),
            text: heading.text,
        }
    }
}

#[napi(object)]
pub struct TocBlockRange {
    pub start: u32,
    pub end: u32,
}

impl From<TocBlock> for TocBlockRange {
    fn from(block: TocBlock) -> Self {
        Self {
            start: block.start as u32,
            end: block.end as u32,
        }
    }
}

// =============================================================================
// NAPI Exports
// =============================================================================

#[napi(js_name = "transformMarkdown")]
pub fn transform_markdown(
    text: String,
    filename_base: String,
    config: Option<Value>,
) -> NapiResult<String> {
    let config = TransformConfig::from_json(config.unwrap_or(Value::Null)).map_err(to_napi_error)?;
    Ok(transform(&text, &filename_base, &config))
}

#[napi(js_name = "parseMarkdownHeadings")]
pub fn parse_markdown_headings(text: String) -> Vec<HeadingInfo> {
    lines::parse_headings(&lines::split_lines(&text))
        .into_iter()
        .map(HeadingInfo::from)
        .collect()
}

#[napi(js_name = "findMarkdownTocBlocks")]
pub fn find_markdown_toc_blocks(text: String) -> Vec<TocBlockRange> {
    toc::find_toc_blocks(&lines::split_lines(&text))
        .into_iter()
        .map(TocBlockRange::from)
        .collect()
}

#[napi(js_name = "defaultTransformConfig")]
pub fn default_transform_config() -> NapiResult<Value> {
    serde_json::to_value(TransformConfig::default()).map_err(to_napi_error)
}

// =============================================================================
// Helpers
// =============================================================================

fn to_napi_error(err: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(err.to_string())
}
