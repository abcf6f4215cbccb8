use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_MAX_DEPTH: u8 = 4;
pub const MAX_HEADING_LEVEL: u8 = 6;
pub const DEFAULT_HR: &str = crate::footer::DEFAULT_HR;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid transform config: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Options for one transform pass. Field names match the plugin settings
/// file, so the same JSON object can feed both.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    #[serde(deserialize_with = "deserialize_max_depth")]
    pub max_depth: u8,
    #[serde(deserialize_with = "deserialize_footer_levels")]
    pub footer_levels: Vec<u8>,
    pub prettify_h1: bool,
    pub create_frontmatter: bool,
    pub hr: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            footer_levels: vec![2],
            prettify_h1: true,
            create_frontmatter: false,
            hr: DEFAULT_HR.to_string(),
        }
    }
}

impl TransformConfig {
    /// `null` yields the defaults.
    pub fn from_json(value: Value) -> Result<Self, ConfigError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Copy with every field inside the range the pipeline relies on.
    pub fn normalized(&self) -> Self {
        let max_depth = crate::toc::effective_depth(self.max_depth);
        let hr = crate::footer::footer_hr(self.hr.trim_end()).to_string();
        if hr != self.hr.trim_end() {
            warn!(hr = %self.hr, "unusable rule line, using default");
        }
        Self {
            max_depth,
            footer_levels: clean_levels(self.footer_levels.iter().map(|&level| i64::from(level))),
            prettify_h1: self.prettify_h1,
            create_frontmatter: self.create_frontmatter,
            hr,
        }
    }
}

/// Parses a comma separated level list such as `"2,3"`. Tokens that are not
/// integers are skipped.
pub fn parse_footer_levels(raw: &str) -> Vec<u8> {
    clean_levels(
        raw.split(',')
            .filter_map(|token| token.trim().parse::<i64>().ok()),
    )
}

fn clean_levels(levels: impl IntoIterator<Item = i64>) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    for level in levels {
        if !(1..=i64::from(MAX_HEADING_LEVEL)).contains(&level) {
            warn!(level, "ignoring footer level outside 1..=6");
            continue;
        }
        let level = level as u8;
        if !out.contains(&level) {
            out.push(level);
        }
    }
    out
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FooterLevelsInput {
    Single(i64),
    Text(String),
    List(Vec<Value>),
}

fn deserialize_footer_levels<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let levels = match FooterLevelsInput::deserialize(deserializer)? {
        FooterLevelsInput::Single(level) => clean_levels([level]),
        FooterLevelsInput::Text(raw) => parse_footer_levels(&raw),
        FooterLevelsInput::List(items) => clean_levels(items.iter().filter_map(|item| match item {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        })),
    };
    Ok(levels)
}

fn deserialize_max_depth<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let depth = i64::deserialize(deserializer)?;
    Ok(depth.clamp(0, i64::from(MAX_HEADING_LEVEL)) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_plugin_settings() {
        let config = TransformConfig::default();
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.footer_levels, vec![2]);
        assert!(config.prettify_h1);
        assert!(!config.create_frontmatter);
        assert_eq!(config.hr, "---");
        assert_eq!(TransformConfig::from_json(Value::Null).unwrap(), config);
        assert_eq!(TransformConfig::from_json(json!({})).unwrap(), config);
    }

    #[test]
    fn footer_levels_accept_string_list_and_number() {
        let from_text = TransformConfig::from_json(json!({ "footer_levels": "2, 3,x" })).unwrap();
        assert_eq!(from_text.footer_levels, vec![2, 3]);

        let from_list = TransformConfig::from_json(json!({ "footer_levels": [3, "2", 3] })).unwrap();
        assert_eq!(from_list.footer_levels, vec![3, 2]);

        let single = TransformConfig::from_json(json!({ "footer_levels": 2 })).unwrap();
        assert_eq!(single.footer_levels, vec![2]);
    }

    #[test]
    fn out_of_range_levels_are_dropped() {
        assert_eq!(parse_footer_levels("0,2,7,-1"), vec![2]);
        assert!(parse_footer_levels("").is_empty());
    }

    #[test]
    fn max_depth_is_clamped_and_zero_means_default() {
        let config = TransformConfig::from_json(json!({ "max_depth": 12 })).unwrap();
        assert_eq!(config.normalized().max_depth, 6);

        let config = TransformConfig::from_json(json!({ "max_depth": 0 })).unwrap();
        assert_eq!(config.normalized().max_depth, 4);

        let config = TransformConfig::from_json(json!({ "max_depth": 2 })).unwrap();
        assert_eq!(config.normalized().max_depth, 2);
    }

    #[test]
    fn normalized_repairs_hr_and_levels() {
        let config = TransformConfig {
            hr: String::new(),
            footer_levels: vec![9, 2, 2],
            ..TransformConfig::default()
        };
        let normalized = config.normalized();
        assert_eq!(normalized.hr, "---");
        assert_eq!(normalized.footer_levels, vec![2]);
    }

    #[test]
    fn wrong_types_are_reported() {
        let err = TransformConfig::from_json(json!({ "prettify_h1": "yes" })).unwrap_err();
        assert!(err.to_string().starts_with("invalid transform config"));
        assert!(TransformConfig::from_json(json!("defaults please")).is_err());
    }
}
