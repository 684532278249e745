use std::env;
use std::str::FromStr;

use anyhow::anyhow;
use serde::Deserialize;

use crate::error::{LibError, Result};
use crate::layout::LayoutConfig;

pub const ENV_LAYOUT_ORIGIN_X: &str = "DFLOW_LAYOUT_ORIGIN_X";
pub const ENV_LAYOUT_ORIGIN_Y: &str = "DFLOW_LAYOUT_ORIGIN_Y";
pub const ENV_LAYOUT_COLUMNS: &str = "DFLOW_LAYOUT_COLUMNS";
pub const ENV_LAYOUT_COLUMN_SPACING: &str = "DFLOW_LAYOUT_COLUMN_SPACING";
pub const ENV_LAYOUT_ROW_SPACING: &str = "DFLOW_LAYOUT_ROW_SPACING";
pub const ENV_MIRROR_DRAFTS: &str = "DFLOW_MIRROR_DRAFTS";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    pub layout: LayoutConfig,
    /// Mirror unsaved templates into the draft store after every edit.
    pub mirror_drafts: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            mirror_drafts: true,
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|err| {
            LibError::invalid("Editor configuration is malformed", anyhow!(err))
        })
    }

    /// Defaults overridden by any `DFLOW_*` variables present in the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let layout = &mut config.layout;
        override_with(&lookup, ENV_LAYOUT_ORIGIN_X, &mut layout.origin_x)?;
        override_with(&lookup, ENV_LAYOUT_ORIGIN_Y, &mut layout.origin_y)?;
        override_with(&lookup, ENV_LAYOUT_COLUMNS, &mut layout.columns)?;
        override_with(&lookup, ENV_LAYOUT_COLUMN_SPACING, &mut layout.column_spacing)?;
        override_with(&lookup, ENV_LAYOUT_ROW_SPACING, &mut layout.row_spacing)?;
        override_with(&lookup, ENV_MIRROR_DRAFTS, &mut config.mirror_drafts)?;
        Ok(config)
    }
}

fn override_with<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    slot: &mut T,
) -> Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(name) else {
        return Ok(());
    };
    *slot = raw.trim().parse().map_err(|err: T::Err| {
        LibError::invalid(
            "Editor configuration is malformed",
            anyhow!("{} has invalid value {:?}: {}", name, raw, err),
        )
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = EditorConfig::from_json_str(r#"{"layout": {"columns": 4}}"#)
            .expect("config should parse");
        assert_eq!(config.layout.columns, 4);
        assert_eq!(config.layout.origin_x, 500.0);
        assert!(config.mirror_drafts);
    }

    #[test]
    fn lookup_overrides_defaults() {
        let vars = HashMap::from([
            (ENV_LAYOUT_COLUMNS, "2"),
            (ENV_LAYOUT_ROW_SPACING, " 100.5 "),
            (ENV_MIRROR_DRAFTS, "false"),
        ]);
        let config = EditorConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
            .expect("config should load");
        assert_eq!(config.layout.columns, 2);
        assert_eq!(config.layout.row_spacing, 100.5);
        assert_eq!(config.layout.column_spacing, 320.0);
        assert!(!config.mirror_drafts);
    }

    #[test]
    fn lookup_rejects_malformed_values() {
        let err = EditorConfig::from_lookup(|name| {
            (name == ENV_LAYOUT_COLUMNS).then(|| "three".to_string())
        })
        .expect_err("non-numeric columns should fail");
        assert_eq!(err.public, "Editor configuration is malformed");
        assert!(err.source.to_string().contains(ENV_LAYOUT_COLUMNS));
    }
}
