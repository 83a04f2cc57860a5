use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::layout::LayoutMode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseConfig {
    /// How many tokens an ambiguous alternative may be tried on before the best one is chosen.
    pub backtrack_limit: usize,
    /// Layout applied by the text entry points. Ignored by [`crate::parse_tokens`].
    pub layout: LayoutMode,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            backtrack_limit: 32,
            layout: LayoutMode::Module,
        }
    }
}

impl ParseConfig {
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let config: ParseConfig = serde_json::from_str(text)
            .map_err(|err| Error::InvalidConfig(err.to_string().into()))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies the keys present in `v`, leaving the others untouched.
    pub fn update(&mut self, mut v: Value) -> Result<(), Error> {
        let mut updated = self.clone();
        if let Some(limit) = v.pointer_mut("/backtrackLimit") {
            let Ok(limit) = serde_json::from_value::<usize>(limit.take()) else {
                return Err(Error::InvalidConfig("invalid value of backtrackLimit".into()));
            };
            updated.backtrack_limit = limit;
        }
        if let Some(layout) = v.pointer_mut("/layout") {
            let Ok(layout) = serde_json::from_value::<LayoutMode>(layout.take()) else {
                return Err(Error::InvalidConfig("invalid value of layout".into()));
            };
            updated.layout = layout;
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    fn validate(&self) -> Result<(), Error> {
        if self.backtrack_limit == 0 {
            return Err(Error::InvalidConfig("backtrackLimit must be at least 1".into()));
        }
        Ok(())
    }
}
