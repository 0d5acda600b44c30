use serde::{Deserialize, Serialize};

use crate::error::{StreamError, StreamResult};

/// What a container Start header's length field counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerLength {
    /// Everything between the Start header and the matching End header: the
    /// container's own fields plus every encoded child.
    Extent,
    /// Only the container's own fields; children are delimited by the End
    /// header alone. This is the MS-FSSHTTPB wire rule.
    OwnFields,
}

/// Configuration shared by the decoder and encoder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// How container lengths are declared and checked.
    pub container_length: ContainerLength,
    /// Keep single objects with unregistered type tags as opaque records.
    /// When `false` they fail the decode with `UnknownLeafType`.
    pub skip_unknown_leaves: bool,
    /// Maximum container nesting depth.
    pub max_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            container_length: ContainerLength::Extent,
            skip_unknown_leaves: true,
            max_depth: 64,
        }
    }
}

impl CodecConfig {
    /// Configuration matching MS-FSSHTTPB streams as written by Office.
    pub fn fsshttpb() -> Self {
        Self {
            container_length: ContainerLength::OwnFields,
            ..Default::default()
        }
    }

    /// Reject unknown leaves instead of skipping them.
    pub fn strict() -> Self {
        Self {
            skip_unknown_leaves: false,
            ..Default::default()
        }
    }

    /// Parse from TOML. Missing keys take their default values.
    pub fn from_toml_str(s: &str) -> StreamResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| StreamError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> StreamResult<()> {
        if self.max_depth == 0 {
            return Err(StreamError::InvalidConfig("max_depth must be at least 1".into()));
        }
        Ok(())
    }
}
