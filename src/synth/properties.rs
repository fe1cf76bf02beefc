//! Target properties of the synthesized net.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown property '{0}'")]
pub struct PropertyParseError(String);

/// Which class of nets synthesis should aim for. Immutable by convention:
/// build one up front, hand it to the builder.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PNProperties {
    pub pure: bool,
    pub plain: bool,
    pub t_net: bool,
    pub output_nonbranching: bool,
    pub conflict_free: bool,
    pub k_bounded: Option<u64>,
}

impl PNProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pure(mut self) -> Self {
        self.pure = true;
        self
    }

    pub fn plain(mut self) -> Self {
        self.plain = true;
        self
    }

    pub fn t_net(mut self) -> Self {
        self.t_net = true;
        self
    }

    pub fn output_nonbranching(mut self) -> Self {
        self.output_nonbranching = true;
        self
    }

    pub fn conflict_free(mut self) -> Self {
        self.conflict_free = true;
        self
    }

    pub fn k_bounded(mut self, k: u64) -> Self {
        self.k_bounded = Some(k);
        self
    }

    /// 1-bounded.
    pub fn safe(self) -> Self {
        self.k_bounded(1)
    }

    pub fn is_safe(&self) -> bool {
        self.k_bounded == Some(1)
    }

    /// No constraints at all.
    pub fn is_trivial(&self) -> bool {
        *self == Self::default()
    }

    /// Parse a comma separated option list: `pure`, `plain`, `tnet`, `on`,
    /// `cf`, `safe`, `3-bounded`, `none`.
    pub fn parse(options: &str) -> Result<Self, PropertyParseError> {
        let mut properties = Self::default();
        for option in options
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            match option {
                "none" => {}
                "pure" => properties.pure = true,
                "plain" => properties.plain = true,
                "tnet" => properties.t_net = true,
                "output-nonbranching" | "on" => properties.output_nonbranching = true,
                "conflict-free" | "cf" => properties.conflict_free = true,
                "safe" => properties.k_bounded = Some(1),
                other => {
                    let bound = other
                        .strip_suffix("-bounded")
                        .and_then(|k| k.parse::<u64>().ok());
                    match bound {
                        Some(k) => properties.k_bounded = Some(k),
                        None => return Err(PropertyParseError(other.to_owned())),
                    }
                }
            }
        }
        Ok(properties)
    }
}

impl fmt::Display for PNProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut options = Vec::new();
        if self.pure {
            options.push("pure".to_owned());
        }
        if self.plain {
            options.push("plain".to_owned());
        }
        if self.t_net {
            options.push("tnet".to_owned());
        }
        if self.output_nonbranching {
            options.push("output-nonbranching".to_owned());
        }
        if self.conflict_free {
            options.push("conflict-free".to_owned());
        }
        match self.k_bounded {
            Some(1) => options.push("safe".to_owned()),
            Some(k) => options.push(format!("{}-bounded", k)),
            None => {}
        }
        if options.is_empty() {
            options.push("none".to_owned());
        }
        f.write_str(&options.join(","))
    }
}
