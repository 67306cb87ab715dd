//! Settings of doubles and their loading from files and environment.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::StdResult;

/// Prefix of the environment variables read by [Configuration::load].
pub const ENVIRONMENT_PREFIX: &str = "UNDERSTUDY";

/// How a double answers a call without matching stub rule.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DefaultAnswer {
    /// Return the `Default` value of the return type.
    #[default]
    ReturnsDefaults,

    /// Return the `Default` value of the return type, warning about each placeholder
    /// handed out.
    ReturnsSmartNulls,

    /// Fail the call.
    Strict,

    /// Delegate to the real instance.
    CallsRealMethods,
}

/// Settings of one double.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoubleSettings {
    /// Display name, defaults to `<interface>#<id>`
    pub name: Option<String>,

    /// Answer given to unstubbed calls
    pub default_answer: DefaultAnswer,
}

impl DoubleSettings {
    /// Set the display name of the double.
    pub fn with_name<T: Into<String>>(mut self, name: T) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the answer given to unstubbed calls.
    pub fn with_default_answer(mut self, default_answer: DefaultAnswer) -> Self {
        self.default_answer = default_answer;
        self
    }
}

/// Registry wide configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Answer given to unstubbed calls by doubles created without explicit settings
    #[serde(default)]
    pub default_answer: DefaultAnswer,

    /// Make every double strict, whatever `default_answer` says
    #[serde(default)]
    pub strict: bool,
}

impl Configuration {
    /// Load the configuration from an optional file (json, toml, yaml, ...) and the
    /// `UNDERSTUDY_*` environment variables, the latter taking precedence.
    pub fn load(file: Option<&Path>) -> StdResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder
            .add_source(config::Environment::with_prefix(ENVIRONMENT_PREFIX))
            .build()
            .with_context(|| "configuration build error")?
            .try_deserialize()
            .with_context(|| "configuration deserialize error")
    }

    /// Settings given to doubles created without explicit settings.
    pub fn double_settings(&self) -> DoubleSettings {
        let default_answer = if self.strict {
            DefaultAnswer::Strict
        } else {
            self.default_answer
        };

        DoubleSettings::default().with_default_answer(default_answer)
    }
}
