/*!
 * Narration request: perspective, style and audience.
 */

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::errors::NarrationError;

/// Whose voice the narration is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrationMode {
    /// Objective, analytical narrator outside the story
    #[default]
    ThirdPerson,
    /// First-person narration as a named character
    Character,
}

/// Tone of the narration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrationStyle {
    #[default]
    Professional,
    Humorous,
    Emotional,
    Suspenseful,
    Casual,
    Dramatic,
}

/// Intended audience of the narration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetAudience {
    #[default]
    General,
    Young,
    Professional,
    Children,
}

impl NarrationStyle {
    pub const ALL: [NarrationStyle; 6] = [
        Self::Professional,
        Self::Humorous,
        Self::Emotional,
        Self::Suspenseful,
        Self::Casual,
        Self::Dramatic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Humorous => "humorous",
            Self::Emotional => "emotional",
            Self::Suspenseful => "suspenseful",
            Self::Casual => "casual",
            Self::Dramatic => "dramatic",
        }
    }
}

impl TargetAudience {
    pub const ALL: [TargetAudience; 4] = [Self::General, Self::Young, Self::Professional, Self::Children];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Young => "young",
            Self::Professional => "professional",
            Self::Children => "children",
        }
    }
}

impl fmt::Display for NarrationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TargetAudience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NarrationStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let lowered = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == lowered)
            .ok_or_else(|| anyhow!("Invalid narration style: {}", s))
    }
}

impl FromStr for TargetAudience {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let lowered = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|audience| audience.as_str() == lowered)
            .ok_or_else(|| anyhow!("Invalid target audience: {}", s))
    }
}

/// What kind of narration to produce
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NarrationRequest {
    pub mode: NarrationMode,
    /// Required and non-empty when `mode` is `Character`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_name: Option<String>,
    #[serde(default)]
    pub style: NarrationStyle,
    #[serde(default)]
    pub target_audience: TargetAudience,
}

impl NarrationRequest {
    /// Objective third-person narration
    pub fn third_person(style: NarrationStyle, target_audience: TargetAudience) -> Self {
        Self {
            mode: NarrationMode::ThirdPerson,
            character_name: None,
            style,
            target_audience,
        }
    }

    /// First-person narration as `name`
    pub fn character(name: impl Into<String>, style: NarrationStyle, target_audience: TargetAudience) -> Self {
        Self {
            mode: NarrationMode::Character,
            character_name: Some(name.into()),
            style,
            target_audience,
        }
    }

    /// Character name when in character mode and the name is usable
    pub fn narrator(&self) -> Option<&str> {
        match self.mode {
            NarrationMode::Character => self
                .character_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty()),
            NarrationMode::ThirdPerson => None,
        }
    }

    /// Check the character-name invariant
    pub fn validate(&self) -> Result<(), NarrationError> {
        if self.mode == NarrationMode::Character && self.narrator().is_none() {
            return Err(NarrationError::InvalidRequest(
                "character mode requires a non-empty character_name".to_string(),
            ));
        }
        Ok(())
    }

    /// Same style and audience, third-person voice
    pub fn as_third_person(&self) -> Self {
        Self::third_person(self.style, self.target_audience)
    }
}
