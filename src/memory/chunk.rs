use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound of the heat scale.
pub const MAX_HEAT: u8 = 100;
/// Lowest heat that classifies as `Tier::Vow`.
pub const VOW_THRESHOLD: u8 = 80;
/// Lowest heat that classifies as `Tier::Temper`.
pub const TEMPER_THRESHOLD: u8 = 30;

/// Heat band a chunk currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Vow,
    Temper,
    Quench,
}

impl Tier {
    /// Classifies a heat value. Every path that changes heat goes through here.
    pub fn for_heat(heat: u8) -> Self {
        if heat >= VOW_THRESHOLD {
            Tier::Vow
        } else if heat >= TEMPER_THRESHOLD {
            Tier::Temper
        } else {
            Tier::Quench
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Vow => "vow",
            Tier::Temper => "temper",
            Tier::Quench => "quench",
        }
    }
}

impl Default for Tier {
    fn default() -> Self {
        Tier::Temper
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who spoke a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Unknown,
}

impl Role {
    /// Maps the speaker labels emitted by the page extractors onto a role.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "user" | "human" => Role::User,
            "assistant" | "model" | "ai" | "bot" | "claude" | "chatgpt" | "gemini" | "grok" => {
                Role::Assistant
            }
            _ => Role::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lexical valence of a chunk's text, stored as -1, 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

impl Sentiment {
    pub fn value(self) -> i8 {
        match self {
            Sentiment::Negative => -1,
            Sentiment::Neutral => 0,
            Sentiment::Positive => 1,
        }
    }
}

impl From<Sentiment> for i8 {
    fn from(sentiment: Sentiment) -> i8 {
        sentiment.value()
    }
}

impl TryFrom<i8> for Sentiment {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Sentiment::Negative),
            0 => Ok(Sentiment::Neutral),
            1 => Ok(Sentiment::Positive),
            other => Err(format!("sentiment must be -1, 0 or 1, got {}", other)),
        }
    }
}

/// Caller-supplied part of a chunk. Heat and tier are owned by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFields {
    pub text: String,
    pub role: Role,
    pub sentiment: Sentiment,
    pub created_at: i64,
}

impl ChunkFields {
    pub fn new(text: impl Into<String>, role: Role, sentiment: Sentiment, created_at: i64) -> Self {
        Self {
            text: text.into(),
            role,
            sentiment,
            created_at,
        }
    }
}

/// A stored unit of conversation text plus its decay metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    key: String,
    text: String,
    role: Role,
    sentiment: Sentiment,
    heat: u8,
    tier: Tier,
    created_at: i64, // epoch milliseconds
}

impl Chunk {
    /// Builds a chunk at the given starting heat and tier.
    pub(crate) fn create(key: String, fields: ChunkFields, heat: u8, tier: Tier) -> Self {
        Self {
            key,
            text: fields.text,
            role: fields.role,
            sentiment: fields.sentiment,
            heat: heat.min(MAX_HEAT),
            tier,
            created_at: fields.created_at,
        }
    }

    // Getters
    pub fn key(&self) -> &str { &self.key }
    pub fn text(&self) -> &str { &self.text }
    pub fn role(&self) -> Role { self.role }
    pub fn sentiment(&self) -> Sentiment { self.sentiment }
    pub fn heat(&self) -> u8 { self.heat }
    pub fn tier(&self) -> Tier { self.tier }
    pub fn created_at(&self) -> i64 { self.created_at }

    /// Raises heat by `amount`, saturating at `MAX_HEAT`.
    pub(crate) fn warm(&mut self, amount: u32) {
        let heated = (self.heat as u32).saturating_add(amount).min(MAX_HEAT as u32);
        self.set_heat(heated as u8);
    }

    /// Lowers heat by `amount`, saturating at zero.
    pub(crate) fn cool(&mut self, amount: u32) {
        let cooled = (self.heat as u32).saturating_sub(amount);
        self.set_heat(cooled as u8);
    }

    /// Heat is on the scale and the tier matches it.
    pub(crate) fn is_consistent(&self) -> bool {
        self.heat <= MAX_HEAT && self.tier == Tier::for_heat(self.heat)
    }

    pub fn is_cold(&self) -> bool {
        self.heat == 0
    }

    fn set_heat(&mut self, heat: u8) {
        self.heat = heat;
        self.tier = Tier::for_heat(heat);
    }
}
