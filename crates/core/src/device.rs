//! Device classification from user-agent strings.
//!
//! Rules are evaluated top-down; the first match wins. Mobile tokens are
//! checked before the desktop fallback because most mobile user agents also
//! carry "Mozilla" and "Safari".

use serde::{Deserialize, Serialize};

/// Device category reported on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    Desktop,
    Mobile,
    Tablet,
    Unknown,
}

impl DeviceType {
    pub const ALL: [DeviceType; 4] = [Self::Desktop, Self::Mobile, Self::Tablet, Self::Unknown];

    /// Inverse of [`as_str`](Self::as_str).
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "Desktop",
            Self::Mobile => "Mobile",
            Self::Tablet => "Tablet",
            Self::Unknown => "Unknown",
        }
    }
}

/// A single classification rule: any token present (case-insensitive) selects `device`.
#[derive(Debug, Clone, Copy)]
pub struct DeviceRule {
    pub device: DeviceType,
    pub tokens: &'static [&'static str],
}

impl DeviceRule {
    /// `user_agent` must already be lowercased.
    pub fn matches(&self, user_agent: &str) -> bool {
        self.tokens.iter().any(|token| user_agent.contains(token))
    }
}

/// Classification rules in precedence order.
pub const DEVICE_RULES: [DeviceRule; 3] = [
    DeviceRule {
        device: DeviceType::Mobile,
        tokens: &["mobile", "android", "iphone"],
    },
    DeviceRule {
        device: DeviceType::Tablet,
        tokens: &["tablet", "ipad"],
    },
    DeviceRule {
        device: DeviceType::Desktop,
        tokens: &["mozilla", "chrome", "safari"],
    },
];

/// Classify a user agent using [`DEVICE_RULES`].
pub fn classify_user_agent(user_agent: Option<&str>) -> DeviceType {
    let Some(ua) = user_agent.map(str::trim).filter(|ua| !ua.is_empty()) else {
        return DeviceType::Unknown;
    };
    let ua = ua.to_lowercase();

    DEVICE_RULES
        .iter()
        .find(|rule| rule.matches(&ua))
        .map(|rule| rule.device)
        .unwrap_or(DeviceType::Unknown)
}
