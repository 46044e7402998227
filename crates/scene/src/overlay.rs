use serde::{Deserialize, Serialize};

pub use foundation::Chamber;

/// Metric shown by the heat-map fill.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OverlayMetric {
    #[default]
    Volume,
    Sentiment,
    Momentum,
    Legislative,
}

impl OverlayMetric {
    pub const ALL: [OverlayMetric; 4] = [
        OverlayMetric::Volume,
        OverlayMetric::Sentiment,
        OverlayMetric::Momentum,
        OverlayMetric::Legislative,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "volume" => Some(OverlayMetric::Volume),
            "sentiment" => Some(OverlayMetric::Sentiment),
            "momentum" => Some(OverlayMetric::Momentum),
            "legislative" => Some(OverlayMetric::Legislative),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OverlayMetric::Volume => "volume",
            OverlayMetric::Sentiment => "sentiment",
            OverlayMetric::Momentum => "momentum",
            OverlayMetric::Legislative => "legislative",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// Human label for a chamber, as used in district names.
pub fn chamber_label(chamber: Chamber) -> &'static str {
    match chamber {
        Chamber::House => "House",
        Chamber::Senate => "Senate",
    }
}

#[cfg(test)]
mod tests {
    use super::{OverlayMetric, Theme};

    #[test]
    fn parses_names_case_insensitively() {
        for m in OverlayMetric::ALL {
            assert_eq!(OverlayMetric::parse(&m.as_str().to_uppercase()), Some(m));
        }
        assert_eq!(OverlayMetric::parse("turnout"), None);
        assert_eq!(Theme::parse(" Dark "), Some(Theme::Dark));
        assert_eq!(Theme::default(), Theme::Light);
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&OverlayMetric::Legislative).expect("serialize");
        assert_eq!(json, "\"legislative\"");
        let theme: Theme = serde_json::from_str("\"dark\"").expect("deserialize");
        assert_eq!(theme, Theme::Dark);
    }
}
