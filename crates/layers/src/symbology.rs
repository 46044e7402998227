use scene::Theme;
use serde::{Serialize, Serializer};

/// Bucket edges for heat-map scores.
pub const SCORE_THRESHOLDS: [f64; 7] = [0.0, 25.0, 40.0, 55.0, 70.0, 85.0, 100.0];

pub const BUCKET_COUNT: usize = SCORE_THRESHOLDS.len() - 1;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn from_hex(hex: u32) -> Self {
        Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    pub fn to_rgba_f32(self, alpha: f32) -> [f32; 4] {
        [
            f32::from(self.0) / 255.0,
            f32::from(self.1) / 255.0,
            f32::from(self.2) / 255.0,
            alpha,
        ]
    }

    /// Relative luminance (Rec. 709 weights, gamma-encoded), in `[0, 1]`.
    pub fn luminance(self) -> f64 {
        (0.2126 * f64::from(self.0) + 0.7152 * f64::from(self.1) + 0.0722 * f64::from(self.2))
            / 255.0
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.hex())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    /// Pale-to-saturated, one color per bucket.
    pub buckets: [Rgb; BUCKET_COUNT],
    pub no_data: Rgb,
}

pub const LIGHT_PALETTE: Palette = Palette {
    buckets: [
        Rgb::from_hex(0xfee5d9),
        Rgb::from_hex(0xfcbba1),
        Rgb::from_hex(0xfc9272),
        Rgb::from_hex(0xfb6a4a),
        Rgb::from_hex(0xde2d26),
        Rgb::from_hex(0xa50f15),
    ],
    no_data: Rgb::from_hex(0xe5e7eb),
};

pub const DARK_PALETTE: Palette = Palette {
    buckets: [
        Rgb::from_hex(0x3b1f2b),
        Rgb::from_hex(0x5c2a3a),
        Rgb::from_hex(0x8a3346),
        Rgb::from_hex(0xb8404f),
        Rgb::from_hex(0xe0555a),
        Rgb::from_hex(0xff7a6b),
    ],
    no_data: Rgb::from_hex(0x374151),
};

pub fn palette(theme: Theme) -> &'static Palette {
    match theme {
        Theme::Light => &LIGHT_PALETTE,
        Theme::Dark => &DARK_PALETTE,
    }
}

/// Bucket of a score, or `None` for absent, zero, or non-finite scores.
///
/// Scores above 100 land in the top bucket.
pub fn bucket_index(score: Option<f64>) -> Option<usize> {
    let s = score.filter(|s| s.is_finite() && *s > 0.0)?;
    let s = s.min(100.0);
    let idx = SCORE_THRESHOLDS[1..BUCKET_COUNT]
        .iter()
        .take_while(|edge| s >= **edge)
        .count();
    Some(idx)
}

/// Fill color for a score under a theme.
pub fn get_color(score: Option<f64>, theme: Theme) -> Rgb {
    let p = palette(theme);
    match bucket_index(score) {
        Some(i) => p.buckets[i],
        None => p.no_data,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub min: f64,
    pub max: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Legend {
    pub entries: Vec<LegendEntry>,
    pub no_data: Rgb,
}

pub fn legend(theme: Theme) -> Legend {
    let p = palette(theme);
    Legend {
        entries: SCORE_THRESHOLDS
            .windows(2)
            .zip(p.buckets)
            .map(|(edge, color)| LegendEntry {
                min: edge[0],
                max: edge[1],
                color,
            })
            .collect(),
        no_data: p.no_data,
    }
}

/// Fill and outline of one rendered region.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RegionStyle {
    pub fill: [f32; 4],
    pub stroke: [f32; 4],
    pub stroke_width: f32,
}

impl RegionStyle {
    pub fn for_score(score: Option<f64>, theme: Theme, selected: bool) -> Self {
        let stroke = match (theme, selected) {
            (_, true) => Rgb::from_hex(0x2563eb),
            (Theme::Light, false) => Rgb::from_hex(0xffffff),
            (Theme::Dark, false) => Rgb::from_hex(0x111827),
        };
        Self {
            fill: get_color(score, theme).to_rgba_f32(1.0),
            stroke: stroke.to_rgba_f32(1.0),
            stroke_width: if selected { 2.0 } else { 0.5 },
        }
    }
}
