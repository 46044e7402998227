/// A US state (or DC) as addressed by the boundary datasets.
///
/// `fips` is the two-digit code used as the feature id in state boundary files
/// and as the prefix of every five-digit county code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct StateCode {
    pub name: &'static str,
    pub abbr: &'static str,
    pub fips: &'static str,
}

const fn st(name: &'static str, abbr: &'static str, fips: &'static str) -> StateCode {
    StateCode { name, abbr, fips }
}

pub const STATES: &[StateCode] = &[
    st("Alabama", "AL", "01"),
    st("Alaska", "AK", "02"),
    st("Arizona", "AZ", "04"),
    st("Arkansas", "AR", "05"),
    st("California", "CA", "06"),
    st("Colorado", "CO", "08"),
    st("Connecticut", "CT", "09"),
    st("Delaware", "DE", "10"),
    st("District of Columbia", "DC", "11"),
    st("Florida", "FL", "12"),
    st("Georgia", "GA", "13"),
    st("Hawaii", "HI", "15"),
    st("Idaho", "ID", "16"),
    st("Illinois", "IL", "17"),
    st("Indiana", "IN", "18"),
    st("Iowa", "IA", "19"),
    st("Kansas", "KS", "20"),
    st("Kentucky", "KY", "21"),
    st("Louisiana", "LA", "22"),
    st("Maine", "ME", "23"),
    st("Maryland", "MD", "24"),
    st("Massachusetts", "MA", "25"),
    st("Michigan", "MI", "26"),
    st("Minnesota", "MN", "27"),
    st("Mississippi", "MS", "28"),
    st("Missouri", "MO", "29"),
    st("Montana", "MT", "30"),
    st("Nebraska", "NE", "31"),
    st("Nevada", "NV", "32"),
    st("New Hampshire", "NH", "33"),
    st("New Jersey", "NJ", "34"),
    st("New Mexico", "NM", "35"),
    st("New York", "NY", "36"),
    st("North Carolina", "NC", "37"),
    st("North Dakota", "ND", "38"),
    st("Ohio", "OH", "39"),
    st("Oklahoma", "OK", "40"),
    st("Oregon", "OR", "41"),
    st("Pennsylvania", "PA", "42"),
    st("Rhode Island", "RI", "44"),
    st("South Carolina", "SC", "45"),
    st("South Dakota", "SD", "46"),
    st("Tennessee", "TN", "47"),
    st("Texas", "TX", "48"),
    st("Utah", "UT", "49"),
    st("Vermont", "VT", "50"),
    st("Virginia", "VA", "51"),
    st("Washington", "WA", "53"),
    st("West Virginia", "WV", "54"),
    st("Wisconsin", "WI", "55"),
    st("Wyoming", "WY", "56"),
];

impl StateCode {
    /// Resolves a state by name, postal abbreviation, or FIPS code.
    ///
    /// Names and abbreviations match case-insensitively; a one-digit FIPS
    /// code is zero-padded before lookup.
    pub fn resolve(key: &str) -> Option<StateCode> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        if key.bytes().all(|b| b.is_ascii_digit()) {
            let fips = pad_fips(key, 2);
            return STATES.iter().copied().find(|s| s.fips == fips);
        }
        STATES
            .iter()
            .copied()
            .find(|s| s.name.eq_ignore_ascii_case(key) || s.abbr.eq_ignore_ascii_case(key))
    }

    pub fn by_fips(fips: &str) -> Option<StateCode> {
        let fips = pad_fips(fips, 2);
        STATES.iter().copied().find(|s| s.fips == fips)
    }
}

/// Left-pads a numeric FIPS identifier with zeros up to `width` digits.
///
/// Boundary files frequently store county ids as numbers, which drops the
/// leading zero of states like Alabama (`1001` instead of `01001`).
pub fn pad_fips(raw: &str, width: usize) -> String {
    let raw = raw.trim();
    if raw.len() >= width {
        raw.to_string()
    } else {
        format!("{raw:0>width$}")
    }
}

/// True when the five-digit `county_fips` belongs to the state `state_fips`.
pub fn county_in_state(county_fips: &str, state_fips: &str) -> bool {
    let county = pad_fips(county_fips, 5);
    let state = pad_fips(state_fips, 2);
    county.len() == 5 && county.starts_with(state.as_str())
}

/// State-legislative chamber whose district layer is active.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Chamber {
    #[default]
    House,
    Senate,
}

impl Chamber {
    pub const ALL: [Chamber; 2] = [Chamber::House, Chamber::Senate];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "house" | "lower" | "sldl" | "assembly" => Some(Chamber::House),
            "senate" | "upper" | "sldu" => Some(Chamber::Senate),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Chamber::House => "house",
            Chamber::Senate => "senate",
        }
    }
}
