//! Road and node attribute types shared by the graph, embedding, and
//! environment crates.

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighwayClass {
    Motorway,
    MotorwayLink,
    Trunk,
    TrunkLink,
    Primary,
    PrimaryLink,
    Secondary,
    SecondaryLink,
    Tertiary,
    TertiaryLink,
    Residential,
    LivingStreet,
    Unclassified,
    Service,
}

impl HighwayClass {
    /// Hierarchy code, 0 (lowest) to 6 (motorway). Mirrors the OSM highway
    /// tag hierarchy used to rank road importance.
    pub fn hierarchy_code(self) -> u8 {
        use HighwayClass::*;
        match self {
            Motorway => 6,
            MotorwayLink | Trunk => 5,
            TrunkLink | Primary => 4,
            PrimaryLink | Secondary => 3,
            SecondaryLink | Tertiary => 2,
            TertiaryLink | Residential | LivingStreet => 1,
            Unclassified | Service => 0,
        }
    }

    /// Hierarchy code normalized to `[0, 1]`.
    pub fn hierarchy_norm(self) -> f64 {
        f64::from(self.hierarchy_code()) / 6.0
    }

    /// Parses an OSM `highway=*` tag value, case-insensitively. Unknown
    /// values fall back to `Unclassified` the way the embedding builder's
    /// default-0 lookup does.
    pub fn parse(tag: &str) -> HighwayClass {
        use HighwayClass::*;
        match tag.to_ascii_lowercase().as_str() {
            "motorway" => Motorway,
            "motorway_link" => MotorwayLink,
            "trunk" => Trunk,
            "trunk_link" => TrunkLink,
            "primary" => Primary,
            "primary_link" => PrimaryLink,
            "secondary" => Secondary,
            "secondary_link" => SecondaryLink,
            "tertiary" => Tertiary,
            "tertiary_link" => TertiaryLink,
            "residential" => Residential,
            "living_street" => LivingStreet,
            "service" => Service,
            _ => Unclassified,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    Paved,
    PavingStones,
    Cobblestone,
    Compacted,
    Gravel,
    Unpaved,
    Dirt,
    Sand,
    Ground,
    Grass,
    Unknown,
}

impl Surface {
    /// Quality score in `[0, 1]`, higher is better. `Unknown` defaults to
    /// 0.5 (medium quality), matching the Python builder's behavior when a
    /// `surface` tag is missing rather than merely unrecognized.
    pub fn score(self) -> f64 {
        use Surface::*;
        match self {
            Paved => 1.0,
            PavingStones => 0.9,
            Cobblestone => 0.8,
            Compacted => 0.7,
            Gravel => 0.6,
            Unpaved => 0.5,
            Dirt => 0.4,
            Sand => 0.3,
            Ground => 0.3,
            Grass => 0.2,
            Unknown => 0.5,
        }
    }

    pub fn parse(tag: &str) -> Surface {
        use Surface::*;
        match tag.to_ascii_lowercase().as_str() {
            "paved" | "asphalt" | "concrete" => Paved,
            "paving_stones" => PavingStones,
            "cobblestone" => Cobblestone,
            "compacted" => Compacted,
            "gravel" => Gravel,
            "unpaved" => Unpaved,
            "dirt" => Dirt,
            "sand" => Sand,
            "ground" => Ground,
            "grass" => Grass,
            _ => Unknown,
        }
    }
}

/// A `maxspeed` tag value as it arrives from the source data: either
/// already numeric (assumed km/h) or a string like `"50"`, `"50 km/h"`,
/// or `"30 mph"` that needs parsing before it's usable.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum MaxSpeed {
    Numeric(f64),
    Tagged(String),
}

impl MaxSpeed {
    /// Resolves to a km/h value, parsing `Tagged` strings by stripping
    /// `"km/h"`/`"mph"` suffixes and taking the first numeric token —
    /// `"50 km/h"` and `"50mph"` both resolve to `50.0` (the unit suffix is
    /// dropped, not converted, matching the source data's own convention).
    /// Returns `None` if no numeric token is present.
    pub fn parse_kmh(&self) -> Option<f64> {
        match self {
            MaxSpeed::Numeric(v) => Some(*v),
            MaxSpeed::Tagged(s) => {
                let cleaned = s.to_ascii_lowercase().replace("km/h", "").replace("mph", "");
                cleaned.split_whitespace().find_map(|tok| tok.parse::<f64>().ok())
            }
        }
    }
}

/// Geographic node position. Coordinates are kept in whatever projection
/// the caller loaded the graph in; the embedding builder normalizes them
/// per-graph and never assumes WGS84 degrees.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeAttrs {
    pub x: f64,
    pub y: f64,
}

/// Attributes of one directed road segment.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeAttrs {
    pub length_m: f64,
    pub maxspeed: Option<MaxSpeed>,
    pub lanes: Option<f64>,
    pub highway: HighwayClass,
    pub surface: Surface,
    pub oneway: bool,
    /// Precomputed travel time in seconds, when the source data already
    /// carries one (mirrors osmnx's `travel_time` attribute precedence).
    pub travel_time_s: Option<f64>,
    /// Precomputed average speed in km/h (osmnx `speed_kph`), consulted
    /// ahead of `maxspeed` when deriving travel time.
    pub speed_kph: Option<f64>,
}

impl EdgeAttrs {
    /// `maxspeed` resolved to a km/h value, parsing a `Tagged` string if
    /// present. `None` if the attribute is absent or unparseable.
    pub fn maxspeed_kmh(&self) -> Option<f64> {
        self.maxspeed.as_ref().and_then(MaxSpeed::parse_kmh)
    }

    /// Travel time in seconds, following the precedence chain: explicit
    /// `travel_time_s`, then `speed_kph`, then parsed `maxspeed`, then
    /// `default_speed_kmh`.
    pub fn travel_time(&self, default_speed_kmh: f64) -> f64 {
        if let Some(t) = self.travel_time_s {
            return t;
        }
        if let Some(speed_kph) = self.speed_kph {
            let speed_ms = speed_kph / 3.6;
            return if speed_ms > 0.0 { self.length_m / speed_ms } else { 0.0 };
        }
        let speed_kmh = self.maxspeed_kmh().unwrap_or(default_speed_kmh);
        let speed_ms = speed_kmh / 3.6;
        if speed_ms > 0.0 {
            self.length_m / speed_ms
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_maxspeed_passes_through() {
        assert_eq!(MaxSpeed::Numeric(50.0).parse_kmh(), Some(50.0));
    }

    #[test]
    fn tagged_maxspeed_strips_kmh_suffix() {
        assert_eq!(MaxSpeed::Tagged("50 km/h".to_string()).parse_kmh(), Some(50.0));
    }

    #[test]
    fn tagged_maxspeed_strips_mph_suffix_without_converting() {
        assert_eq!(MaxSpeed::Tagged("30mph".to_string()).parse_kmh(), Some(30.0));
    }

    #[test]
    fn bare_numeric_string_parses() {
        assert_eq!(MaxSpeed::Tagged("50".to_string()).parse_kmh(), Some(50.0));
    }

    #[test]
    fn unparseable_tag_returns_none() {
        assert_eq!(MaxSpeed::Tagged("signals".to_string()).parse_kmh(), None);
    }

    #[test]
    fn edge_attrs_prefer_parsed_maxspeed_over_default() {
        let attrs = EdgeAttrs {
            length_m: 100.0,
            maxspeed: Some(MaxSpeed::Tagged("36 km/h".to_string())),
            lanes: None,
            highway: HighwayClass::Residential,
            surface: Surface::Paved,
            oneway: false,
            travel_time_s: None,
            speed_kph: None,
        };
        // 36 km/h = 10 m/s, so 100m takes 10s.
        assert!((attrs.travel_time(50.0) - 10.0).abs() < 1e-9);
    }
}
