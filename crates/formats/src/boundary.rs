use foundation::Aabb2;
use foundation::math::Vec2;
use serde_json::{Map, Value};

/// A closed ring of lon/lat (degrees) vertices; `x` is longitude, `y` latitude.
pub type Ring = Vec<Vec2>;

/// One polygon: the outer ring followed by any holes.
pub type Polygon = Vec<Ring>;

/// Areal geometry of a boundary feature. `Polygon` inputs become a single entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryGeometry {
    pub polygons: Vec<Polygon>,
}

impl BoundaryGeometry {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    pub fn is_empty(&self) -> bool {
        self.polygons
            .iter()
            .all(|p| p.first().is_none_or(|outer| outer.is_empty()))
    }

    /// All vertices of all rings, holes included.
    pub fn vertices(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.polygons
            .iter()
            .flat_map(|p| p.iter())
            .flat_map(|r| r.iter().copied())
    }

    /// Vertices of outer rings only; enough for extents and fitting.
    pub fn outer_vertices(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.polygons
            .iter()
            .filter_map(|p| p.first())
            .flat_map(|r| r.iter().copied())
    }

    pub fn bounds(&self) -> Aabb2 {
        Aabb2::from_points(self.outer_vertices())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    pub geometry: BoundaryGeometry,
}

/// Property keys that carry a human-readable region name, in preference order.
const NAME_KEYS: &[&str] = &["name", "NAME", "Name", "NAMELSAD"];

/// Property keys that carry a region identifier when the feature has no id.
const ID_KEYS: &[&str] = &["GEOID", "geoid", "id", "fips", "FIPS", "district", "DISTRICT"];

impl BoundaryFeature {
    /// The dataset's own name for this region, if present and non-blank.
    pub fn name(&self) -> Option<&str> {
        NAME_KEYS
            .iter()
            .filter_map(|k| self.properties.get(*k))
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .find(|s| !s.is_empty())
    }

    /// Feature id, or the first identifier-like property.
    pub fn identifier(&self) -> Option<String> {
        if let Some(id) = self.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            return Some(id.to_string());
        }
        ID_KEYS
            .iter()
            .filter_map(|k| self.properties.get(*k))
            .find_map(value_to_id)
    }
}

/// A decoded boundary document: every feature of one geometry collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryCollection {
    pub features: Vec<BoundaryFeature>,
}

#[derive(Debug)]
pub enum BoundaryError {
    Json(serde_json::Error),
    NotAFeatureCollection,
    InvalidFeature { index: usize, reason: String },
    Topology(crate::topology::TopologyError),
}

impl std::fmt::Display for BoundaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundaryError::Json(e) => write!(f, "JSON parse error: {e}"),
            BoundaryError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection or TopoJSON Topology")
            }
            BoundaryError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
            BoundaryError::Topology(e) => write!(f, "topology error: {e}"),
        }
    }
}

impl std::error::Error for BoundaryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BoundaryError::Json(e) => Some(e),
            BoundaryError::Topology(e) => Some(e),
            _ => None,
        }
    }
}

impl From<crate::topology::TopologyError> for BoundaryError {
    fn from(e: crate::topology::TopologyError) -> Self {
        BoundaryError::Topology(e)
    }
}

impl BoundaryCollection {
    /// Decodes either a GeoJSON `FeatureCollection` or a TopoJSON `Topology`.
    ///
    /// For topologies, `object` names the geometry collection to extract
    /// (`"states"`, `"counties"`, ...); `None` picks the first object.
    pub fn from_json_slice(bytes: &[u8], object: Option<&str>) -> Result<Self, BoundaryError> {
        let value: Value = serde_json::from_slice(bytes).map_err(BoundaryError::Json)?;
        Self::from_json_value(value, object)
    }

    pub fn from_json_value(value: Value, object: Option<&str>) -> Result<Self, BoundaryError> {
        match value.get("type").and_then(|v| v.as_str()) {
            Some("FeatureCollection") => Self::from_geojson_value(value),
            Some("Topology") => Ok(crate::topology::decode_topology(&value, object)?),
            _ => Err(BoundaryError::NotAFeatureCollection),
        }
    }

    pub fn from_geojson_value(value: Value) -> Result<Self, BoundaryError> {
        let obj = value
            .as_object()
            .ok_or(BoundaryError::NotAFeatureCollection)?;
        let ty = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(BoundaryError::NotAFeatureCollection)?;
        if ty != "FeatureCollection" {
            return Err(BoundaryError::NotAFeatureCollection);
        }

        let features_val = obj
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or(BoundaryError::NotAFeatureCollection)?;

        let mut features = Vec::with_capacity(features_val.len());
        for (index, feat_val) in features_val.iter().enumerate() {
            let feat_obj = feat_val
                .as_object()
                .ok_or(BoundaryError::InvalidFeature {
                    index,
                    reason: "feature must be an object".to_string(),
                })?;

            let feat_type = feat_obj.get("type").and_then(|v| v.as_str()).ok_or(
                BoundaryError::InvalidFeature {
                    index,
                    reason: "feature missing type".to_string(),
                },
            )?;
            if feat_type != "Feature" {
                return Err(BoundaryError::InvalidFeature {
                    index,
                    reason: format!("unexpected feature type: {feat_type}"),
                });
            }

            let id = feat_obj.get("id").and_then(value_to_id);

            let properties = feat_obj
                .get("properties")
                .and_then(|v| v.as_object())
                .cloned()
                .unwrap_or_default();

            let geometry = match feat_obj.get("geometry") {
                None | Some(Value::Null) => BoundaryGeometry::default(),
                Some(g) => parse_geometry(g)
                    .map_err(|reason| BoundaryError::InvalidFeature { index, reason })?,
            };

            features.push(BoundaryFeature {
                id,
                properties,
                geometry,
            });
        }

        Ok(Self { features })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Finds a feature by identifier.
    pub fn find(&self, id: &str) -> Option<&BoundaryFeature> {
        self.features
            .iter()
            .find(|f| f.identifier().as_deref() == Some(id))
    }

    /// Finds a feature by its dataset name, case-insensitively.
    pub fn find_by_name(&self, name: &str) -> Option<&BoundaryFeature> {
        self.features
            .iter()
            .find(|f| f.name().is_some_and(|n| n.eq_ignore_ascii_case(name)))
    }

    /// Lon/lat bounds of every feature in the collection.
    pub fn bounds(&self) -> Aabb2 {
        self.features
            .iter()
            .map(|f| f.geometry.bounds())
            .fold(Aabb2::empty(), |acc, b| acc.union(&b))
    }
}

pub(crate) fn value_to_id(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_geometry(value: &Value) -> Result<BoundaryGeometry, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;

    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates".to_string())?;

    match ty {
        "Polygon" => Ok(BoundaryGeometry::new(vec![parse_polygon(coords)?])),
        "MultiPolygon" => Ok(BoundaryGeometry::new(parse_multi_polygon(coords)?)),
        other => Err(format!("unsupported boundary geometry type: {other}")),
    }
}

fn parse_point(coords: &Value) -> Result<Vec2, String> {
    let arr = coords
        .as_array()
        .ok_or("position must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("position must have [lon, lat]".to_string());
    }
    let lon = arr[0].as_f64().ok_or("lon must be a number".to_string())?;
    let lat = arr[1].as_f64().ok_or("lat must be a number".to_string())?;
    Ok(Vec2::new(lon, lat))
}

fn parse_ring(coords: &Value) -> Result<Ring, String> {
    let arr = coords
        .as_array()
        .ok_or("ring must be an array".to_string())?;
    arr.iter().map(parse_point).collect()
}

fn parse_polygon(coords: &Value) -> Result<Polygon, String> {
    let rings = coords
        .as_array()
        .ok_or("Polygon coordinates must be an array of rings".to_string())?;
    rings.iter().map(parse_ring).collect()
}

fn parse_multi_polygon(coords: &Value) -> Result<Vec<Polygon>, String> {
    let polys = coords
        .as_array()
        .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
    polys.iter().map(parse_polygon).collect()
}

#[cfg(test)]
mod tests {
    use super::{BoundaryCollection, BoundaryError};
    use serde_json::json;

    fn counties() -> serde_json::Value {
        json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "id": "04013",
                    "properties": { "name": "Maricopa" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[-113.3, 32.5], [-111.0, 32.5], [-111.0, 34.0],
                         [-113.3, 34.0], [-113.3, 32.5]]]
                    }
                },
                {
                    "type": "Feature",
                    "id": 6037,
                    "properties": {},
                    "geometry": {
                        "type": "MultiPolygon",
                        "coordinates": [
                            [[[-118.9, 33.7], [-117.6, 33.7], [-117.6, 34.8],
                             [-118.9, 34.8], [-118.9, 33.7]]],
                            [[[-118.6, 33.3], [-118.3, 33.3], [-118.3, 33.5], [-118.6, 33.3]]]
                        ]
                    }
                },
                {
                    "type": "Feature",
                    "properties": { "GEOID": "04019", "NAME": "  " },
                    "geometry": null
                }
            ]
        })
    }

    #[test]
    fn parses_polygons_multipolygons_and_null_geometry() {
        let c = BoundaryCollection::from_json_value(counties(), None).expect("parse");
        assert_eq!(c.len(), 3);
        assert_eq!(c.features[0].geometry.polygons.len(), 1);
        assert_eq!(c.features[1].geometry.polygons.len(), 2);
        assert!(c.features[2].geometry.is_empty());
    }

    #[test]
    fn identifiers_and_names() {
        let c = BoundaryCollection::from_json_value(counties(), None).expect("parse");
        assert_eq!(c.features[0].identifier().as_deref(), Some("04013"));
        assert_eq!(c.features[0].name(), Some("Maricopa"));
        // Numeric ids are kept as written; padding is the caller's concern.
        assert_eq!(c.features[1].identifier().as_deref(), Some("6037"));
        assert_eq!(c.features[1].name(), None);
        assert_eq!(c.features[2].identifier().as_deref(), Some("04019"));
        assert_eq!(c.features[2].name(), None);
        assert!(c.find("04013").is_some());
        assert!(c.find_by_name("maricopa").is_some());
    }

    #[test]
    fn bounds_cover_all_outer_rings() {
        let c = BoundaryCollection::from_json_value(counties(), None).expect("parse");
        let b = c.bounds();
        assert_eq!(b.min, [-118.9, 32.5]);
        assert_eq!(b.max, [-111.0, 34.8]);
    }

    #[test]
    fn rejects_non_collections_and_html() {
        let err = BoundaryCollection::from_json_slice(b"<html>Not Found</html>", None).unwrap_err();
        assert!(matches!(err, BoundaryError::Json(_)));

        let err =
            BoundaryCollection::from_json_value(json!({ "type": "Feature" }), None).unwrap_err();
        assert!(matches!(err, BoundaryError::NotAFeatureCollection));
    }

    #[test]
    fn rejects_point_geometry_in_boundary_file() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Point", "coordinates": [0.0, 0.0] }
            }]
        });
        let err = BoundaryCollection::from_json_value(doc, None).unwrap_err();
        assert!(matches!(err, BoundaryError::InvalidFeature { index: 0, .. }));
    }
}
