//! TopoJSON decoding.
//!
//! A topology stores shared borders once as arcs; polygons reference arcs by
//! index, with `~i` (that is, `-i - 1`) meaning arc `i` traversed in reverse.
//! Quantized topologies carry a `transform` and delta-encode each arc.

use foundation::math::Vec2;
use serde_json::{Map, Value};

use crate::boundary::{
    BoundaryCollection, BoundaryFeature, BoundaryGeometry, Polygon, Ring, value_to_id,
};

#[derive(Debug, Clone, PartialEq)]
pub enum TopologyError {
    MissingArcs,
    MissingObject(Option<String>),
    InvalidArc { index: usize, reason: String },
    ArcOutOfRange { arc: i64, len: usize },
    InvalidGeometry { index: usize, reason: String },
}

impl std::fmt::Display for TopologyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopologyError::MissingArcs => write!(f, "topology has no arcs array"),
            TopologyError::MissingObject(Some(name)) => {
                write!(f, "topology has no object named {name:?}")
            }
            TopologyError::MissingObject(None) => write!(f, "topology has no objects"),
            TopologyError::InvalidArc { index, reason } => {
                write!(f, "invalid arc {index}: {reason}")
            }
            TopologyError::ArcOutOfRange { arc, len } => {
                write!(f, "arc reference {arc} out of range (arcs: {len})")
            }
            TopologyError::InvalidGeometry { index, reason } => {
                write!(f, "invalid geometry at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for TopologyError {}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

/// Decodes the named geometry collection of a topology into boundary features.
pub fn decode_topology(
    value: &Value,
    object: Option<&str>,
) -> Result<BoundaryCollection, TopologyError> {
    let transform = parse_transform(value.get("transform"));
    let raw_arcs = value
        .get("arcs")
        .and_then(|v| v.as_array())
        .ok_or(TopologyError::MissingArcs)?;
    let arcs = raw_arcs
        .iter()
        .enumerate()
        .map(|(index, arc)| decode_arc(index, arc, transform))
        .collect::<Result<Vec<_>, _>>()?;

    let objects = value
        .get("objects")
        .and_then(|v| v.as_object())
        .ok_or_else(|| TopologyError::MissingObject(object.map(str::to_string)))?;
    let obj = match object {
        Some(name) => objects.get(name),
        None => objects.values().next(),
    }
    .ok_or_else(|| TopologyError::MissingObject(object.map(str::to_string)))?;

    let geometries: Vec<&Value> = match obj.get("type").and_then(|v| v.as_str()) {
        Some("GeometryCollection") => obj
            .get("geometries")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().collect())
            .unwrap_or_default(),
        _ => vec![obj],
    };

    let mut features = Vec::with_capacity(geometries.len());
    for (index, geom) in geometries.into_iter().enumerate() {
        let geometry = decode_geometry(geom, &arcs)
            .map_err(|reason| TopologyError::InvalidGeometry { index, reason })?;
        let properties = geom
            .get("properties")
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_else(Map::new);
        features.push(BoundaryFeature {
            id: geom.get("id").and_then(value_to_id),
            properties,
            geometry,
        });
    }

    Ok(BoundaryCollection { features })
}

fn parse_transform(value: Option<&Value>) -> Option<Transform> {
    let t = value?.as_object()?;
    let pair = |key: &str| -> Option<[f64; 2]> {
        let arr = t.get(key)?.as_array()?;
        Some([arr.first()?.as_f64()?, arr.get(1)?.as_f64()?])
    };
    Some(Transform {
        scale: pair("scale")?,
        translate: pair("translate")?,
    })
}

fn decode_arc(
    index: usize,
    arc: &Value,
    transform: Option<Transform>,
) -> Result<Vec<Vec2>, TopologyError> {
    let positions = arc.as_array().ok_or_else(|| TopologyError::InvalidArc {
        index,
        reason: "arc must be an array of positions".to_string(),
    })?;

    let mut out = Vec::with_capacity(positions.len());
    let (mut x, mut y) = (0.0, 0.0);
    for pos in positions {
        let (px, py) = pos
            .as_array()
            .and_then(|p| Some((p.first()?.as_f64()?, p.get(1)?.as_f64()?)))
            .ok_or_else(|| TopologyError::InvalidArc {
                index,
                reason: "position must be [x, y]".to_string(),
            })?;
        match transform {
            Some(t) => {
                x += px;
                y += py;
                out.push(Vec2::new(
                    x * t.scale[0] + t.translate[0],
                    y * t.scale[1] + t.translate[1],
                ));
            }
            None => out.push(Vec2::new(px, py)),
        }
    }
    Ok(out)
}

/// Stitches arc references into one ring, dropping each shared joint vertex.
fn stitch_ring(refs: &Value, arcs: &[Vec<Vec2>]) -> Result<Ring, String> {
    let refs = refs
        .as_array()
        .ok_or("ring must be an array of arc indices".to_string())?;
    let mut ring: Ring = Vec::new();
    for r in refs {
        let i = r.as_i64().ok_or("arc index must be an integer".to_string())?;
        let (idx, reversed) = if i < 0 { (!i, true) } else { (i, false) };
        let arc = usize::try_from(idx)
            .ok()
            .and_then(|u| arcs.get(u))
            .ok_or_else(|| {
                TopologyError::ArcOutOfRange {
                    arc: i,
                    len: arcs.len(),
                }
                .to_string()
            })?;

        if !ring.is_empty() {
            ring.pop();
        }
        let start = ring.len();
        ring.extend_from_slice(arc);
        if reversed {
            ring[start..].reverse();
        }
    }
    Ok(ring)
}

fn stitch_polygon(rings: &Value, arcs: &[Vec<Vec2>]) -> Result<Polygon, String> {
    rings
        .as_array()
        .ok_or("polygon arcs must be an array of rings".to_string())?
        .iter()
        .map(|r| stitch_ring(r, arcs))
        .collect()
}

fn decode_geometry(geom: &Value, arcs: &[Vec<Vec2>]) -> Result<BoundaryGeometry, String> {
    let ty = geom.get("type").and_then(|v| v.as_str());
    match ty {
        None => Ok(BoundaryGeometry::default()),
        Some("Polygon") => {
            let refs = geom.get("arcs").ok_or("Polygon missing arcs".to_string())?;
            Ok(BoundaryGeometry::new(vec![stitch_polygon(refs, arcs)?]))
        }
        Some("MultiPolygon") => {
            let refs = geom
                .get("arcs")
                .and_then(|v| v.as_array())
                .ok_or("MultiPolygon missing arcs".to_string())?;
            let polygons = refs
                .iter()
                .map(|p| stitch_polygon(p, arcs))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(BoundaryGeometry::new(polygons))
        }
        Some(other) => Err(format!("unsupported topology geometry type: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::{TopologyError, decode_topology};
    use crate::boundary::BoundaryCollection;
    use foundation::math::Vec2;
    use serde_json::json;

    /// Two unit squares sharing the edge x = 1, quantized with scale 1.
    fn two_squares() -> serde_json::Value {
        json!({
            "type": "Topology",
            "transform": { "scale": [1.0, 1.0], "translate": [-100.0, 30.0] },
            "objects": {
                "states": {
                    "type": "GeometryCollection",
                    "geometries": [
                        { "type": "Polygon", "id": "04", "properties": { "name": "West" },
                            "arcs": [[0, 1]] },
                        { "type": "Polygon", "id": "35", "properties": { "name": "East" },
                            "arcs": [[2, -1]] },
                        { "type": null, "id": "99" }
                    ]
                }
            },
            "arcs": [
                // shared edge (1,0) -> (1,1), delta encoded
                [[1, 0], [0, 1]],
                // (1,1) -> (0,1) -> (0,0) -> (1,0)
                [[1, 1], [-1, 0], [0, -1], [1, 0]],
                // (1,0) -> (2,0) -> (2,1) -> (1,1)
                [[1, 0], [1, 0], [0, 1], [-1, 0]]
            ]
        })
    }

    #[test]
    fn decodes_quantized_polygons_with_shared_arcs() {
        let c = decode_topology(&two_squares(), Some("states")).expect("decode");
        assert_eq!(c.features.len(), 3);

        let west = &c.features[0].geometry.polygons[0][0];
        assert_eq!(
            west,
            &vec![
                Vec2::new(-99.0, 30.0),
                Vec2::new(-99.0, 31.0),
                Vec2::new(-100.0, 31.0),
                Vec2::new(-100.0, 30.0),
                Vec2::new(-99.0, 30.0),
            ]
        );

        // East walks the shared edge backwards: (1,1) -> (1,0).
        let east = &c.features[1].geometry.polygons[0][0];
        assert_eq!(east.first(), Some(&Vec2::new(-99.0, 30.0)));
        assert_eq!(east.last(), Some(&Vec2::new(-99.0, 30.0)));
        assert_eq!(east.len(), 5);

        assert!(c.features[2].geometry.is_empty());
        assert_eq!(c.features[0].identifier().as_deref(), Some("04"));
        assert_eq!(c.features[1].name(), Some("East"));
    }

    #[test]
    fn boundary_collection_dispatches_on_type() {
        let c = BoundaryCollection::from_json_value(two_squares(), None).expect("decode");
        assert_eq!(c.len(), 3);
        let b = c.bounds();
        assert_eq!(b.min, [-100.0, 30.0]);
        assert_eq!(b.max, [-98.0, 31.0]);
    }

    #[test]
    fn missing_object_is_reported() {
        let err = decode_topology(&two_squares(), Some("counties")).unwrap_err();
        assert_eq!(
            err,
            TopologyError::MissingObject(Some("counties".to_string()))
        );
    }

    #[test]
    fn out_of_range_arc_is_rejected() {
        let doc = json!({
            "type": "Topology",
            "objects": { "x": { "type": "Polygon", "arcs": [[7]] } },
            "arcs": [[[0.0, 0.0], [1.0, 1.0]]]
        });
        let err = decode_topology(&doc, None).unwrap_err();
        assert!(matches!(err, TopologyError::InvalidGeometry { index: 0, .. }));
    }
}
