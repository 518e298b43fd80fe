use foundation::bounds::LngLat;
use foundation::geometry::Geometry;
use scene::{RegionCollection, RegionFeature, WageLevel};
use serde_json::{Map, Value};

/// Property names used by the Census county boundary files.
pub const PROP_STATE_CODE: &str = "STATEFP";
pub const PROP_NAME: &str = "NAME";
pub const PROP_ID: &str = "GEOID";
/// Property stamped onto exported features for choropleth styling.
pub const PROP_LEVEL: &str = "level";

#[derive(Debug)]
pub enum RegionCollectionError {
    Json(String),
    NotAFeatureCollection,
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for RegionCollectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionCollectionError::Json(msg) => write!(f, "JSON parse error: {msg}"),
            RegionCollectionError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
            RegionCollectionError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for RegionCollectionError {}

pub fn parse_region_collection(payload: &str) -> Result<RegionCollection, RegionCollectionError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|e| RegionCollectionError::Json(e.to_string()))?;
    region_collection_from_value(&value)
}

pub fn region_collection_from_value(
    value: &Value,
) -> Result<RegionCollection, RegionCollectionError> {
    let obj = value
        .as_object()
        .ok_or(RegionCollectionError::NotAFeatureCollection)?;
    if obj.get("type").and_then(|v| v.as_str()) != Some("FeatureCollection") {
        return Err(RegionCollectionError::NotAFeatureCollection);
    }
    let features_val = obj
        .get("features")
        .and_then(|v| v.as_array())
        .ok_or(RegionCollectionError::NotAFeatureCollection)?;

    let mut features = Vec::with_capacity(features_val.len());
    for (index, feat_val) in features_val.iter().enumerate() {
        let feature = parse_feature(feat_val)
            .map_err(|reason| RegionCollectionError::InvalidFeature { index, reason })?;
        features.push(feature);
    }

    Ok(RegionCollection::new(features))
}

fn parse_feature(value: &Value) -> Result<RegionFeature, String> {
    let obj = value
        .as_object()
        .ok_or("feature must be an object".to_string())?;
    let props = obj
        .get("properties")
        .and_then(|v| v.as_object())
        .ok_or("feature missing properties".to_string())?;

    let state_code = match props.get(PROP_STATE_CODE) {
        Some(Value::String(s)) => s.clone(),
        // Numeric codes lose their leading zero in some exports.
        Some(Value::Number(n)) => match n.as_u64() {
            Some(code) => format!("{code:02}"),
            None => return Err(format!("{PROP_STATE_CODE} must be a non-negative integer")),
        },
        _ => return Err(format!("feature missing {PROP_STATE_CODE}")),
    };

    let name = props
        .get(PROP_NAME)
        .and_then(|v| v.as_str())
        .ok_or(format!("feature missing {PROP_NAME}"))?
        .to_string();

    let id = match props.get(PROP_ID).or_else(|| obj.get("id")) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(format!("feature missing {PROP_ID}")),
    };

    let geometry = match obj.get("geometry") {
        None | Some(Value::Null) => None,
        Some(g) => Some(parse_geometry(g)?),
    };

    Ok(RegionFeature::new(id, state_code, name, geometry))
}

/// Exports regions as a FeatureCollection. When `levels` is given (parallel to
/// the collection), classified regions carry a numeric `level` property and
/// unclassified ones carry none.
pub fn region_collection_to_geojson(
    collection: &RegionCollection,
    levels: Option<&[Option<WageLevel>]>,
) -> Value {
    let mut features: Vec<Value> = Vec::with_capacity(collection.len());
    for (idx, feature) in collection.iter().enumerate() {
        let mut props = Map::new();
        props.insert(
            PROP_STATE_CODE.to_string(),
            Value::String(feature.state_code.clone()),
        );
        props.insert(PROP_NAME.to_string(), Value::String(feature.name.clone()));
        props.insert(
            PROP_ID.to_string(),
            Value::String(feature.id.as_str().to_string()),
        );
        if let Some(level) = levels.and_then(|l| l.get(idx)).copied().flatten() {
            props.insert(PROP_LEVEL.to_string(), Value::from(level.number()));
        }

        let mut fobj = Map::new();
        fobj.insert("type".to_string(), Value::String("Feature".to_string()));
        fobj.insert("properties".to_string(), Value::Object(props));
        fobj.insert(
            "geometry".to_string(),
            feature
                .geometry
                .as_ref()
                .map(geometry_to_geojson_value)
                .unwrap_or(Value::Null),
        );
        features.push(Value::Object(fobj));
    }

    let mut root = Map::new();
    root.insert(
        "type".to_string(),
        Value::String("FeatureCollection".to_string()),
    );
    root.insert("features".to_string(), Value::Array(features));
    Value::Object(root)
}

fn geometry_to_geojson_value(geom: &Geometry) -> Value {
    let (ty, coords) = match geom {
        Geometry::Point(p) => ("Point", point_coords(p)),
        Geometry::MultiPoint(ps) => ("MultiPoint", points_coords(ps)),
        Geometry::LineString(ps) => ("LineString", points_coords(ps)),
        Geometry::MultiLineString(lines) => ("MultiLineString", rings_coords(lines)),
        Geometry::Polygon(rings) => ("Polygon", rings_coords(rings)),
        Geometry::MultiPolygon(polys) => (
            "MultiPolygon",
            Value::Array(polys.iter().map(|p| rings_coords(p)).collect()),
        ),
    };
    let mut obj = Map::new();
    obj.insert("type".to_string(), Value::String(ty.to_string()));
    obj.insert("coordinates".to_string(), coords);
    Value::Object(obj)
}

fn point_coords(p: &LngLat) -> Value {
    Value::Array(vec![Value::from(p.lng), Value::from(p.lat)])
}

fn points_coords(ps: &[LngLat]) -> Value {
    Value::Array(ps.iter().map(point_coords).collect())
}

fn rings_coords(rings: &[Vec<LngLat>]) -> Value {
    Value::Array(rings.iter().map(|r| points_coords(r)).collect())
}

fn parse_geometry(value: &Value) -> Result<Geometry, String> {
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
        "Point" => Ok(Geometry::Point(parse_point(coords)?)),
        "MultiPoint" => Ok(Geometry::MultiPoint(parse_points(coords)?)),
        "LineString" => Ok(Geometry::LineString(parse_points(coords)?)),
        "MultiLineString" => Ok(Geometry::MultiLineString(parse_rings(coords)?)),
        "Polygon" => Ok(Geometry::Polygon(parse_rings(coords)?)),
        "MultiPolygon" => {
            let polys = coords
                .as_array()
                .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
            let mut out = Vec::with_capacity(polys.len());
            for poly in polys {
                out.push(parse_rings(poly)?);
            }
            Ok(Geometry::MultiPolygon(out))
        }
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

fn parse_point(coords: &Value) -> Result<LngLat, String> {
    let arr = coords
        .as_array()
        .ok_or("position must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("position must have [lon, lat]".to_string());
    }
    let lng = arr[0].as_f64().ok_or("lon must be a number".to_string())?;
    let lat = arr[1].as_f64().ok_or("lat must be a number".to_string())?;
    Ok(LngLat::new(lng, lat))
}

fn parse_points(coords: &Value) -> Result<Vec<LngLat>, String> {
    let arr = coords
        .as_array()
        .ok_or("coordinates must be an array".to_string())?;
    arr.iter().map(parse_point).collect()
}

fn parse_rings(coords: &Value) -> Result<Vec<Vec<LngLat>>, String> {
    let rings = coords
        .as_array()
        .ok_or("coordinates must be an array of rings".to_string())?;
    rings.iter().map(parse_points).collect()
}
