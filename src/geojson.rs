use std::{fs, path::Path};

use anyhow::{Context, Result};
use geo::{coord, BoundingRect, MultiPoint, Rect};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::normalize::NormalizedPoint;

#[derive(Serialize)]
struct FeatureCollection<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    bbox: Option<[f64; 4]>,
    features: Vec<Feature<'a>>,
}

#[derive(Serialize)]
struct Feature<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    geometry: Geometry,
    properties: Properties<'a>,
}

#[derive(Serialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: [f64; 2],
}

struct Properties<'a>(&'a NormalizedPoint);

impl Serialize for Properties<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let x = self.0;
        let mut map = Map::new();
        for (k, v) in &x.fields {
            map.insert(k.clone(), Value::String(v.clone()));
        }
        map.insert("amie".into(), x.identifier.clone().into());
        map.insert("nombre".into(), x.name.clone().into());
        map.insert("provincia".into(), x.province.clone().into());
        map.insert("canton".into(), x.canton.clone().into());
        map.insert("lat".into(), x.lat().into());
        map.insert("lon".into(), x.lon().into());
        map.serialize(serializer)
    }
}

fn multi_point<'a>(points: impl IntoIterator<Item = &'a NormalizedPoint>) -> MultiPoint {
    points.into_iter().map(|x| x.point).collect()
}

pub fn extent<'a>(points: impl IntoIterator<Item = &'a NormalizedPoint>) -> Option<Rect> {
    multi_point(points).bounding_rect()
}

pub fn pad(rect: Rect, ratio: f64) -> Rect {
    let dx = rect.width() * ratio;
    let dy = rect.height() * ratio;
    Rect::new(
        coord! { x: rect.min().x - dx, y: rect.min().y - dy },
        coord! { x: rect.max().x + dx, y: rect.max().y + dy },
    )
}

pub fn view_bounds<'a>(points: impl IntoIterator<Item = &'a NormalizedPoint>) -> Option<Rect> {
    extent(points).map(|x| pad(x, 0.2))
}

pub fn to_string(points: &[NormalizedPoint]) -> Result<String> {
    let collection = FeatureCollection {
        kind: "FeatureCollection",
        bbox: extent(points).map(|x| [x.min().x, x.min().y, x.max().x, x.max().y]),
        features: points
            .iter()
            .map(|x| Feature {
                kind: "Feature",
                geometry: Geometry {
                    kind: "Point",
                    coordinates: [x.lon(), x.lat()],
                },
                properties: Properties(x),
            })
            .collect(),
    };
    let mut output = serde_json::to_string_pretty(&collection)?;
    output.push('\n');
    Ok(output)
}

pub fn write(path: &Path, points: &[NormalizedPoint]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|x| !x.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, to_string(points)?)
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use geo::Point;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn point(lon: f64, lat: f64) -> NormalizedPoint {
        NormalizedPoint {
            identifier: Some("17H00123".to_string()),
            name: None,
            province: Some("Pichincha".to_string()),
            canton: None,
            point: Point::new(lon, lat),
            fields: [("AMIE".to_string(), "17H00123".to_string())].into(),
        }
    }

    #[test]
    fn feature_collection() {
        let value: Value = serde_json::from_str(&to_string(&[point(-78.5, -1.25)]).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "FeatureCollection",
                "bbox": [-78.5, -1.25, -78.5, -1.25],
                "features": [{
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [-78.5, -1.25] },
                    "properties": {
                        "AMIE": "17H00123",
                        "amie": "17H00123",
                        "nombre": null,
                        "provincia": "Pichincha",
                        "canton": null,
                        "lat": -1.25,
                        "lon": -78.5
                    }
                }]
            })
        );
    }

    #[test]
    fn empty_collection() {
        let value: Value = serde_json::from_str(&to_string(&[]).unwrap()).unwrap();
        assert_eq!(value, json!({ "type": "FeatureCollection", "features": [] }));
    }

    #[test]
    fn padded_view() {
        let points = [point(-80.0, -2.0), point(-78.0, 0.0)];
        let view = view_bounds(&points).unwrap();
        assert!((view.min().x - -80.4).abs() < 1e-9);
        assert!((view.min().y - -2.4).abs() < 1e-9);
        assert!((view.max().x - -77.6).abs() < 1e-9);
        assert!((view.max().y - 0.4).abs() < 1e-9);

        assert_eq!(view_bounds(&Vec::<NormalizedPoint>::new()), None);
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/instituciones.geojson");
        write(&path, &[point(-78.5, -1.25)]).unwrap();
        assert!(fs::read_to_string(path).unwrap().ends_with("}\n"));
    }
}
