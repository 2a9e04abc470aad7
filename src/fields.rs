use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub type RawRecord = BTreeMap<String, String>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Field {
    Identifier,
    Name,
    Province,
    Canton,
    Latitude,
    Longitude,
    Easting,
    Northing,
    ZoneHint,
}

// Tried in order, first non-blank column wins. Alias files only list the
// fields they change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Aliases {
    pub identifier: Vec<String>,
    pub name: Vec<String>,
    pub province: Vec<String>,
    pub canton: Vec<String>,
    pub latitude: Vec<String>,
    pub longitude: Vec<String>,
    pub easting: Vec<String>,
    pub northing: Vec<String>,
    pub zone_hint: Vec<String>,
}

fn owned(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|x| x.to_string()).collect()
}

impl Default for Aliases {
    fn default() -> Self {
        Self {
            identifier: owned(&["AMIE", "amie", "codigo", "CODIGO", "Código"]),
            name: owned(&[
                "INSTITUCIO",
                "nombre",
                "NOMBRE",
                "institucion",
                "Institución",
                "Institucion",
            ]),
            province: owned(&["Provincia", "provincia", "PROVINCIA"]),
            canton: owned(&["Cantón", "CANTON", "canton", "CANTÓN"]),
            latitude: owned(&["Latitud", "lat", "Lat", "LAT"]),
            longitude: owned(&["Longitud", "lon", "Lon", "LON"]),
            easting: owned(&["COORDENADA X", "COORDENADAX", "X", "coord_x", "COORD_X"]),
            northing: owned(&["COORDENADA Y", "COORDENADAY", "Y", "coord_y", "COORD_Y"]),
            zone_hint: owned(&["ZONA", "zona", "zone"]),
        }
    }
}

impl Aliases {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read aliases: {}", path.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("Failed to parse aliases: {}", path.display()))
    }

    pub fn get(&self, field: Field) -> &[String] {
        match field {
            Field::Identifier => &self.identifier,
            Field::Name => &self.name,
            Field::Province => &self.province,
            Field::Canton => &self.canton,
            Field::Latitude => &self.latitude,
            Field::Longitude => &self.longitude,
            Field::Easting => &self.easting,
            Field::Northing => &self.northing,
            Field::ZoneHint => &self.zone_hint,
        }
    }

    pub fn pick<'a>(&self, field: Field, record: &'a RawRecord) -> Option<&'a str> {
        self.get(field)
            .iter()
            .filter_map(|key| record.get(key))
            .map(|x| x.as_str())
            .find(|x| !x.trim().is_empty())
    }
}
