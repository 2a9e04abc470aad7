use std::fmt;

use geo::Point;
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::{
    fields::{Aliases, Field, RawRecord},
    numbers::parse_number,
    utils::progress_bar,
    utm::Zone,
};

#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedPoint {
    pub identifier: Option<String>,
    pub name: Option<String>,
    pub province: Option<String>,
    pub canton: Option<String>,
    /// `x` is longitude, `y` is latitude (WGS84 degrees).
    pub point: Point,
    pub fields: RawRecord,
}

impl NormalizedPoint {
    pub fn lon(&self) -> f64 {
        self.point.x()
    }

    pub fn lat(&self) -> f64 {
        self.point.y()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub processed: usize,
    pub succeeded: usize,
    pub skipped: usize,
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Registros: {} / {}", self.succeeded, self.processed)
    }
}

fn number(aliases: &Aliases, field: Field, record: &RawRecord) -> Option<f64> {
    aliases
        .pick(field, record)
        .and_then(parse_number)
        .map(|x| x.get())
}

fn locate(record: &RawRecord, aliases: &Aliases) -> Option<Point> {
    let lat = number(aliases, Field::Latitude, record);
    let lon = number(aliases, Field::Longitude, record);
    if let (Some(lat), Some(lon)) = (lat, lon) {
        return Some(Point::new(lon, lat));
    }

    let easting = number(aliases, Field::Easting, record)?;
    let northing = number(aliases, Field::Northing, record)?;
    let zone = Zone::from_hint(aliases.pick(Field::ZoneHint, record));
    trace!(%zone, easting, northing, "reprojecting");
    let point = zone.to_lon_lat(easting, northing);

    // far outside the zone the series diverges
    if (-180.0..=180.0).contains(&point.x()) && (-90.0..=90.0).contains(&point.y()) {
        Some(point)
    } else {
        None
    }
}

/// Latitude/longitude columns take priority; UTM easting/northing is only
/// consulted when either of them is missing or not a number.
pub fn normalize(record: &RawRecord, aliases: &Aliases) -> Option<NormalizedPoint> {
    let point = locate(record, aliases)?;
    let text = |field: Field| aliases.pick(field, record).map(|x| x.to_string());

    Some(NormalizedPoint {
        identifier: text(Field::Identifier),
        name: text(Field::Name),
        province: text(Field::Province),
        canton: text(Field::Canton),
        point,
        fields: record.clone(),
    })
}

pub fn normalize_all(records: &[RawRecord], aliases: &Aliases) -> (Vec<NormalizedPoint>, Tally) {
    let results: Vec<_> = records
        .par_iter()
        .progress_with(progress_bar(records.len() as u64))
        .map(|x| normalize(x, aliases))
        .collect();

    let mut tally = Tally {
        processed: records.len(),
        ..Default::default()
    };
    let mut points = Vec::with_capacity(results.len());
    for (i, result) in results.into_iter().enumerate() {
        match result {
            Some(x) => {
                points.push(x);
                tally.succeeded += 1;
            }
            None => {
                // +2 for the header and 1-based lines
                debug!(row = i + 2, "skipping row without usable coordinates");
                tally.skipped += 1;
            }
        }
    }

    (points, tally)
}
