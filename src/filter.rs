use clap::ValueEnum;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::normalize::NormalizedPoint;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyTerm {
    #[default]
    ShowAll,
    Ignore,
}

#[derive(Debug, PartialEq)]
pub enum Filtered<'a> {
    All(Vec<&'a NormalizedPoint>),
    Ignored,
    Matches(Vec<&'a NormalizedPoint>),
    NoMatches,
}

impl<'a> Filtered<'a> {
    pub fn points(&self) -> &[&'a NormalizedPoint] {
        match self {
            Self::All(x) | Self::Matches(x) => x,
            Self::Ignored | Self::NoMatches => &[],
        }
    }
}

pub fn filter_by_identifier<'a>(
    points: &'a [NormalizedPoint],
    term: &str,
    empty: EmptyTerm,
) -> Filtered<'a> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return match empty {
            EmptyTerm::ShowAll => Filtered::All(points.iter().collect()),
            EmptyTerm::Ignore => Filtered::Ignored,
        };
    }

    let matches: Vec<_> = points
        .iter()
        .filter(|x| {
            x.identifier
                .as_deref()
                .is_some_and(|id| id.to_lowercase().contains(&term))
        })
        .collect();

    if matches.is_empty() {
        Filtered::NoMatches
    } else {
        Filtered::Matches(matches)
    }
}

pub fn describe(point: &NormalizedPoint) -> String {
    let or_dash = |x: &Option<String>| x.clone().unwrap_or_else(|| "—".to_string());
    [
        point.name.clone().unwrap_or_else(|| "Sin nombre".to_string()),
        format!("AMIE: {}", or_dash(&point.identifier)),
        format!("Provincia: {}", or_dash(&point.province)),
        format!("Cantón: {}", or_dash(&point.canton)),
        format!("{:.6}, {:.6}", point.lat(), point.lon()),
    ]
    .iter()
    .join(" | ")
}

#[cfg(test)]
mod tests {
    use geo::Point;
    use pretty_assertions::assert_eq;

    use super::*;

    fn point(id: Option<&str>) -> NormalizedPoint {
        NormalizedPoint {
            identifier: id.map(|x| x.to_string()),
            name: None,
            province: None,
            canton: None,
            point: Point::new(-78.5, -0.2),
            fields: Default::default(),
        }
    }

    fn sample() -> Vec<NormalizedPoint> {
        vec![
            point(Some("17H00123")),
            point(Some("09H01000")),
            point(None),
            point(Some("17h00999")),
            point(Some("01B00001")),
        ]
    }

    fn ids<'a>(x: &Filtered<'a>) -> Vec<Option<&'a str>> {
        x.points().iter().map(|x| x.identifier.as_deref()).collect()
    }

    #[test]
    fn matches_are_case_insensitive() {
        let points = sample();
        let result = filter_by_identifier(&points, "17H", EmptyTerm::ShowAll);
        assert!(matches!(result, Filtered::Matches(_)));
        assert_eq!(ids(&result), vec![Some("17H00123"), Some("17h00999")]);

        let result = filter_by_identifier(&points, " 17h ", EmptyTerm::ShowAll);
        assert_eq!(result.points().len(), 2);
    }

    #[test]
    fn no_matches() {
        let points = sample();
        assert_eq!(
            filter_by_identifier(&points, "99Z", EmptyTerm::ShowAll),
            Filtered::NoMatches
        );
        assert!(filter_by_identifier(&points, "99Z", EmptyTerm::ShowAll)
            .points()
            .is_empty());
    }

    #[test]
    fn empty_term() {
        let points = sample();
        assert_eq!(
            filter_by_identifier(&points, "  ", EmptyTerm::Ignore),
            Filtered::Ignored
        );
        assert_eq!(
            filter_by_identifier(&points, "", EmptyTerm::ShowAll)
                .points()
                .len(),
            5
        );
    }

    #[test]
    fn describe_fills_gaps() {
        let mut x = point(Some("17H00123"));
        x.canton = Some("Quito".to_string());
        assert_eq!(
            describe(&x),
            "Sin nombre | AMIE: 17H00123 | Provincia: — | Cantón: Quito | -0.200000, -78.500000"
        );
    }
}
