use std::fmt;

use geo::Point;

const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
const FLATTENING: f64 = 1.0 / 298.257_223_563;
const SCALE_FACTOR: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Zone {
    South17,
    South18,
}

impl Zone {
    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint {
            Some(x) if x.contains("18") => Self::South18,
            _ => Self::South17,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Self::South17 => 17,
            Self::South18 => 18,
        }
    }

    pub fn epsg(&self) -> u32 {
        match self {
            Self::South17 => 32717,
            Self::South18 => 32718,
        }
    }

    fn central_meridian(&self) -> f64 {
        (self.number() as f64 * 6.0 - 183.0).to_radians()
    }

    /// Inverse transverse Mercator (Krüger series to sixth order in the third
    /// flattening). Returns a point with `x` = longitude and `y` = latitude in
    /// decimal degrees.
    pub fn to_lon_lat(&self, easting: f64, northing: f64) -> Point {
        let n = FLATTENING / (2.0 - FLATTENING);
        let (n2, n3) = (n * n, n * n * n);
        let (n4, n5, n6) = (n3 * n, n3 * n2, n3 * n3);

        let rectifying_radius =
            SEMI_MAJOR_AXIS / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0 + n6 / 256.0);

        let beta = [
            n / 2.0 - 2.0 / 3.0 * n2 + 37.0 / 96.0 * n3 - 1.0 / 360.0 * n4 - 81.0 / 512.0 * n5
                + 96199.0 / 604800.0 * n6,
            1.0 / 48.0 * n2 + 1.0 / 15.0 * n3 - 437.0 / 1440.0 * n4 + 46.0 / 105.0 * n5
                - 1118711.0 / 3870720.0 * n6,
            17.0 / 480.0 * n3 - 37.0 / 840.0 * n4 - 209.0 / 4480.0 * n5 + 5569.0 / 90720.0 * n6,
            4397.0 / 161280.0 * n4 - 11.0 / 504.0 * n5 - 830251.0 / 7257600.0 * n6,
            4583.0 / 161280.0 * n5 - 108847.0 / 3991680.0 * n6,
            20648693.0 / 638668800.0 * n6,
        ];
        let delta = [
            2.0 * n - 2.0 / 3.0 * n2 - 2.0 * n3 + 116.0 / 45.0 * n4 + 26.0 / 45.0 * n5
                - 2854.0 / 675.0 * n6,
            7.0 / 3.0 * n2 - 8.0 / 5.0 * n3 - 227.0 / 45.0 * n4 + 2704.0 / 315.0 * n5
                + 2323.0 / 945.0 * n6,
            56.0 / 15.0 * n3 - 136.0 / 35.0 * n4 - 1262.0 / 105.0 * n5 + 73814.0 / 2835.0 * n6,
            4279.0 / 630.0 * n4 - 332.0 / 35.0 * n5 - 399572.0 / 14175.0 * n6,
            4174.0 / 315.0 * n5 - 144838.0 / 6237.0 * n6,
            601676.0 / 22275.0 * n6,
        ];

        let xi = (northing - FALSE_NORTHING_SOUTH) / (SCALE_FACTOR * rectifying_radius);
        let eta = (easting - FALSE_EASTING) / (SCALE_FACTOR * rectifying_radius);

        let mut xi_prime = xi;
        let mut eta_prime = eta;
        for (j, b) in beta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi_prime -= b * (k * xi).sin() * (k * eta).cosh();
            eta_prime -= b * (k * xi).cos() * (k * eta).sinh();
        }

        // conformal latitude
        let chi = (xi_prime.sin() / eta_prime.cosh()).asin();
        let mut lat = chi;
        for (j, d) in delta.iter().enumerate() {
            lat += d * (2.0 * (j + 1) as f64 * chi).sin();
        }
        let lon = self.central_meridian() + eta_prime.sinh().atan2(xi_prime.cos());

        Point::new(wrap_longitude(lon.to_degrees()), lat.to_degrees())
    }
}

fn wrap_longitude(lon: f64) -> f64 {
    if lon.abs() > 180.0 {
        lon - 360.0 * (lon / 360.0).round()
    } else {
        lon
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UTM {}S (EPSG:{})", self.number(), self.epsg())
    }
}
