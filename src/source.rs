use std::{
    convert::Infallible,
    fmt,
    fs::File,
    io::Read,
    path::PathBuf,
    str::FromStr,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use tracing::debug;
use ureq::AgentBuilder;

use crate::fields::RawRecord;

pub const DEFAULT_PATH: &str = "data/instituciones.csv";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    Path(PathBuf),
    Url(String),
}

impl FromStr for Source {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Infallible> {
        Ok(if s.starts_with("http://") || s.starts_with("https://") {
            Self::Url(s.to_string())
        } else {
            Self::Path(PathBuf::from(s))
        })
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(x) => write!(f, "{}", x.display()),
            Self::Url(x) => f.write_str(x),
        }
    }
}

impl Source {
    pub fn read(&self) -> Result<Vec<RawRecord>> {
        self.read_inner()
            .with_context(|| format!("Failed to read CSV: {self}"))
    }

    fn read_inner(&self) -> Result<Vec<RawRecord>> {
        match self {
            Self::Path(path) => parse(File::open(path)?),
            Self::Url(url) => {
                let url = cache_busted(url, now_millis());
                debug!(%url, "fetching CSV");
                let agent = AgentBuilder::new()
                    .user_agent(concat!("amie-map/", env!("CARGO_PKG_VERSION")))
                    .build();
                parse(agent.get(&url).call()?.into_reader())
            }
        }
    }
}

// stops static hosts serving a stale copy
fn cache_busted(url: &str, stamp: u128) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}v={stamp}")
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|x| x.as_millis())
        .unwrap_or_default()
}

pub fn parse(reader: impl Read) -> Result<Vec<RawRecord>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|x| String::from_utf8_lossy(x).into_owned())
        .collect();

    let mut rows = Vec::new();
    for result in reader.byte_records() {
        let record = result?;
        let row: RawRecord = headers
            .iter()
            .zip(record.iter())
            .filter(|(k, _)| !k.is_empty())
            .map(|(k, v)| (k.clone(), String::from_utf8_lossy(v).into_owned()))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn source_from_str() {
        assert_eq!(
            "data/x.csv".parse::<Source>().unwrap(),
            Source::Path(PathBuf::from("data/x.csv"))
        );
        assert_eq!(
            "https://example.org/x.csv".parse::<Source>().unwrap(),
            Source::Url("https://example.org/x.csv".to_string())
        );
        assert_eq!(
            DEFAULT_PATH.parse::<Source>().unwrap().to_string(),
            DEFAULT_PATH
        );
    }

    #[test]
    fn cache_busting() {
        assert_eq!(cache_busted("https://a.b/x.csv", 42), "https://a.b/x.csv?v=42");
        assert_eq!(
            cache_busted("https://a.b/x.csv?raw=1", 42),
            "https://a.b/x.csv?raw=1&v=42"
        );
    }

    #[test]
    fn parses_rows() {
        let csv = "AMIE, Latitud ,Longitud\n17H00001,\"-0,2\",\"-78,5\"\n\n09H00002,-2.1\n,,\n";
        let rows = parse(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["AMIE"], "17H00001");
        assert_eq!(rows[0]["Latitud"], "-0,2");
        assert_eq!(rows[0]["Longitud"], "-78,5");
        assert_eq!(rows[1].get("Longitud"), None);
        assert_eq!(rows[2]["AMIE"], "");
    }

    #[test]
    fn cells_keep_their_spaces() {
        let rows = parse(" AMIE \n 17H00001 \n".as_bytes()).unwrap();
        assert_eq!(rows[0]["AMIE"], " 17H00001 ");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let csv = b"AMIE,CANTON\n17H00001,Pe\xf1ipe\n";
        let rows = parse(&csv[..]).unwrap();
        assert_eq!(rows[0]["CANTON"], "Pe\u{fffd}ipe");
    }

    #[test]
    fn reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "AMIE,lat,lon\n17H00001,-1,-78\n").unwrap();
        let source = Source::Path(file.path().to_path_buf());
        assert_eq!(source.read().unwrap().len(), 1);
    }

    #[test]
    fn missing_file_is_fatal() {
        let source = Source::Path(PathBuf::from("does/not/exist.csv"));
        let err = source.read().unwrap_err();
        assert!(err.to_string().starts_with("Failed to read CSV: does/not/exist.csv"));
    }
}
