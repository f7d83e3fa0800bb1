// "containerPort:hostPort" mappings

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortMapping {
    pub container_port: u16,
    pub host_port: u16,
}

impl PortMapping {
    /// Parses every entry, failing on the first malformed one.
    pub fn parse_all<S: AsRef<str>>(ports: &[S]) -> Result<Vec<Self>> {
        ports.iter().map(|p| p.as_ref().parse()).collect()
    }

    /// Docker port key, e.g. "5432/tcp".
    pub fn container_key(&self) -> String {
        format!("{}/tcp", self.container_port)
    }
}

impl FromStr for PortMapping {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let Some((container, host)) = s.split_once(':') else {
            return Err(Error::Config(format!(
                r#"incorrect port configuration {s:?}, expected format is "containerPort:hostPort""#
            )));
        };
        let parse = |part: &str, what: &str| {
            part.trim().parse::<u16>().map_err(|e| {
                Error::Config(format!("incorrect {what} port in {s:?}: {e}"))
            })
        };
        Ok(Self {
            container_port: parse(container, "container")?,
            host_port: parse(host, "host")?,
        })
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.container_port, self.host_port)
    }
}
