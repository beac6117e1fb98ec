//! Remote recording sources.

pub mod xenocanto;

use std::str::FromStr;

use crate::clipper::normalize_species_code;
use crate::error::Error;

/// A species to look up remotely, written `Common Name=CODE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesTarget {
    /// English common name, as the remote source spells it.
    pub common_name: String,
    /// Upper-case species code.
    pub species_code: String,
}

impl FromStr for SpeciesTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, code) = s.rsplit_once('=').ok_or_else(|| Error::ConfigValidation {
            message: format!("species must be written NAME=CODE, got '{s}'"),
        })?;
        let common_name = name.trim();
        if common_name.is_empty() {
            return Err(Error::ConfigValidation {
                message: format!("species name is empty in '{s}'"),
            });
        }
        Ok(Self {
            common_name: common_name.to_string(),
            species_code: normalize_species_code(code)?,
        })
    }
}
