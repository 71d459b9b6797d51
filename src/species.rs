//! Species selector and its fixed alias table.

use std::fmt;
use std::str::FromStr;

use crate::error::CellMeshError;

/// Species with gene tables in the reference store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Species {
    Human,
    Mouse,
    Worm,
}

/// Accepted names, matched after lowercasing and mapping ' ' and '-' to '_'.
const ALIASES: &[(&str, Species)] = &[
    ("human", Species::Human),
    ("homo_sapiens", Species::Human),
    ("mouse", Species::Mouse),
    ("mus_musculus", Species::Mouse),
    ("worm", Species::Worm),
    ("c_elegans", Species::Worm),
    ("caenorhabditis_elegans", Species::Worm),
];

impl Species {
    pub const ALL: [Species; 3] = [Species::Human, Species::Mouse, Species::Worm];

    /// NCBI taxonomy id.
    pub const fn taxonomy_id(self) -> u32 {
        match self {
            Species::Human => 9606,
            Species::Mouse => 10090,
            Species::Worm => 6239,
        }
    }

    /// Binomial name in the store's snake_case spelling.
    pub const fn scientific_name(self) -> &'static str {
        match self {
            Species::Human => "homo_sapiens",
            Species::Mouse => "mus_musculus",
            Species::Worm => "c_elegans",
        }
    }

    pub fn from_taxonomy_id(taxid: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.taxonomy_id() == taxid)
    }
}

impl FromStr for Species {
    type Err = CellMeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, species)| *species)
            .ok_or_else(|| {
                let known: Vec<&str> = ALIASES.iter().map(|(alias, _)| *alias).collect();
                CellMeshError::invalid_argument(format!(
                    "unrecognized species '{}' (expected one of: {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scientific_name())
    }
}
