use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;

/// Genes are the principal components of genomes.
/// They are created between two nodes, and become
/// wires in the genome's circuit phenotype.
///
/// A gene is immutable once created, apart from its
/// enabled flag.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Gene {
    id: Innovation,
    source: Innovation,
    target: Innovation,
    enabled: bool,
}

impl Gene {
    /// Returns a new gene with the specified parameters.
    pub(crate) fn new(id: Innovation, source: Innovation, target: Innovation, enabled: bool) -> Gene {
        Gene {
            id,
            source,
            target,
            enabled,
        }
    }

    /// Returns the gene's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.id
    }

    /// Returns the gene's source node's id.
    pub fn source(&self) -> Innovation {
        self.source
    }

    /// Returns the gene's target node's id.
    pub fn target(&self) -> Innovation {
        self.target
    }

    /// Returns whether the gene is expressed in the phenotype.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the gene's enabled flag.
    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns the gene's source and target node ids.
    pub(crate) fn endpoints(&self) -> (Innovation, Innovation) {
        (self.source, self.target)
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:?}[{:?}->{:?}]{}",
            if self.enabled { "" } else { "(" },
            self.id,
            self.source,
            self.target,
            if self.enabled { "" } else { ")" },
        )
    }
}
