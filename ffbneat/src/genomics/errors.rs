use crate::Innovation;

use std::error::Error;
use std::fmt;

/// An error type indicating the gene being created
/// or added would violate the genome's structural
/// invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GeneValidityError {
    /// The gene's innovation number is a duplicate.
    DuplicateGeneId(Innovation),
    /// The gene's endpoints do not exist.
    NonexistentEndpoints(Innovation, Innovation),
    /// The gene has the same endpoints as another with a different ID.
    DuplicateGeneWithEndpoints(Innovation, (Innovation, Innovation)),
    /// The target of the gene is an input node.
    InputEndpoint(Innovation),
    /// The gene would run from a node to another of equal
    /// or lower topological rank.
    RankInversion(Innovation, Innovation),
    /// The target node's gate already has as many enabled
    /// incoming genes as its arity allows.
    TargetAtCapacity(Innovation, usize),
}

/// An error type indicating the node being created
/// or added is invalid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeValidityError {
    /// The node's ID is a duplicate.
    DuplicateNodeId(Innovation),
}

/// An error type indicating a failure
/// to carry out a connection addition mutation.
/// Recovered by leaving the genome unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionMutationError {
    /// Every hidden and output gate is already wired
    /// to its full arity.
    AllTargetsAtCapacity,
    /// No viable source/target pair was found within
    /// the configured number of attempts.
    NoViablePairFound,
}

/// An error type indicating a failure
/// to carry out a node addition mutation.
/// Recovered by leaving the genome unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeMutationError {
    /// The genome has no enabled genes to split.
    NoEnabledGenes,
}

/// An error type indicating that gene alignment
/// during mating produced an impossible structure.
/// This signals an innovation-history defect; callers
/// recover by cloning the fitter parent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatingError {
    /// A gene innovation mapped to different endpoints
    /// in the two parents.
    InconsistentAlignment(Innovation),
}

impl fmt::Display for GeneValidityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateGeneId(id) => write!(f, "duplicate gene insertion with id {}", id),
            Self::NonexistentEndpoints(source, target) => write!(
                f,
                "gene insertion between nonexistent endpoint(s) {} -> {}",
                source, target
            ),
            Self::DuplicateGeneWithEndpoints(id, (source, target)) => write!(
                f,
                "gene insertion with endpoints {} -> {} and id {} shadows gene with same endpoints",
                source, target, id,
            ),
            Self::InputEndpoint(id) => {
                write!(f, "gene insertion with input node {} as target", id)
            }
            Self::RankInversion(source, target) => write!(
                f,
                "gene insertion from {} to {} inverts topological rank order",
                source, target
            ),
            Self::TargetAtCapacity(id, arity) => write!(
                f,
                "gene insertion into node {} whose gate is at its full arity of {}",
                id, arity
            ),
        }
    }
}

impl fmt::Display for NodeValidityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNodeId(id) => write!(f, "duplicate node insertion with id {}", id),
        }
    }
}

impl fmt::Display for ConnectionMutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllTargetsAtCapacity => {
                write!(f, "connection mutation on genome with no spare gate inputs")
            }
            Self::NoViablePairFound => {
                write!(f, "no viable source-target pair found for connection mutation")
            }
        }
    }
}

impl fmt::Display for NodeMutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEnabledGenes => write!(f, "node mutation on genome with no enabled genes"),
        }
    }
}

impl fmt::Display for MatingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InconsistentAlignment(id) => write!(
                f,
                "gene {} maps to different endpoints in the two parents",
                id
            ),
        }
    }
}

impl Error for GeneValidityError {}
impl Error for NodeValidityError {}
impl Error for ConnectionMutationError {}
impl Error for NodeMutationError {}
impl Error for MatingError {}
