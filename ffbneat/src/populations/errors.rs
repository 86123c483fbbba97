use std::error::Error;
use std::fmt;

/// An error type indicating offspring could not
/// be allotted to the population's species.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OffspringAllotmentError {
    /// All genomes in the population have zero fitness.
    DegeneratePopulation,
}

impl fmt::Display for OffspringAllotmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegeneratePopulation => {
                write!(f, "cannot allot offspring in degenerate population")
            }
        }
    }
}

impl Error for OffspringAllotmentError {}
