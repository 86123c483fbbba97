//! The fixed repertoire of boolean operations a node can compute.
//! Gate kinds form a closed set: adding one is a change to the
//! enumeration and its evaluation table, nothing else.

use serde::{Deserialize, Serialize};

use std::error::Error;
use std::fmt;

/// A boolean operation with a fixed input arity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateKind {
    /// Passes its single input through unchanged.
    Buffer,
    /// Inverts its single input.
    Not,
    And,
    Or,
    Xor,
    Nand,
    Nor,
    Xnor,
}

impl GateKind {
    /// Every gate kind, unary kinds first.
    pub const ALL: [GateKind; 8] = [
        GateKind::Buffer,
        GateKind::Not,
        GateKind::And,
        GateKind::Or,
        GateKind::Xor,
        GateKind::Nand,
        GateKind::Nor,
        GateKind::Xnor,
    ];

    /// Returns the number of inputs the gate consumes.
    pub fn arity(self) -> usize {
        match self {
            GateKind::Buffer | GateKind::Not => 1,
            _ => 2,
        }
    }

    /// Applies the gate's operation to `inputs`.
    ///
    /// # Errors
    ///
    /// Returns an error if `inputs.len()` differs from the
    /// gate's declared arity. Callers that pad inputs to arity
    /// (as the compiled network does) never see this.
    ///
    /// # Examples
    /// ```
    /// use ffbneat::gates::GateKind;
    ///
    /// assert_eq!(GateKind::Xor.evaluate(&[true, false]), Ok(true));
    /// assert_eq!(GateKind::Nand.evaluate(&[true, true]), Ok(false));
    /// assert!(GateKind::Not.evaluate(&[true, true]).is_err());
    /// ```
    pub fn evaluate(self, inputs: &[bool]) -> Result<bool, GateEvaluationError> {
        if inputs.len() != self.arity() {
            return Err(GateEvaluationError::ArityMismatch {
                kind: self,
                expected: self.arity(),
                actual: inputs.len(),
            });
        }
        Ok(match self {
            GateKind::Buffer => inputs[0],
            GateKind::Not => !inputs[0],
            GateKind::And => inputs[0] & inputs[1],
            GateKind::Or => inputs[0] | inputs[1],
            GateKind::Xor => inputs[0] ^ inputs[1],
            GateKind::Nand => !(inputs[0] & inputs[1]),
            GateKind::Nor => !(inputs[0] | inputs[1]),
            GateKind::Xnor => !(inputs[0] ^ inputs[1]),
        })
    }

    /// Returns an iterator over all gate kinds with the given arity.
    pub fn kinds_with_arity(arity: usize) -> impl Iterator<Item = GateKind> {
        Self::ALL.iter().copied().filter(move |k| k.arity() == arity)
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GateKind::Buffer => "BUF",
            GateKind::Not => "NOT",
            GateKind::And => "AND",
            GateKind::Or => "OR",
            GateKind::Xor => "XOR",
            GateKind::Nand => "NAND",
            GateKind::Nor => "NOR",
            GateKind::Xnor => "XNOR",
        };
        write!(f, "{}", name)
    }
}

/// An error type indicating a gate was applied
/// to the wrong number of inputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateEvaluationError {
    ArityMismatch {
        kind: GateKind,
        expected: usize,
        actual: usize,
    },
}

impl fmt::Display for GateEvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArityMismatch {
                kind,
                expected,
                actual,
            } => write!(
                f,
                "gate {} applied to {} inputs, expected {}",
                kind, actual, expected
            ),
        }
    }
}

impl Error for GateEvaluationError {}
