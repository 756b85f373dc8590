//! The crate-wide error taxonomy.

use thiserror::Error;

/// Every fallible entry point in this crate returns `Result<_, Error>`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A caller supplied an argument that violates a type or function invariant.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// An index or count fell outside the bound it was checked against.
    #[error("index {index} out of range (bound {bound})")]
    OutOfRange {
        /// The offending index.
        index: usize,
        /// The bound the index was checked against (exclusive).
        bound: usize,
    },
    /// A precondition of an algorithm was violated at runtime (e.g. a malformed
    /// alignment passed to a routine that assumes monotonicity).
    #[error("runtime error: {0}")]
    Runtime(String),
    /// A documented but unimplemented combination of options was requested.
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

/// A convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_human_readable() {
        let e = Error::OutOfRange { index: 5, bound: 3 };
        assert_eq!(e.to_string(), "index 5 out of range (bound 3)");
    }
}
