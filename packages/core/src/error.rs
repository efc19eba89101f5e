//! The crate-level error type.
//!
//! Each module reports its own error enum; [`Error`] wraps them all so that
//! callers driving the whole pipeline can use `?` throughout, and
//! [`Error::kind`] tells them whether to fix their input, fix their
//! environment, or give up.

use thiserror::Error;

use crate::document::DocumentError;
use crate::nquads::{ParseError, SerializeError};
use crate::profile::ProfileError;
use crate::publication::PublicationError;
use crate::rdf::TermError;
use crate::signing::{SigningError, VerifyError};

/// Broad classes of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed caller input: wrong term kind, bad ORCID iD, empty list.
    InvalidArgument,
    /// No profile where one is required.
    Configuration,
    /// Profile material present but unreadable.
    Integrity,
    /// Signing attempted without usable key material.
    Signing,
    /// A received document failed signature or identifier checks.
    Verification,
    /// Malformed N-Triples / N-Quads, or quads that do not form a
    /// nanopublication.
    Parse,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Publication(#[from] PublicationError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error(transparent)]
    Term(#[from] TermError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Profile(e) => e.kind(),
            Error::Publication(e) => e.kind(),
            Error::Signing(e) => e.kind(),
            Error::Verify(e) => e.kind(),
            Error::Parse(e) => e.kind(),
            Error::Document(_) => ErrorKind::Parse,
            Error::Serialize(e) => e.kind(),
            Error::Term(e) => e.kind(),
        }
    }
}

/// Wraps `std::result::Result` around [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_wrapped_error() {
        let e: Error = PublicationError::EmptyDerivedFrom.into();
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
        let e: Error = SigningError::NoProfile.into();
        assert_eq!(e.kind(), ErrorKind::Signing);
        let e: Error = ProfileError::Corrupt("bad".into()).into();
        assert_eq!(e.kind(), ErrorKind::Integrity);
        let e: Error = DocumentError::MissingHead.into();
        assert_eq!(e.kind(), ErrorKind::Parse);
        assert_eq!(e.to_string(), "no graph declares a np:Nanopublication");
    }
}
