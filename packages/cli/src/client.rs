//! Publishing signed nanopublications to publication servers.
//!
//! [`Publisher`] POSTs the canonical N-Quads of a document to each configured
//! server in turn. A server that fails is logged and the next one is tried;
//! only when every server has failed is the last error returned.

use std::time::Duration;

use nanopub::{Nanopub, SerializeError, SignedDocument};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{info, warn};

/// Media type of the request body.
pub const NQUADS: &str = "application/n-quads";

// ---------------------------------------------------------------------------
// PublishError
// ---------------------------------------------------------------------------

/// Errors that can occur while publishing.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The HTTP request or response failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server returned a non-2xx HTTP status code.
    #[error("server {server} returned status {status}")]
    BadStatus { server: String, status: u16 },

    #[error("no publication servers configured")]
    NoServers,

    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

/// Where a document ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub server: String,
    pub identifier: String,
}

pub struct Publisher {
    client: Client,
    servers: Vec<String>,
}

impl Publisher {
    pub fn new(servers: Vec<String>, timeout: Duration) -> Result<Self, PublishError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, servers })
    }

    /// Publish `document` to the first server that accepts it.
    pub fn publish(&self, document: &SignedDocument) -> Result<Published, PublishError> {
        let body = document.to_nquads()?;
        let identifier = document.uri().as_iri().unwrap_or_default().to_string();

        let mut last_error = None;
        for server in &self.servers {
            match self.post(server, &body) {
                Ok(()) => {
                    info!(%server, %identifier, "published nanopublication");
                    return Ok(Published {
                        server: server.clone(),
                        identifier,
                    });
                }
                Err(e) => {
                    warn!(%server, error = %e, "publication server failed, trying next");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or(PublishError::NoServers))
    }

    fn post(&self, server: &str, body: &str) -> Result<(), PublishError> {
        let response = self
            .client
            .post(server)
            .header(CONTENT_TYPE, NQUADS)
            .body(body.to_string())
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::BadStatus {
                server: server.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publishing_with_no_servers_fails_cleanly() {
        use ed25519_dalek::SigningKey;
        use nanopub::{assemble, finalize, sign, AssembleOptions, Graph, Profile, Term};
        use rand::rngs::OsRng;

        let profile = Profile::new(
            SigningKey::generate(&mut OsRng),
            "https://orcid.org/0000-0000-0000-0000".parse().unwrap(),
            "pietje",
        );
        let mut assertion = Graph::new();
        assertion.add(
            Term::iri("http://example.org/a"),
            Term::iri("http://example.org/p"),
            Term::literal("o"),
        );
        let draft = assemble(assertion, AssembleOptions::default(), Some(&profile)).unwrap();
        let signed = sign(finalize(draft), Some(&profile)).unwrap();

        let publisher = Publisher::new(Vec::new(), Duration::from_secs(1)).unwrap();
        assert!(matches!(publisher.publish(&signed), Err(PublishError::NoServers)));
    }
}
