//! Client configuration, populated from environment variables.

use std::time::Duration;

/// Publication servers tried in order when `NANOPUB_SERVERS` is unset.
pub const DEFAULT_SERVERS: &[&str] = &[
    "https://np.petapico.org/",
    "https://np.knowledgepixels.com/",
];

/// Server used for `--test` runs when `NANOPUB_TEST_SERVER` is unset.
pub const DEFAULT_TEST_SERVER: &str = "https://np.test.knowledgepixels.com/";

/// Runtime configuration for talking to publication servers.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `NANOPUB_SERVERS` | [`DEFAULT_SERVERS`] | Comma-separated server URLs, tried in order |
/// | `NANOPUB_TEST_SERVER` | [`DEFAULT_TEST_SERVER`] | Server used with `--test` |
/// | `NANOPUB_TIMEOUT_SECS` | `30` | Per-request HTTP timeout |
///
/// The profile directory (`NANOPUB_HOME`) is resolved by
/// [`nanopub::DirectoryStore::from_env`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub servers: Vec<String>,
    pub test_server: String,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Populate config from environment variables, applying defaults where absent.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let servers = lookup("NANOPUB_SERVERS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| DEFAULT_SERVERS.iter().map(|s| s.to_string()).collect());

        let timeout_secs = lookup("NANOPUB_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        Self {
            servers,
            test_server: lookup("NANOPUB_TEST_SERVER")
                .unwrap_or_else(|| DEFAULT_TEST_SERVER.into()),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// The servers to publish to: the test server alone, or the full list.
    pub fn targets(&self, test: bool) -> Vec<String> {
        if test {
            vec![self.test_server.clone()]
        } else {
            self.servers.clone()
        }
    }
}
