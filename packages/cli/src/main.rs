//! `np`: nanopublication command-line interface.
//!
//! Subcommands:
//!
//! - **`setup`**: create a signing profile (key pair + ORCID iD).
//! - **`profile`**: show the stored profile.
//! - **`publish`**: wrap an N-Triples assertion in a nanopublication, sign
//!   it, and publish it (or print it with `--dry-run`).
//! - **`retract`**: publish a retraction of an earlier nanopublication.
//! - **`verify`**: check the signature and identifier of an N-Quads file.
//! - **`render`**: print a human-readable summary of an N-Quads file.
//!
//! Input files are read from a path or from stdin (`-`). Logs go to stderr,
//! filtered by `RUST_LOG` (default `np=info,nanopub=info`).

mod client;
mod config;
mod setup;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use chrono::Utc;
use clap::{Parser, Subcommand};
use nanopub::{
    assemble, finalize, parse_nquads, parse_ntriples, render_document, retraction, sign, verify,
    AssembleOptions, DirectoryStore, Nanopub, NanopubGraphs, Profile, SignedDocument, Term,
    TermError,
};
use serde::Serialize;

use client::Publisher;
use config::ClientConfig;
use setup::SetupOptions;

/// np: nanopublication CLI
///
/// Assemble, sign, publish and verify nanopublications.
#[derive(Parser)]
#[command(name = "np", version, about, long_about = None)]
struct Cli {
    /// Profile directory.
    #[arg(long, global = true, env = "NANOPUB_HOME", value_name = "DIR")]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a signing profile.
    ///
    /// Generates a new Ed25519 key pair (or imports one with --key, checked
    /// against --public-key when given) and binds it to an ORCID iD. With --publish, also publishes an introduction
    /// nanopublication declaring the key.
    Setup {
        /// ORCID iD, e.g. https://orcid.org/0000-0002-1825-0097
        #[arg(long, value_name = "URI")]
        orcid_id: String,

        /// Display name.
        #[arg(long)]
        name: String,

        /// File holding a hex-encoded 32-byte Ed25519 seed to import.
        #[arg(long, value_name = "FILE")]
        key: Option<PathBuf>,

        /// File holding the matching hex-encoded public key.
        #[arg(long, value_name = "FILE", requires = "key")]
        public_key: Option<PathBuf>,

        /// Publish an introduction nanopublication for the new key.
        #[arg(long)]
        publish: bool,

        /// Publish to the test server instead of the production servers.
        #[arg(long)]
        test: bool,

        /// Replace an existing profile.
        #[arg(long)]
        force: bool,
    },

    /// Show the stored profile.
    Profile {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Assemble, sign and publish an assertion.
    ///
    /// Reads the assertion as N-Triples. Terms given on the command line are
    /// IRIs unless written `_:label` (blank node) or `"text"` (literal).
    ///
    /// Examples:
    ///   np publish claim.nt --introduces _:DrBob
    ///   np publish claim.nt --derived-from http://example.org/a --dry-run
    Publish {
        /// Path to an N-Triples file, or `-` for stdin.
        file: PathBuf,

        /// Concept the nanopublication introduces.
        #[arg(long, value_name = "TERM")]
        introduces: Option<String>,

        /// Source the assertion was derived from. Repeat for several.
        #[arg(long = "derived-from", value_name = "IRI")]
        derived_from: Vec<String>,

        /// Attribute the assertion to this IRI.
        #[arg(long, value_name = "IRI")]
        attribute_to: Option<String>,

        /// Attribute the assertion to the profile's ORCID iD.
        #[arg(long)]
        attribute_to_profile: bool,

        /// Record the current time as the creation time.
        #[arg(long)]
        timestamp: bool,

        /// Print the signed N-Quads instead of publishing.
        #[arg(long)]
        dry_run: bool,

        /// Publish to the test server.
        #[arg(long)]
        test: bool,
    },

    /// Retract an earlier nanopublication.
    Retract {
        /// Identifier of the nanopublication to retract.
        uri: String,

        /// Print the signed N-Quads instead of publishing.
        #[arg(long)]
        dry_run: bool,

        /// Publish to the test server.
        #[arg(long)]
        test: bool,
    },

    /// Verify a signed nanopublication.
    ///
    /// Exits 0 if the signature and identifier check out, 1 otherwise.
    Verify {
        /// Path to an N-Quads file, or `-` for stdin.
        file: PathBuf,
    },

    /// Render a nanopublication as human-readable text.
    Render {
        /// Path to an N-Quads file, or `-` for stdin.
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "np=info,nanopub=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let store = match cli.home {
        Some(dir) => DirectoryStore::new(dir),
        None => DirectoryStore::from_env().unwrap_or_else(|e| fatal(&e.to_string())),
    };
    let config = ClientConfig::from_env();

    match cli.command {
        Command::Setup {
            orcid_id,
            name,
            key,
            public_key,
            publish,
            test,
            force,
        } => {
            let options = SetupOptions {
                orcid_id,
                name,
                key_file: key,
                public_key_file: public_key,
                force,
            };
            let publisher = publish.then(|| publisher(&config, test));
            let profile = setup::run(&store, &options, publisher.as_ref())
                .unwrap_or_else(|e| fatal(&e.to_string()));
            println!("profile saved to {}", store.dir().display());
            println!("fingerprint: {}", profile.fingerprint());
            if let Some(uri) = profile.introduction_nanopub_uri() {
                println!("introduction: {uri}");
            }
        }

        Command::Profile { json } => {
            let profile = load_profile(&store);
            let summary = ProfileSummary::new(&store, &profile);
            if json {
                let json = serde_json::to_string_pretty(&summary)
                    .unwrap_or_else(|e| fatal(&e.to_string()));
                println!("{json}");
            } else {
                print!("{summary}");
            }
        }

        Command::Publish {
            file,
            introduces,
            derived_from,
            attribute_to,
            attribute_to_profile,
            timestamp,
            dry_run,
            test,
        } => {
            let assertion = parse_ntriples(&read_input(&file))
                .unwrap_or_else(|e| fatal(&format!("failed to parse {}: {e}", file.display())));

            let mut options = AssembleOptions {
                introduces_concept: introduces.as_deref().map(term_arg),
                assertion_attributed_to: attribute_to.as_deref().map(iri_arg),
                attribute_assertion_to_profile: attribute_to_profile,
                ..AssembleOptions::default()
            };
            if !derived_from.is_empty() {
                options = options.derived_from(derived_from.iter().map(|s| iri_arg(s)).collect());
            }
            if timestamp {
                options = options.created_at(Utc::now());
            }

            let profile = load_profile(&store);
            let draft = assemble(assertion, options, Some(&profile))
                .unwrap_or_else(|e| fatal(&e.to_string()));
            let signed = sign(finalize(draft), Some(&profile))
                .unwrap_or_else(|e| fatal(&e.to_string()));
            emit(&signed, &config, dry_run, test);
        }

        Command::Retract { uri, dry_run, test } => {
            let profile = load_profile(&store);
            let draft = retraction(&iri_arg(&uri), &profile)
                .unwrap_or_else(|e| fatal(&e.to_string()));
            let signed = sign(finalize(draft), Some(&profile))
                .unwrap_or_else(|e| fatal(&e.to_string()));
            emit(&signed, &config, dry_run, test);
        }

        Command::Verify { file } => {
            let quads = parse_nquads(&read_input(&file))
                .unwrap_or_else(|e| fatal(&format!("failed to parse {}: {e}", file.display())));
            let outcome = SignedDocument::from_quads(quads).and_then(|doc| {
                let signer = verify(&doc)?.signed_by.clone();
                Ok((doc, signer))
            });
            match outcome {
                Ok((doc, signer)) => println!("valid  {}  signed by {signer}", doc.uri()),
                Err(e) => {
                    eprintln!("invalid: {e}");
                    process::exit(1);
                }
            }
        }

        Command::Render { file } => {
            let quads = parse_nquads(&read_input(&file))
                .unwrap_or_else(|e| fatal(&format!("failed to parse {}: {e}", file.display())));
            let graphs = NanopubGraphs::from_quads(quads).unwrap_or_else(|e| fatal(&e.to_string()));
            print!("{}", render_document(&graphs));
        }
    }
}

/// What `np profile` shows. Never includes the private key.
#[derive(Debug, Serialize)]
struct ProfileSummary {
    directory: String,
    orcid_id: String,
    name: String,
    public_key: String,
    fingerprint: String,
    can_sign: bool,
    introduction_nanopub_uri: Option<String>,
}

impl ProfileSummary {
    fn new(store: &DirectoryStore, profile: &Profile) -> Self {
        Self {
            directory: store.dir().display().to_string(),
            orcid_id: profile.orcid_id().to_string(),
            name: profile.name().to_string(),
            public_key: profile.public_key_base64(),
            fingerprint: profile.fingerprint(),
            can_sign: profile.can_sign(),
            introduction_nanopub_uri: profile.introduction_nanopub_uri().map(str::to_string),
        }
    }
}

impl std::fmt::Display for ProfileSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "directory:    {}", self.directory)?;
        writeln!(f, "orcid_id:     {}", self.orcid_id)?;
        writeln!(f, "name:         {}", self.name)?;
        writeln!(f, "public_key:   {}", self.public_key)?;
        writeln!(f, "fingerprint:  {}", self.fingerprint)?;
        writeln!(f, "can_sign:     {}", self.can_sign)?;
        writeln!(
            f,
            "introduction: {}",
            self.introduction_nanopub_uri.as_deref().unwrap_or("(none)")
        )
    }
}

/// Print or publish a signed document.
fn emit(signed: &SignedDocument, config: &ClientConfig, dry_run: bool, test: bool) {
    if dry_run {
        let text = signed.to_nquads().unwrap_or_else(|e| fatal(&e.to_string()));
        print!("{text}");
        return;
    }
    let published = publisher(config, test)
        .publish(signed)
        .unwrap_or_else(|e| fatal(&e.to_string()));
    println!("{}", published.identifier);
}

fn publisher(config: &ClientConfig, test: bool) -> Publisher {
    Publisher::new(config.targets(test), config.timeout)
        .unwrap_or_else(|e| fatal(&format!("failed to build HTTP client: {e}")))
}

fn load_profile(store: &DirectoryStore) -> Profile {
    Profile::load(store).unwrap_or_else(|e| fatal(&e.to_string()))
}

/// Parse a command-line term: `_:label` is a blank node, `"text"` a literal,
/// anything else an IRI.
fn parse_term(raw: &str) -> Result<Term, TermError> {
    let term = if let Some(label) = raw.strip_prefix("_:") {
        Term::blank(label)
    } else if let Some(text) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        Term::literal(text)
    } else {
        Term::iri(raw)
    };
    term.to_sophia()?;
    Ok(term)
}

fn term_arg(raw: &str) -> Term {
    parse_term(raw).unwrap_or_else(|e| fatal(&e.to_string()))
}

fn iri_arg(raw: &str) -> Term {
    Term::try_iri(raw).unwrap_or_else(|e| fatal(&e.to_string()))
}

/// Read the full contents of a file, or stdin when the path is `"-"`.
fn read_input(path: &PathBuf) -> String {
    if path.to_str() == Some("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .unwrap_or_else(|e| fatal(&format!("failed to read stdin: {}", e)));
        buf
    } else {
        fs::read_to_string(path).unwrap_or_else(|e| {
            fatal(&format!("failed to read {}: {}", path.display(), e))
        })
    }
}

/// Print an error message to stderr and exit with code 2.
fn fatal(msg: &str) -> ! {
    eprintln!("np: {}", msg);
    process::exit(2);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_are_parsed_by_shape() {
        assert_eq!(parse_term("_:DrBob"), Ok(Term::blank("DrBob")));
        assert_eq!(parse_term("\"hello\""), Ok(Term::literal("hello")));
        assert_eq!(parse_term("http://example.org/x"), Ok(Term::iri("http://example.org/x")));
    }

    #[test]
    fn malformed_terms_are_rejected() {
        assert!(matches!(parse_term("http://example.org/a b"), Err(TermError::Iri(_))));
        assert!(matches!(parse_term("_:has space"), Err(TermError::BlankNode(_))));
    }

    #[test]
    fn cli_parses_publish_flags() {
        let cli = Cli::try_parse_from([
            "np",
            "publish",
            "claim.nt",
            "--introduces",
            "_:DrBob",
            "--derived-from",
            "http://example.org/a",
            "--derived-from",
            "http://example.org/b",
            "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Command::Publish {
                introduces,
                derived_from,
                dry_run,
                ..
            } => {
                assert_eq!(introduces.as_deref(), Some("_:DrBob"));
                assert_eq!(derived_from.len(), 2);
                assert!(dry_run);
            }
            _ => panic!("expected publish"),
        }
    }

    #[test]
    fn public_key_needs_a_private_key() {
        let setup = |extra: &[&str]| {
            let mut args = vec!["np", "setup", "--orcid-id", "https://orcid.org/0000-0000-0000-0000"];
            args.extend(["--name", "pietje"]);
            args.extend(extra);
            Cli::try_parse_from(args)
        };
        assert!(setup(&["--public-key", "id_ed25519.pub"]).is_err());
        assert!(setup(&["--key", "id_ed25519", "--public-key", "id_ed25519.pub"]).is_ok());
    }

    #[test]
    fn profile_summary_omits_private_key() {
        use ed25519_dalek::SigningKey;
        use rand::rngs::OsRng;

        let key = SigningKey::generate(&mut OsRng);
        let secret = hex::encode(key.to_bytes());
        let profile = Profile::new(
            key,
            "https://orcid.org/0000-0000-0000-0000".parse().unwrap(),
            "pietje",
        );
        let store = DirectoryStore::new("/tmp/np-profile");
        let summary = ProfileSummary::new(&store, &profile);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["orcid_id"], "https://orcid.org/0000-0000-0000-0000");
        assert_eq!(json["can_sign"], true);
        assert!(!json.to_string().contains(&secret));
        assert!(summary.to_string().contains("introduction: (none)"));
    }
}
