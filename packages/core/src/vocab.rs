//! IRIs of the vocabularies a nanopublication is written in.

pub mod rdf {
    pub const NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
}

/// The nanopublication schema.
pub mod np {
    pub const NS: &str = "http://www.nanopub.org/nschema#";
    pub const NANOPUBLICATION: &str = "http://www.nanopub.org/nschema#Nanopublication";
    pub const HAS_ASSERTION: &str = "http://www.nanopub.org/nschema#hasAssertion";
    pub const HAS_PROVENANCE: &str = "http://www.nanopub.org/nschema#hasProvenance";
    pub const HAS_PUBLICATION_INFO: &str = "http://www.nanopub.org/nschema#hasPublicationInfo";
}

/// Nanopublication extensions: introduced concepts, retractions, signatures.
pub mod npx {
    pub const NS: &str = "http://purl.org/nanopub/x/";
    pub const INTRODUCES: &str = "http://purl.org/nanopub/x/introduces";
    pub const RETRACTS: &str = "http://purl.org/nanopub/x/retracts";
    pub const DECLARED_BY: &str = "http://purl.org/nanopub/x/declaredBy";
    pub const HAS_ALGORITHM: &str = "http://purl.org/nanopub/x/hasAlgorithm";
    pub const HAS_PUBLIC_KEY: &str = "http://purl.org/nanopub/x/hasPublicKey";
    pub const HAS_KEY_FINGERPRINT: &str = "http://purl.org/nanopub/x/hasKeyFingerprint";
    pub const HAS_SIGNATURE: &str = "http://purl.org/nanopub/x/hasSignature";
    pub const HAS_SIGNATURE_TARGET: &str = "http://purl.org/nanopub/x/hasSignatureTarget";
    pub const SIGNED_BY: &str = "http://purl.org/nanopub/x/signedBy";
}

pub mod prov {
    pub const NS: &str = "http://www.w3.org/ns/prov#";
    pub const WAS_DERIVED_FROM: &str = "http://www.w3.org/ns/prov#wasDerivedFrom";
    pub const WAS_ATTRIBUTED_TO: &str = "http://www.w3.org/ns/prov#wasAttributedTo";
    pub const GENERATED_AT_TIME: &str = "http://www.w3.org/ns/prov#generatedAtTime";
}

pub mod dct {
    pub const NS: &str = "http://purl.org/dc/terms/";
    pub const CREATED: &str = "http://purl.org/dc/terms/created";
}

pub mod xsd {
    pub const NS: &str = "http://www.w3.org/2001/XMLSchema#";
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
}

pub mod foaf {
    pub const NS: &str = "http://xmlns.com/foaf/0.1/";
    pub const NAME: &str = "http://xmlns.com/foaf/0.1/name";
}

/// The hypothesis/claim ontology used by example assertions.
pub mod hycl {
    pub const NS: &str = "http://purl.org/petapico/o/hycl#";
    pub const CLAIMS: &str = "http://purl.org/petapico/o/hycl#claims";
}

/// Prefixes used when rendering IRIs in compact form.
pub const PREFIXES: &[(&str, &str)] = &[
    ("rdf", rdf::NS),
    ("np", np::NS),
    ("npx", npx::NS),
    ("prov", prov::NS),
    ("dct", dct::NS),
    ("xsd", xsd::NS),
    ("foaf", foaf::NS),
    ("hycl", hycl::NS),
];
