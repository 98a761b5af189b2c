//! Compact `//registry/owner/container:tag@digest` image references


mod name;

pub use name::Locator;

/// Regex fragments for each component of a reference
///
/// Each fragment includes its trailing or leading delimiter, so the
/// concatenation of all fragments is the grammar for the part of a reference
/// that follows the `//` prefix.
pub(crate) mod fragments {
    /// Zero or more registry path segments, each followed by a slash
    pub const REGISTRY: &str = "(?:[-a-zA-Z0-9]{1,64}/)*";
    /// One account segment followed by a slash
    pub const OWNER: &str = "[-a-zA-Z0-9]{1,39}/";
    /// Image name
    pub const CONTAINER: &str = "[-_.a-zA-Z0-9]{1,64}";
    /// Optional tag including its leading colon
    pub const TAG: &str = "(?::[-_.a-zA-Z0-9]{1,64})?";
    /// Optional md5 digest including its leading at sign
    pub const DIGEST: &str = "(?:@[a-f0-9]{32})?";
}
