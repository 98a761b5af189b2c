use crate::{errors::SourceError, locator::fragments, registry::DefaultRegistry};
use regex::Regex;
use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    ops::Range,
    str::FromStr,
};

/// Parsed image reference
///
/// An owned decomposition of a reference string like
/// `//host/path/owner/container:tag@0123456789abcdef0123456789abcdef` into
/// its registry path, owner, container, tag, and digest. Only the owner and
/// container are mandatory.
///
/// When a reference has exactly two path segments it names an image on the
/// default registry, and the registry path is filled in from the
/// [DefaultRegistry] used for parsing. With more segments, everything before
/// the owner is a custom registry path.
///
/// Every component keeps its delimiter: the registry path and owner end with
/// `/`, the tag begins with `:` and the digest with `@`. Absent components are
/// empty strings. Concatenating all five reproduces [Locator::as_str()].
#[derive(Clone)]
pub struct Locator {
    serialized: String,
    registry_pos: Range<usize>,
    owner_pos: Range<usize>,
    container_pos: Range<usize>,
    tag_pos: Range<usize>,
    digest_pos: Range<usize>,
    is_default_registry: bool,
}

impl Locator {
    /// Parse a `//`-prefixed reference string
    ///
    /// Fails with [SourceError::InvalidReference] unless the whole string
    /// matches the reference grammar.
    pub fn parse(reference: &str, default_registry: &DefaultRegistry) -> Result<Self, SourceError> {
        lazy_static! {
            static ref RE: Regex = Regex::new(&format!(
                "^//{}{}{}{}{}$",
                fragments::REGISTRY,
                fragments::OWNER,
                fragments::CONTAINER,
                fragments::TAG,
                fragments::DIGEST,
            ))
            .unwrap();
        }
        if !RE.is_match(reference) {
            return Err(SourceError::InvalidReference(reference.to_owned()));
        }

        let src = &reference[2..];
        let pieces: Vec<&str> = src.split_inclusive('/').collect();
        let (registry, owner, remainder, is_default_registry) = match pieces.len() {
            l if l > 2 => (pieces[..l - 2].concat(), pieces[l - 2], pieces[l - 1], false),
            2 => (default_registry.name().to_owned(), pieces[0], pieces[1], true),
            _ => return Err(SourceError::InvalidReference(reference.to_owned())),
        };

        // digest first, then tag; the container is whatever is left
        let (remainder, digest) = match remainder.find('@') {
            Some(at) => remainder.split_at(at),
            None => (remainder, ""),
        };
        let (container, tag) = match remainder.find(':') {
            Some(colon) => remainder.split_at(colon),
            None => (remainder, ""),
        };

        Ok(Locator::assemble(
            &registry,
            owner,
            container,
            tag,
            digest,
            is_default_registry,
        ))
    }

    /// Build a [Locator] from its component pieces
    ///
    /// Components are given without delimiters. The result is checked by
    /// parsing the assembled reference, and fails if any piece would be
    /// parsed differently than intended, for example an owner containing a
    /// slash.
    pub fn from_parts(
        registry: Option<&str>,
        owner: &str,
        container: &str,
        tag: Option<&str>,
        digest: Option<&str>,
        default_registry: &DefaultRegistry,
    ) -> Result<Self, SourceError> {
        let mut reference = String::from("//");
        if let Some(registry) = registry {
            reference.push_str(registry);
            reference.push('/');
        }
        reference.push_str(owner);
        reference.push('/');
        reference.push_str(container);
        if let Some(tag) = tag {
            reference.push(':');
            reference.push_str(tag);
        }
        if let Some(digest) = digest {
            reference.push('@');
            reference.push_str(digest);
        }
        let parsed = Locator::parse(&reference, default_registry)?;
        let expected_registry = registry.map(|r| format!("{}/", r));
        if parsed.is_default_registry() == registry.is_none()
            && (registry.is_none() || Some(parsed.registry_str()) == expected_registry.as_deref())
            && parsed.owner_str().trim_end_matches('/') == owner
            && parsed.container_str() == container
            && parsed.tag() == tag
            && parsed.digest() == digest
        {
            Ok(parsed)
        } else {
            // Parsing ambiguity
            Err(SourceError::InvalidReference(reference))
        }
    }

    fn assemble(
        registry: &str,
        owner: &str,
        container: &str,
        tag: &str,
        digest: &str,
        is_default_registry: bool,
    ) -> Self {
        let mut serialized = String::with_capacity(
            registry.len() + owner.len() + container.len() + tag.len() + digest.len(),
        );
        let mut push = |part: &str| {
            let start = serialized.len();
            serialized.push_str(part);
            start..serialized.len()
        };
        let registry_pos = push(registry);
        let owner_pos = push(owner);
        let container_pos = push(container);
        let tag_pos = push(tag);
        let digest_pos = push(digest);
        Locator {
            serialized,
            registry_pos,
            owner_pos,
            container_pos,
            tag_pos,
            digest_pos,
            is_default_registry,
        }
    }

    /// Returns the canonical form, `registry + owner + container + tag +
    /// digest`
    ///
    /// For references on the default registry, this includes the default
    /// registry name.
    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    /// Returns the `//`-prefixed reference this locator parses from
    ///
    /// The default registry name is left out again, so parsing the result with
    /// the same [DefaultRegistry] yields an equal [Locator].
    pub fn reference(&self) -> String {
        if self.is_default_registry {
            format!("//{}", self.http_path())
        } else {
            format!("//{}", self.serialized)
        }
    }

    /// Returns the path below the registry: `owner + container + tag +
    /// digest`
    pub fn http_path(&self) -> &str {
        &self.serialized[self.owner_pos.start..]
    }

    /// Return references to the registry, owner, container, tag, and digest
    pub fn as_parts(&self) -> (&str, &str, &str, &str, &str) {
        (
            self.registry_str(),
            self.owner_str(),
            self.container_str(),
            self.tag_str(),
            self.digest_str(),
        )
    }

    /// Was the registry left out of the reference?
    pub fn is_default_registry(&self) -> bool {
        self.is_default_registry
    }

    /// Registry path including its trailing slash
    pub fn registry_str(&self) -> &str {
        &self.serialized[self.registry_pos.clone()]
    }

    /// Owner segment including its trailing slash
    pub fn owner_str(&self) -> &str {
        &self.serialized[self.owner_pos.clone()]
    }

    /// Container name, never empty
    pub fn container_str(&self) -> &str {
        &self.serialized[self.container_pos.clone()]
    }

    /// Tag including its leading `:`, or empty
    pub fn tag_str(&self) -> &str {
        &self.serialized[self.tag_pos.clone()]
    }

    /// Digest including its leading `@`, or empty
    pub fn digest_str(&self) -> &str {
        &self.serialized[self.digest_pos.clone()]
    }

    /// Tag without its delimiter, if present
    pub fn tag(&self) -> Option<&str> {
        self.tag_str().get(1..).filter(|s| !s.is_empty())
    }

    /// Digest hex without its delimiter, if present
    ///
    /// The digest is carried along with the reference but downloaded content
    /// is not checked against it.
    pub fn digest(&self) -> Option<&str> {
        self.digest_str().get(1..).filter(|s| !s.is_empty())
    }
}

impl Eq for Locator {}

impl PartialEq for Locator {
    fn eq(&self, other: &Self) -> bool {
        self.serialized == other.serialized && self.is_default_registry == other.is_default_registry
    }
}

impl FromStr for Locator {
    type Err = SourceError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locator::parse(s, &DefaultRegistry::new())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Hash for Locator {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.serialized.hash(state);
        self.is_default_registry.hash(state);
    }
}

impl Ord for Locator {
    fn cmp(&self, other: &Self) -> Ordering {
        self.serialized
            .cmp(&other.serialized)
            .then(self.is_default_registry.cmp(&other.is_default_registry))
    }
}

impl PartialOrd for Locator {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
