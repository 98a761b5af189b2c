use serde::Deserialize;

/// Registry description of a downloadable image
///
/// This is the JSON object a registry returns for a container reference. The
/// `image` field is the authoritative download URL; the others describe the
/// image as the registry knows it.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize)]
pub struct Manifest {
    pub image: String,
    pub name: String,
    pub tag: String,
    pub version: String,
}
