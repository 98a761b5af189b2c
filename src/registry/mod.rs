//! Support for looking up and downloading container images from a registry server

mod builder;
mod client;
mod default;
mod fetch;

pub use builder::RegistryClientBuilder;
pub use client::RegistryClient;
pub use default::DefaultRegistry;
pub use fetch::IMAGE_FILE_PREFIX;
