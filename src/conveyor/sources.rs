use crate::{
    conveyor::{ConveyorPacker, Definition, PackerSelector, ShubConveyorPacker},
    errors::SourceError,
    registry::RegistryClient,
    workspace::WorkspaceProvider,
};
use std::{collections::HashMap, fmt, sync::Arc};

type Constructor = Box<dyn Fn() -> Box<dyn ConveyorPacker> + Send + Sync>;

/// Source backends, keyed by the scheme of their references
///
/// A recipe's `bootstrap` header (or the `scheme` part of a `scheme://`
/// source URI) selects which constructor builds the conveyor for it.
#[derive(Default)]
pub struct Sources {
    constructors: HashMap<String, Constructor>,
}

impl Sources {
    /// An empty set of backends
    pub fn new() -> Self {
        Sources {
            constructors: HashMap::new(),
        }
    }

    /// The built-in backends: `shub`
    pub fn with_defaults(
        client: RegistryClient,
        workspaces: Arc<dyn WorkspaceProvider>,
        packers: Arc<dyn PackerSelector>,
    ) -> Self {
        let mut sources = Sources::new();
        sources.register("shub", move || -> Box<dyn ConveyorPacker> {
            Box::new(ShubConveyorPacker::new(
                client.clone(),
                workspaces.clone(),
                packers.clone(),
            ))
        });
        sources
    }

    /// Add or replace the backend for a scheme
    pub fn register<F>(&mut self, scheme: &str, constructor: F)
    where
        F: Fn() -> Box<dyn ConveyorPacker> + Send + Sync + 'static,
    {
        self.constructors
            .insert(scheme.to_owned(), Box::new(constructor));
    }

    /// Is there a backend for this scheme?
    pub fn supports(&self, scheme: &str) -> bool {
        self.constructors.contains_key(scheme)
    }

    /// Construct a fresh conveyor for a scheme
    pub fn conveyor_for(&self, scheme: &str) -> Result<Box<dyn ConveyorPacker>, SourceError> {
        match self.constructors.get(scheme) {
            Some(constructor) => Ok(constructor()),
            None => Err(SourceError::UnknownSource(scheme.to_owned())),
        }
    }

    /// Construct a fresh conveyor for a recipe's `bootstrap` header
    pub fn conveyor_for_recipe(
        &self,
        recipe: &Definition,
    ) -> Result<Box<dyn ConveyorPacker>, SourceError> {
        match recipe.bootstrap() {
            Some(scheme) => self.conveyor_for(scheme),
            None => Err(SourceError::UnknownSource(String::new())),
        }
    }
}

impl fmt::Debug for Sources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut schemes: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        f.debug_struct("Sources").field("schemes", &schemes).finish()
    }
}
