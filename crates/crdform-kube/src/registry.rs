//! Registry of resource types
//!
//! Resource types come from the embedded catalog and from CRD files on disk.
//! Lookups of unknown names suggest the closest registered name.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crdform_core::{CrdParser, CrdSchema};

use crate::catalog::builtin_crds;
use crate::definition::ResourceDefinition;
use crate::error::{KubeError, Result};

/// Maximum edit distance for "did you mean" suggestions
const MAX_SUGGESTION_DISTANCE: usize = 3;

const MANIFEST_SUFFIX: &str = "_manifest";

/// Resource types by Terraform type name
#[derive(Debug, Clone)]
pub struct Registry {
    prefix: String,
    definitions: BTreeMap<String, Arc<ResourceDefinition>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            definitions: BTreeMap::new(),
        }
    }

    /// Create a registry holding the embedded CRDs
    pub fn with_builtins(prefix: impl Into<String>) -> Result<Self> {
        let mut registry = Self::new(prefix);
        for crd in builtin_crds()? {
            registry.add_crd(&crd);
        }
        Ok(registry)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Register every usable version of a CRD, returning how many types were added
    pub fn add_crd(&mut self, crd: &CrdSchema) -> usize {
        let definitions = ResourceDefinition::from_crd(crd, &self.prefix);
        let count = definitions.len();
        for definition in definitions {
            debug!(type_name = %definition.type_name, crd = %crd.name, "registering resource type");
            if let Some(previous) = self
                .definitions
                .insert(definition.type_name.clone(), Arc::new(definition))
            {
                warn!(
                    type_name = %previous.type_name,
                    crd = %previous.crd_name,
                    "resource type registered twice, keeping the latest definition"
                );
            }
        }
        count
    }

    /// Register all CRDs of a (multi-document) YAML string
    pub fn load_yaml(&mut self, yaml: &str) -> Result<usize> {
        let crds = CrdParser::parse_documents(yaml)?;
        Ok(crds.iter().map(|crd| self.add_crd(crd)).sum())
    }

    /// Register CRDs from a file, or from every YAML/JSON file below a directory
    pub fn load_path(&mut self, path: &Path) -> Result<usize> {
        if path.is_file() {
            return self.load_file(path);
        }
        if !path.is_dir() {
            return Err(KubeError::CrdLoad {
                path: path.display().to_string(),
                message: "no such file or directory".to_string(),
            });
        }

        let mut count = 0;
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|e| KubeError::CrdLoad {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            if entry.file_type().is_file() && is_manifest_file(entry.path()) {
                count += self.load_file(entry.path())?;
            }
        }
        Ok(count)
    }

    fn load_file(&mut self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path)?;
        self.load_yaml(&content).map_err(|e| KubeError::CrdLoad {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Look up a resource type
    pub fn get(&self, type_name: &str) -> Result<Arc<ResourceDefinition>> {
        self.definitions
            .get(type_name)
            .cloned()
            .ok_or_else(|| KubeError::UnknownResourceType {
                name: type_name.to_string(),
                suggestion: self.suggest(type_name),
            })
    }

    /// Look up the resource type behind a manifest data source name
    ///
    /// Accepts both `<type>_manifest` and the plain resource type name.
    pub fn get_manifest(&self, name: &str) -> Result<Arc<ResourceDefinition>> {
        match name.strip_suffix(MANIFEST_SUFFIX) {
            Some(type_name) if self.definitions.contains_key(type_name) => self.get(type_name),
            _ => self.get(name),
        }
    }

    /// Closest registered type name, if any is close enough
    pub fn suggest(&self, type_name: &str) -> Option<String> {
        self.definitions
            .keys()
            .map(|candidate| (strsim::levenshtein(type_name, candidate), candidate))
            .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, candidate)| candidate.clone())
    }

    pub fn definitions(&self) -> impl Iterator<Item = &Arc<ResourceDefinition>> {
        self.definitions.values()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

fn is_manifest_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml" | "json")
    )
}
