//! Resource loaders: where translation bundles and the language catalog
//! come from.
//!
//! The engine never knows about file layout. It asks its `ResourceLoader`
//! for one `(language, namespace)` bundle at a time, only when that bundle
//! is needed.

use crate::error::{I18nError, I18nResult};
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// File name of the language catalog, relative to the locales root.
pub const CATALOG_FILE: &str = "languages.json";

/// Lazily loads translation bundles and the language catalog.
pub trait ResourceLoader: Send + Sync {
    /// Load the bundle for one language/namespace pair.
    fn load<'a>(&'a self, language: &'a str, namespace: &'a str) -> BoxFuture<'a, I18nResult<Value>>;

    /// Load the raw language catalog.
    fn load_catalog(&self) -> BoxFuture<'_, I18nResult<Value>>;
}

/// Reads `{root}/{language}/{namespace}.json` and `{root}/languages.json`.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a bundle, or `None` if either segment would escape the root.
    pub fn resource_path(&self, language: &str, namespace: &str) -> Option<PathBuf> {
        if !is_plain_segment(language) || !is_plain_segment(namespace) {
            return None;
        }
        Some(self.root.join(language).join(format!("{}.json", namespace)))
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.root.join(CATALOG_FILE)
    }
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\'])
}

impl ResourceLoader for FsLoader {
    fn load<'a>(&'a self, language: &'a str, namespace: &'a str) -> BoxFuture<'a, I18nResult<Value>> {
        Box::pin(async move {
            let not_found = || I18nError::ResourceNotFound {
                language: language.to_string(),
                namespace: namespace.to_string(),
            };
            let path = self.resource_path(language, namespace).ok_or_else(not_found)?;
            debug!("Loading translation bundle from {}", path.display());

            let contents = tokio::fs::read_to_string(&path).await.map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    not_found()
                } else {
                    I18nError::ResourceRead {
                        language: language.to_string(),
                        namespace: namespace.to_string(),
                        source,
                    }
                }
            })?;

            serde_json::from_str(&contents).map_err(|source| I18nError::ResourceParse {
                language: language.to_string(),
                namespace: namespace.to_string(),
                source,
            })
        })
    }

    fn load_catalog(&self) -> BoxFuture<'_, I18nResult<Value>> {
        Box::pin(async move {
            let path = self.catalog_path();
            let location = path.display().to_string();

            let contents = tokio::fs::read_to_string(&path).await.map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    I18nError::CatalogNotFound(location.clone())
                } else {
                    I18nError::CatalogRead {
                        location: location.clone(),
                        source,
                    }
                }
            })?;

            serde_json::from_str(&contents)
                .map_err(|e| I18nError::CatalogParse(format!("{}: {}", location, e)))
        })
    }
}

/// Loader backed by a closure mapping `(language, namespace)` to a future.
///
/// The catalog, if any, is supplied up front with `with_catalog`.
pub struct FnLoader<F> {
    load: F,
    catalog: Option<Value>,
}

impl<F, Fut> FnLoader<F>
where
    F: Fn(String, String) -> Fut + Send + Sync,
    Fut: Future<Output = I18nResult<Value>> + Send + 'static,
{
    pub fn new(load: F) -> Self {
        Self {
            load,
            catalog: None,
        }
    }

    pub fn with_catalog(mut self, catalog: Value) -> Self {
        self.catalog = Some(catalog);
        self
    }
}

impl<F, Fut> ResourceLoader for FnLoader<F>
where
    F: Fn(String, String) -> Fut + Send + Sync,
    Fut: Future<Output = I18nResult<Value>> + Send + 'static,
{
    fn load<'a>(&'a self, language: &'a str, namespace: &'a str) -> BoxFuture<'a, I18nResult<Value>> {
        Box::pin((self.load)(language.to_string(), namespace.to_string()))
    }

    fn load_catalog(&self) -> BoxFuture<'_, I18nResult<Value>> {
        let catalog = self.catalog.clone();
        Box::pin(async move {
            catalog.ok_or_else(|| I18nError::CatalogNotFound(CATALOG_FILE.to_string()))
        })
    }
}

/// Loader serving bundles from memory. Counts every load request.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    bundles: HashMap<(String, String), Value>,
    catalog: Option<Value>,
    requests: AtomicUsize,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bundle(mut self, language: &str, namespace: &str, bundle: Value) -> Self {
        self.bundles
            .insert((language.to_string(), namespace.to_string()), bundle);
        self
    }

    pub fn with_catalog(mut self, catalog: Value) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Number of `load` calls served so far, successful or not.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

impl ResourceLoader for MemoryLoader {
    fn load<'a>(&'a self, language: &'a str, namespace: &'a str) -> BoxFuture<'a, I18nResult<Value>> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let bundle = self
            .bundles
            .get(&(language.to_string(), namespace.to_string()))
            .cloned();
        Box::pin(async move {
            bundle.ok_or_else(|| I18nError::ResourceNotFound {
                language: language.to_string(),
                namespace: namespace.to_string(),
            })
        })
    }

    fn load_catalog(&self) -> BoxFuture<'_, I18nResult<Value>> {
        let catalog = self.catalog.clone();
        Box::pin(async move {
            catalog.ok_or_else(|| I18nError::CatalogNotFound(CATALOG_FILE.to_string()))
        })
    }
}
