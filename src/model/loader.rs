//! Service model loader for local JSON/YAML definitions, with an LRU cache.

use crate::model::{ModelError, ServiceModel};
use lru::LruCache;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const DEFAULT_CACHE_SIZE: usize = 64;

/// Loads service models by name from a directory tree laid out as
/// `{root}/{service}/service.json` (preferred) or `{root}/{service}/service.yaml`.
pub struct ServiceModelLoader {
    base_path: Option<PathBuf>,
    cache: Mutex<LruCache<String, Arc<ServiceModel>>>,
}

impl ServiceModelLoader {
    pub fn new() -> Self {
        let size = std::num::NonZeroUsize::new(DEFAULT_CACHE_SIZE).unwrap_or(std::num::NonZeroUsize::MIN);
        Self {
            base_path: None,
            cache: Mutex::new(LruCache::new(size)),
        }
    }

    /// Set base path for service model files
    pub fn with_base_path(mut self, path: impl AsRef<Path>) -> Self {
        self.base_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load a service model by name, consulting the cache first.
    pub async fn load_service(&self, service: &str) -> Result<Arc<ServiceModel>, ModelError> {
        {
            let mut cache = self.cache.lock().map_err(|e| {
                ModelError::Internal(format!(
                    "Failed to acquire cache lock while loading service '{}': {}",
                    service, e
                ))
            })?;
            if let Some(model) = cache.get(service) {
                return Ok(model.clone());
            }
        }

        let model = Arc::new(self.locate_and_load(service).await?);

        {
            let mut cache = self.cache.lock().map_err(|e| {
                ModelError::Internal(format!(
                    "Failed to acquire cache lock while caching service '{}': {}",
                    service, e
                ))
            })?;
            cache.put(service.to_string(), model.clone());
        }

        Ok(model)
    }

    async fn locate_and_load(&self, service: &str) -> Result<ServiceModel, ModelError> {
        let mut roots: Vec<PathBuf> = Vec::new();
        if let Some(ref base) = self.base_path {
            roots.push(base.clone());
        }
        if let Ok(dir) = std::env::var("SVC_MODEL_DIR") {
            roots.push(PathBuf::from(dir));
        }
        roots.push(PathBuf::from("models"));

        for root in roots {
            let dir = root.join(service);
            for file in ["service.json", "service.yaml", "service.yml"] {
                let candidate = dir.join(file);
                if candidate.exists() {
                    return self.load_from_file(&candidate).await;
                }
            }
        }

        Err(ModelError::NotFound {
            id: service.to_string(),
            hint: Some(format!(
                "Check that '{}/service.json' or '{}/service.yaml' exists under your model directory (SVC_MODEL_DIR)",
                service, service
            )),
        })
    }

    /// Load a single model file; the extension selects JSON or YAML.
    pub async fn load_from_file(&self, path: &Path) -> Result<ServiceModel, ModelError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ModelError::LoadError {
                path: path.to_string_lossy().to_string(),
                reason: e.to_string(),
                hint: Some("Check if the file exists and you have read permissions.".to_string()),
            })?;

        // Tolerate a UTF-8 BOM
        let bytes = bytes
            .strip_prefix(&[0xEF, 0xBB, 0xBF])
            .map(|b| b.to_vec())
            .unwrap_or(bytes);
        let content = String::from_utf8(bytes).map_err(|e| ModelError::LoadError {
            path: path.to_string_lossy().to_string(),
            reason: format!("Invalid UTF-8: {}", e),
            hint: None,
        })?;

        let is_yaml = path
            .extension()
            .map(|ext| ext == "yaml" || ext == "yml")
            .unwrap_or(false);

        let model = if is_yaml {
            ServiceModel::from_yaml_str(&content)
        } else {
            ServiceModel::from_json_str(&content)
        };
        model.map_err(|e| match e {
            ModelError::ValidationError(_) | ModelError::YamlError(_) => ModelError::LoadError {
                path: path.to_string_lossy().to_string(),
                reason: e.to_string(),
                hint: None,
            },
            other => other,
        })
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for ServiceModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("svc-model-{}-{}", tag, uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn loads_and_caches_json_model() {
        let root = temp_root("json");
        std::fs::create_dir_all(root.join("queue")).unwrap();
        std::fs::write(
            root.join("queue").join("service.json"),
            r#"{"metadata": {"endpointPrefix": "queue", "protocol": "json"}, "operations": {"SendMessage": {}}}"#,
        )
        .unwrap();

        let loader = ServiceModelLoader::new().with_base_path(&root);
        let first = loader.load_service("queue").await.unwrap();
        assert_eq!(first.endpoint_prefix(), "queue");
        assert_eq!(loader.cached_len(), 1);

        let second = loader.load_service("queue").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn loads_yaml_fallback() {
        let root = temp_root("yaml");
        std::fs::create_dir_all(root.join("table")).unwrap();
        std::fs::write(
            root.join("table").join("service.yaml"),
            "metadata:\n  endpointPrefix: table\n  protocol: json\noperations:\n  Scan: {}\n",
        )
        .unwrap();

        let loader = ServiceModelLoader::new().with_base_path(&root);
        let model = loader.load_service("table").await.unwrap();
        assert!(model.operation_model("Scan").is_ok());

        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn missing_service_has_hint() {
        let root = temp_root("missing");
        let loader = ServiceModelLoader::new().with_base_path(&root);
        let err = loader.load_service("nope").await.unwrap_err();
        assert!(matches!(err, ModelError::NotFound { ref id, hint: Some(_) } if id == "nope"));
        std::fs::remove_dir_all(root).ok();
    }
}
