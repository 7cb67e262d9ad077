//! The engine registry: name → backend, populated once at startup.
//!
//! Lookups are exact and case-sensitive. The map never changes after
//! construction, so concurrent readers need no locking.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::GatewayConfig;
use crate::engine::SpeechEngine;
use crate::engine::http::HttpEngine;
use crate::error::GatewayError;

/// Static metadata describing a registered engine.
#[derive(Debug, Clone, Serialize)]
pub struct EngineDescriptor {
    pub name: String,
    pub display_name: String,
    pub description: String,
    /// Where the backend lives. Opaque to the dispatcher; shown in logs
    /// and the engine listing.
    pub invocation_target: String,
    pub supported_formats: Vec<String>,
    pub voices: Vec<String>,
    pub languages: Vec<String>,
}

/// A descriptor paired with the backend that serves it.
pub struct RegisteredEngine {
    pub descriptor: EngineDescriptor,
    pub backend: Arc<dyn SpeechEngine>,
}

impl std::fmt::Debug for RegisteredEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredEngine")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

pub struct EngineRegistry {
    engines: HashMap<String, RegisteredEngine>,
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self {
            engines: HashMap::new(),
        }
    }

    /// Builder-style registration, used at startup and by tests.
    pub fn register(
        mut self,
        descriptor: EngineDescriptor,
        backend: Arc<dyn SpeechEngine>,
    ) -> Self {
        self.engines.insert(
            descriptor.name.clone(),
            RegisteredEngine {
                descriptor,
                backend,
            },
        );
        self
    }

    /// Wire up one HTTP backend per endpoint the config carries.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let mut registry = Self::new();
        for endpoint in &config.engines {
            let descriptor = builtin_descriptor(&endpoint.name, &endpoint.url);
            let backend = Arc::new(HttpEngine::new(
                endpoint.url.clone(),
                config.backend_api_key.clone(),
            ));
            registry = registry.register(descriptor, backend);
        }
        registry
    }

    pub fn resolve(&self, name: &str) -> Result<&RegisteredEngine, GatewayError> {
        self.engines
            .get(name)
            .ok_or_else(|| GatewayError::UnknownEngine(name.to_string()))
    }

    /// Registered engine names, sorted for stable output.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.engines.keys().cloned().collect();
        names.sort();
        names
    }

    /// All descriptors, sorted by name.
    pub fn descriptors(&self) -> Vec<&EngineDescriptor> {
        let mut all: Vec<&EngineDescriptor> =
            self.engines.values().map(|e| &e.descriptor).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

/// Capability metadata for the engines this deployment knows how to run.
fn builtin_descriptor(name: &str, url: &str) -> EngineDescriptor {
    let (display_name, description, voices, languages) = match name {
        "kokkoro" => (
            "Kokkoro TTS",
            "High-quality neural TTS model",
            vec!["default", "female1", "male1"],
            vec!["en", "ja"],
        ),
        "chatterbox" => (
            "Chatterbox TTS",
            "Fast and efficient TTS model",
            vec!["default", "casual", "formal"],
            vec!["en"],
        ),
        _ => ("", "Custom TTS engine", vec!["default"], vec!["en"]),
    };

    EngineDescriptor {
        name: name.to_string(),
        display_name: if display_name.is_empty() {
            name.to_string()
        } else {
            display_name.to_string()
        },
        description: description.to_string(),
        invocation_target: url.to_string(),
        supported_formats: vec!["mp3".to_string(), "wav".to_string()],
        voices: voices.into_iter().map(String::from).collect(),
        languages: languages.into_iter().map(String::from).collect(),
    }
}
