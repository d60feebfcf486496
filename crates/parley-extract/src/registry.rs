//! Extractor registry for dispatching file processing.

use std::collections::HashMap;
use std::sync::Arc;

use parley_core::{ContentExtractor, ExtractionOutcome, ExtractionStrategy, Result};

/// Registry mapping extraction strategies to their extractor implementations.
pub struct ExtractorRegistry {
    extractors: HashMap<ExtractionStrategy, Arc<dyn ContentExtractor>>,
}

impl ExtractorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Register an extractor. Replaces any existing extractor for the same
    /// strategy.
    pub fn register(&mut self, extractor: Arc<dyn ContentExtractor>) {
        self.extractors.insert(extractor.strategy(), extractor);
    }

    /// Extract content using the extractor registered for the strategy.
    pub async fn extract(
        &self,
        strategy: ExtractionStrategy,
        data: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> Result<ExtractionOutcome> {
        let extractor = self.extractors.get(&strategy).ok_or_else(|| {
            parley_core::Error::Internal(format!(
                "No extractor registered for strategy: {:?}",
                strategy
            ))
        })?;
        extractor.extract(data, filename, mime_type).await
    }

    /// List all strategies that have registered extractors.
    pub fn available_strategies(&self) -> Vec<ExtractionStrategy> {
        self.extractors.keys().copied().collect()
    }

    /// Check if an extractor is registered for the given strategy.
    pub fn has_extractor(&self, strategy: ExtractionStrategy) -> bool {
        self.extractors.contains_key(&strategy)
    }

    /// Run health checks on all registered extractors.
    pub async fn health_check_all(&self) -> HashMap<ExtractionStrategy, bool> {
        let mut results = HashMap::new();
        for (strategy, extractor) in &self.extractors {
            let healthy = extractor.health_check().await.unwrap_or(false);
            results.insert(*strategy, healthy);
        }
        results
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
