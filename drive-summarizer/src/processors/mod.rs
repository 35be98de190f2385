pub mod image;
pub mod pdf;
pub mod text;

pub use self::image::ImageProcessor;
pub use self::pdf::PdfProcessor;
pub use self::text::TextProcessor;

use crate::traits::Processor;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Extension to processor table
pub struct ProcessorRegistry {
    processors: HashMap<String, Arc<dyn Processor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self {
            processors: HashMap::new(),
        }
    }

    /// Register `processor` for an extension given with or without the dot.
    pub fn register(&mut self, extension: &str, processor: Arc<dyn Processor>) {
        let extension = normalize_extension(extension);
        debug!("Registered {} for extension '{}'", processor.processor_name(), extension);
        self.processors.insert(extension, processor);
    }

    pub fn for_path(&self, path: &Path) -> Option<Arc<dyn Processor>> {
        let extension = path.extension()?.to_str()?;
        self.processors.get(&normalize_extension(extension)).cloned()
    }

    pub fn extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self.processors.keys().cloned().collect();
        extensions.sort();
        extensions
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        let mut registry = Self::new();

        let text: Arc<dyn Processor> = Arc::new(TextProcessor);
        for extension in TextProcessor::EXTENSIONS {
            registry.register(extension, text.clone());
        }

        registry.register("pdf", Arc::new(PdfProcessor));

        let image: Arc<dyn Processor> = Arc::new(ImageProcessor::default());
        for extension in ImageProcessor::EXTENSIONS {
            registry.register(extension, image.clone());
        }

        registry
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_lowercase()
}
