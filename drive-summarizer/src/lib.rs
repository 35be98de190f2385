pub mod types;
pub mod traits;
pub mod utils;
pub mod registry;
pub mod request;
pub mod llm_adapter;
pub mod transport;
pub mod processors;
pub mod collector;
pub mod downloader;
pub mod summarizer;

pub use types::*;
pub use traits::{Processor, Transport, TransportError};
pub use registry::ModelRegistry;
pub use request::RequestBuilder;
pub use llm_adapter::{
    FailureClass, FallbackState, Invoker, MockReply, MockTransport, RetryPolicy, StatusPolicy,
    Transition,
};
pub use transport::OpenRouterTransport;
pub use processors::{ImageProcessor, PdfProcessor, ProcessorRegistry, TextProcessor};
pub use collector::{CollectedFolder, FolderCollector, SkippedFile};
pub use downloader::Downloader;
pub use summarizer::{PartialEntry, PartialSummary, Summarizer, SummaryReport};
