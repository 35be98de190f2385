use drive_summarizer::{
    Artifact, ErrorKind, Invoker, MockReply, MockTransport, Modality, ModelRegistry, ModelSpec,
    PartialEntry, RetryPolicy, StatusPolicy, Summarizer, SummarizerConfig, SummarizerError,
};
use std::sync::{Arc, Once};
use std::time::Duration;
use tracing::info;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();
    });
}

fn summarizer(transport: &Arc<MockTransport>) -> Summarizer {
    let invoker = Invoker::new(
        transport.clone(),
        ModelRegistry::new(
            vec![ModelSpec::new("text-a", Modality::Text)],
            vec![ModelSpec::new("vision-a", Modality::Image)],
        ),
        RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
        },
        StatusPolicy::default(),
    );
    Summarizer::new(invoker, &SummarizerConfig::default())
}

fn fake_png() -> Vec<u8> {
    vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]
}

#[tokio::test]
async fn test_text_and_image_take_three_calls() {
    init_tracing();
    let transport = Arc::new(MockTransport::new());
    let summarizer = summarizer(&transport);
    let artifacts = vec![Artifact::text("a.txt", "hello"), Artifact::image("b.png", fake_png())];

    let summary = summarizer.summarize(&artifacts).await.expect("summary");
    info!("Summary: {}", summary);

    assert_eq!(transport.call_count(), 3);
    let modalities: Vec<Modality> = transport.calls().iter().map(|c| c.modality).collect();
    assert_eq!(modalities, vec![Modality::Text, Modality::Image, Modality::Text]);
    assert_eq!(transport.models_called(), vec!["text-a", "vision-a", "text-a"]);

    assert!(!summary.is_empty());
    assert!(summary.contains("a.txt"));
    assert!(summary.contains("b.png"));
    assert!(summary.contains("hello"));
}

#[tokio::test]
async fn test_failed_artifact_is_flagged_and_run_completes() {
    init_tracing();
    let transport = Arc::new(MockTransport::new().script(
        "text-a",
        [
            MockReply::Text("notes about a".to_string()),
            MockReply::Status(403),
            MockReply::Text("folder overview".to_string()),
        ],
    ));
    let summarizer = summarizer(&transport);
    let artifacts = vec![
        Artifact::text("a.txt", "alpha"),
        Artifact::text("c.pdf", "garbled"),
    ];

    let report = summarizer.summarize_report(&artifacts).await.expect("report");

    assert_eq!(report.summary, "folder overview");
    assert_eq!(report.model, "text-a");
    assert_eq!(report.unavailable(), vec!["c.pdf"]);
    assert_eq!(
        report.partials.get("a.txt"),
        Some(&PartialEntry::Extracted("notes about a".to_string()))
    );

    let aggregation_prompt = transport.calls().last().map(|c| c.prompt.clone()).unwrap_or_default();
    assert!(aggregation_prompt.contains("### File: c.pdf"));
    assert!(aggregation_prompt.contains(PartialEntry::PLACEHOLDER));
    assert!(aggregation_prompt.contains("notes about a"));
}

#[tokio::test]
async fn test_partials_keep_collection_order() {
    init_tracing();
    let transport = Arc::new(MockTransport::new().always("vision-a", MockReply::Status(404)));
    let summarizer = summarizer(&transport);
    let artifacts = vec![
        Artifact::text("z.txt", "last letter"),
        Artifact::image("m.png", fake_png()),
        Artifact::text("a.txt", "first letter"),
        Artifact::text("a.txt", "same name, other folder"),
    ];

    let partials = summarizer.extract_partials(&artifacts).await;

    assert_eq!(partials.len(), artifacts.len());
    assert_eq!(partials.identifiers(), vec!["z.txt", "m.png", "a.txt", "a.txt#2"]);
    assert!(!partials.get("m.png").map(PartialEntry::is_extracted).unwrap_or(true));
    assert_eq!(partials.extracted_count(), 3);
}

#[tokio::test]
async fn test_empty_input_is_rejected() {
    init_tracing();
    let transport = Arc::new(MockTransport::new());
    let summarizer = summarizer(&transport);

    let result = summarizer.summarize(&[]).await;

    assert!(matches!(result, Err(SummarizerError::InvalidInput(_))));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_nothing_extracted_skips_aggregation() {
    init_tracing();
    let transport = Arc::new(
        MockTransport::new()
            .always("text-a", MockReply::Status(403))
            .always("vision-a", MockReply::Empty),
    );
    let summarizer = summarizer(&transport);
    let artifacts = vec![Artifact::text("a.txt", "alpha"), Artifact::image("b.png", fake_png())];

    let result = summarizer.summarize(&artifacts).await;

    assert!(matches!(result, Err(SummarizerError::NothingExtracted)));
    assert_eq!(transport.call_count(), 2, "one call per artifact, no aggregation");
}

#[tokio::test]
async fn test_aggregation_failure_fails_the_run() {
    init_tracing();
    let transport = Arc::new(MockTransport::new().script(
        "text-a",
        [MockReply::Text("notes".to_string()), MockReply::Status(500)],
    ));
    let summarizer = summarizer(&transport);

    let result = summarizer.summarize(&[Artifact::text("a.txt", "alpha")]).await;

    match result {
        Err(SummarizerError::Aggregation { kind, reason }) => {
            assert_eq!(kind, ErrorKind::AllModelsExhausted);
            assert!(reason.contains("500"), "reason: {}", reason);
        }
        other => panic!("expected aggregation failure, got {:?}", other.map(|_| ())),
    }
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn test_long_content_is_truncated_before_sending() {
    init_tracing();
    let transport = Arc::new(MockTransport::new());
    let invoker = Invoker::new(
        transport.clone(),
        ModelRegistry::new(vec![ModelSpec::new("text-a", Modality::Text)], Vec::new()),
        RetryPolicy::default(),
        StatusPolicy::default(),
    );
    let config = SummarizerConfig {
        language: "English".to_string(),
        max_chars_per_artifact: 50,
    };
    let summarizer = Summarizer::new(invoker, &config);
    let long_text = "ж".repeat(500);

    let partials = summarizer.extract_partials(&[Artifact::text("long.txt", long_text.clone())]).await;

    assert_eq!(partials.len(), 1);
    let prompt = transport.calls()[0].prompt.clone();
    assert!(!prompt.contains(&long_text));
    assert!(prompt.contains(&"ж".repeat(50)));
    assert!(prompt.contains("content truncated"));
    assert!(prompt.contains("English"));
}
