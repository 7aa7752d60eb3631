//! End-to-end tests for the answer pipeline.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mojo_rag::{
    AnswerPipeline, DocumentStore, Embedder, Embedding, Generator, Passage, Prompt,
    PromptAssembler, RagConfig, RagError, Result, Retriever, RetryPolicy, TermHashEmbedder,
};

fn mojo_corpus() -> Vec<Passage> {
    vec![
        Passage::new("1", "Mojo is a language by Modular.", "answers"),
        Passage::new("2", "Mojo targets AI workloads.", "answers"),
        Passage::new("3", "Mojo interops with Python.", "answers"),
    ]
}

/// Returns a fixed answer and records every prompt it receives.
#[derive(Default)]
struct RecordingGenerator {
    prompts: Mutex<Vec<Prompt>>,
}

#[async_trait]
impl Generator for RecordingGenerator {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.clone());
        Ok("Mojo was created by Modular.".to_string())
    }
}

/// Always fails with a service error.
struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &Prompt) -> Result<String> {
        Err(RagError::GenerationServiceError {
            provider: "failing".into(),
            message: "503 Service Unavailable".into(),
        })
    }
}

/// Never answers.
struct StalledGenerator;

#[async_trait]
impl Generator for StalledGenerator {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn generate(&self, _prompt: &Prompt) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok("too late".into())
    }
}

/// Embeds passages fine but fails on anything that looks like a question.
struct QuestionAllergicEmbedder {
    inner: TermHashEmbedder,
}

#[async_trait]
impl Embedder for QuestionAllergicEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        if text.ends_with('?') {
            return Err(RagError::EmbeddingServiceError {
                provider: "allergic".into(),
                message: "embedding service unavailable".into(),
            });
        }
        self.inner.embed(text).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

/// Declares one dimension but produces another for long texts.
struct InconsistentEmbedder;

#[async_trait]
impl Embedder for InconsistentEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        Ok(if text.len() > 26 { vec![1.0; 3] } else { vec![1.0; 4] })
    }

    fn dimensions(&self) -> usize {
        4
    }
}

async fn pipeline_with(generator: Arc<dyn Generator>, config: RagConfig) -> AnswerPipeline {
    AnswerPipeline::builder()
        .config(config)
        .embedder(Arc::new(TermHashEmbedder::default()))
        .generator(generator)
        .passages(mojo_corpus())
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn who_made_mojo_ranks_the_modular_passage_first() {
    let embedder: Arc<dyn Embedder> = Arc::new(TermHashEmbedder::default());
    let store = Arc::new(DocumentStore::build(mojo_corpus(), &*embedder).await.unwrap());
    let retriever = Retriever::new(embedder, store);

    let result = retriever.retrieve_default("Who made Mojo?").await.unwrap();
    assert_eq!(result.len(), 3);
    assert_eq!(result.top().map(|p| p.id.as_str()), Some("1"));
}

#[tokio::test]
async fn answer_returns_generated_text() {
    let generator = Arc::new(RecordingGenerator::default());
    let pipeline = pipeline_with(generator.clone(), RagConfig::default()).await;

    let answer = pipeline.answer("Who made Mojo?").await.unwrap();
    assert!(!answer.is_empty());
    assert!(!answer.contains("Error"));
    assert_eq!(generator.prompts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn prompt_carries_question_and_passages_in_rank_order() {
    let generator = Arc::new(RecordingGenerator::default());
    let pipeline = pipeline_with(generator.clone(), RagConfig::default()).await;

    let answer = pipeline.answer_with_context("Who made Mojo?").await.unwrap();
    let prompt = answer.prompt.as_str();
    assert!(prompt.contains("Who made Mojo?"));

    let positions: Vec<usize> =
        answer.context.texts().iter().map(|text| prompt.find(text).unwrap()).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "passages out of order: {positions:?}");

    let expected =
        PromptAssembler::default().assemble("Who made Mojo?", &answer.context.texts());
    assert_eq!(answer.prompt, expected);
    assert_eq!(generator.prompts.lock().unwrap()[0], expected);
}

#[tokio::test]
async fn top_k_limits_the_context() {
    let config = RagConfig::builder().top_k(1).build().unwrap();
    let pipeline = pipeline_with(Arc::new(RecordingGenerator::default()), config).await;

    let answer = pipeline.answer_with_context("Does Mojo work with Python?").await.unwrap();
    assert_eq!(answer.context.len(), 1);
    assert_eq!(answer.context.top().map(|p| p.id.as_str()), Some("3"));
}

#[tokio::test]
async fn similarity_threshold_drops_unrelated_passages() {
    let config = RagConfig::builder().similarity_threshold(0.3).build().unwrap();
    let pipeline = pipeline_with(Arc::new(RecordingGenerator::default()), config).await;

    let answer = pipeline.answer_with_context("Python interop").await.unwrap();
    let ids: Vec<&str> = answer.context.passages().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["3"]);
}

#[tokio::test]
async fn generation_errors_propagate_unchanged() {
    let pipeline = pipeline_with(Arc::new(FailingGenerator), RagConfig::default()).await;

    let err = pipeline.answer("Who made Mojo?").await.unwrap_err();
    match err {
        RagError::GenerationServiceError { provider, message } => {
            assert_eq!(provider, "failing");
            assert_eq!(message, "503 Service Unavailable");
        }
        other => panic!("expected GenerationServiceError, got {other:?}"),
    }
}

#[tokio::test]
async fn embedding_errors_propagate_unchanged() {
    let pipeline = AnswerPipeline::builder()
        .embedder(Arc::new(QuestionAllergicEmbedder { inner: TermHashEmbedder::default() }))
        .generator(Arc::new(RecordingGenerator::default()))
        .passages(mojo_corpus())
        .build()
        .await
        .unwrap();

    let err = pipeline.answer("Who made Mojo?").await.unwrap_err();
    assert!(matches!(
        err,
        RagError::EmbeddingServiceError { ref provider, .. } if provider == "allergic"
    ));
}

#[tokio::test(start_paused = true)]
async fn configured_timeout_surfaces_as_timeout_error() {
    let config =
        RagConfig::builder().generation_timeout(Duration::from_secs(30)).build().unwrap();
    let pipeline = pipeline_with(Arc::new(StalledGenerator), config).await;

    let err = pipeline.answer("Who made Mojo?").await.unwrap_err();
    assert!(matches!(err, RagError::GenerationTimeoutError { .. }));
}

#[tokio::test(start_paused = true)]
async fn retries_do_not_mask_a_persistent_failure() {
    let config = RagConfig::builder()
        .retry(RetryPolicy::exponential(3, Duration::from_millis(50)))
        .build()
        .unwrap();
    let pipeline = pipeline_with(Arc::new(FailingGenerator), config).await;

    let err = pipeline.answer("Who made Mojo?").await.unwrap_err();
    assert!(matches!(err, RagError::GenerationServiceError { .. }));
}

#[tokio::test]
async fn empty_corpus_fails_at_build() {
    let err = AnswerPipeline::builder()
        .embedder(Arc::new(TermHashEmbedder::default()))
        .generator(Arc::new(RecordingGenerator::default()))
        .passages(Vec::new())
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::EmptyCorpusError));
}

#[tokio::test]
async fn inconsistent_embedder_fails_at_build() {
    let err = AnswerPipeline::builder()
        .embedder(Arc::new(InconsistentEmbedder))
        .generator(Arc::new(RecordingGenerator::default()))
        .passages(mojo_corpus())
        .build()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RagError::DimensionMismatchError { expected: 4, actual: 3, passage_id: Some(ref id) }
            if id == "1"
    ));
}

#[tokio::test]
async fn builder_requires_a_generator() {
    let err = AnswerPipeline::builder()
        .embedder(Arc::new(TermHashEmbedder::default()))
        .passages(mojo_corpus())
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::ConfigError(_)));
}

#[tokio::test]
async fn prebuilt_store_dimension_must_match_embedder() {
    let store = DocumentStore::build(mojo_corpus(), &TermHashEmbedder::new(32)).await.unwrap();
    let err = AnswerPipeline::builder()
        .embedder(Arc::new(TermHashEmbedder::new(64)))
        .generator(Arc::new(RecordingGenerator::default()))
        .store(Arc::new(store))
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::ConfigError(_)));
}

#[tokio::test]
async fn concurrent_questions_share_one_pipeline() {
    let generator = Arc::new(RecordingGenerator::default());
    let pipeline = Arc::new(pipeline_with(generator.clone(), RagConfig::default()).await);

    let questions =
        ["Who made Mojo?", "What does Mojo target?", "Does Mojo interop with Python?"];
    let handles: Vec<_> = questions
        .into_iter()
        .map(|q| {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move { pipeline.answer(q).await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
    assert_eq!(generator.prompts.lock().unwrap().len(), questions.len());
}

#[tokio::test]
async fn every_passage_retrieves_itself_by_text() {
    let embedder: Arc<dyn Embedder> = Arc::new(TermHashEmbedder::default());
    let store = Arc::new(DocumentStore::build(mojo_corpus(), &*embedder).await.unwrap());
    let retriever = Retriever::new(embedder, store);

    for passage in mojo_corpus() {
        let result = retriever.retrieve(&passage.text, 1).await.unwrap();
        assert_eq!(result.top(), Some(&passage));
    }
}

#[test]
fn assembling_is_repeatable_and_keeps_passage_order() {
    let assembler = PromptAssembler::default();
    let passages = ["Mojo interops with Python.", "Mojo is a language by Modular."];

    let first = assembler.assemble("Who made Mojo?", &passages);
    let second = assembler.assemble("Who made Mojo?", &passages);
    assert_eq!(first, second);

    let text = first.as_str();
    let python = text.find(passages[0]).unwrap();
    let modular = text.find(passages[1]).unwrap();
    assert!(python < modular);
}

#[tokio::test]
async fn unvalidated_zero_top_k_fails_at_build() {
    let err = AnswerPipeline::builder()
        .config(RagConfig { top_k: 0, ..RagConfig::default() })
        .embedder(Arc::new(TermHashEmbedder::default()))
        .generator(Arc::new(RecordingGenerator::default()))
        .passages(mojo_corpus())
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::InvalidKError { k: 0 }));
}
