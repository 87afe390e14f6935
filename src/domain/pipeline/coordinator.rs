//! Retrieval, generation and evaluation under one deadline

use std::fmt;
use std::time::Duration;

use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use super::error::PipelineError;
use super::result::{AnswerRequest, AnswerResult, SourceRef};
use crate::domain::evaluation::RelevanceEvaluator;
use crate::domain::generation::Generator;
use crate::domain::prompt::PromptBuilder;
use crate::domain::retrieval::QueryRouter;

/// Default time budget of a single answer
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);

/// Stages of an answer, in order; `Failed` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Routing,
    Retrieving,
    PromptBuilding,
    Generating,
    Evaluating,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Routing => "routing",
            Self::Retrieving => "retrieving",
            Self::PromptBuilding => "prompt_building",
            Self::Generating => "generating",
            Self::Evaluating => "evaluating",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the current stage of one answer
struct StageTracker {
    stage: PipelineStage,
}

impl StageTracker {
    fn new() -> Self {
        debug!(stage = %PipelineStage::Routing, "Pipeline started");
        Self {
            stage: PipelineStage::Routing,
        }
    }

    fn enter(&mut self, next: PipelineStage) {
        debug!(from = %self.stage, to = %next, "Pipeline transition");
        self.stage = next;
    }
}

/// Composes routing, retrieval, prompting, generation and evaluation
///
/// Stages run strictly in sequence with no retries. The pipeline holds only
/// shared read-only handles and can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct AnswerPipeline {
    router: QueryRouter,
    prompts: PromptBuilder,
    generator: Generator,
    evaluator: RelevanceEvaluator,
    deadline: Duration,
}

impl AnswerPipeline {
    pub fn new(
        router: QueryRouter,
        prompts: PromptBuilder,
        generator: Generator,
        evaluator: RelevanceEvaluator,
    ) -> Self {
        Self {
            router,
            prompts,
            generator,
            evaluator,
            deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Time budget applied by [`AnswerPipeline::answer`]
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn router(&self) -> &QueryRouter {
        &self.router
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn evaluator(&self) -> &RelevanceEvaluator {
        &self.evaluator
    }

    /// Answer within the configured time budget
    pub async fn answer(&self, request: AnswerRequest) -> Result<AnswerResult, PipelineError> {
        self.answer_by(request, Instant::now() + self.deadline).await
    }

    /// Answer, giving up once `deadline` passes
    pub async fn answer_by(
        &self,
        request: AnswerRequest,
        deadline: Instant,
    ) -> Result<AnswerResult, PipelineError> {
        let mut tracker = StageTracker::new();

        match self.run(&request, deadline, &mut tracker).await {
            Ok(result) => {
                tracker.enter(PipelineStage::Done);
                info!(
                    strategy = %result.strategy,
                    model = %result.model,
                    city = ?result.city,
                    latency = result.generation.latency_seconds,
                    relevance = %result.evaluation.relevance,
                    "Answer completed"
                );
                Ok(result)
            }
            Err(e) => {
                warn!(stage = %tracker.stage, error = %e, "Answer failed");
                tracker.enter(PipelineStage::Failed);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        request: &AnswerRequest,
        deadline: Instant,
        tracker: &mut StageTracker,
    ) -> Result<AnswerResult, PipelineError> {
        let strategy = self.router.resolve(request.strategy.as_deref());
        self.generator.allow_list().ensure(&request.model)?;
        let city = request.city.as_deref();

        tracker.enter(PipelineStage::Retrieving);
        let started = Instant::now();
        let retrieved = timeout_at(
            deadline,
            self.router.route(&request.question, city, strategy),
        )
        .await
        .map_err(|_| PipelineError::RetrievalTimeout { strategy })?
        .map_err(|source| PipelineError::Retrieval { strategy, source })?;
        let retrieval_seconds = started.elapsed().as_secs_f64();

        debug!(
            strategy = %strategy,
            documents = retrieved.len(),
            latency = retrieval_seconds,
            "Retrieval completed"
        );

        tracker.enter(PipelineStage::PromptBuilding);
        let prompt = self.prompts.build(&request.question, &retrieved);

        tracker.enter(PipelineStage::Generating);
        let generation = timeout_at(deadline, self.generator.generate(&prompt, &request.model))
            .await
            .map_err(|_| PipelineError::GenerationTimeout {
                model: request.model.clone(),
            })??;

        tracker.enter(PipelineStage::Evaluating);
        let evaluation = timeout_at(
            deadline,
            self.evaluator.evaluate(&request.question, &generation.answer),
        )
        .await
        .map_err(|_| PipelineError::EvaluationTimeout {
            model: self.evaluator.model().to_string(),
        })?;

        Ok(AnswerResult {
            question: request.question.clone(),
            city: request.city.clone(),
            strategy,
            model: request.model.clone(),
            generation,
            evaluation,
            sources: retrieved.documents().iter().map(SourceRef::from).collect(),
            retrieval_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::evaluation::{DEFAULT_EVALUATOR_MODEL, Relevance};
    use crate::domain::generation::ModelAllowList;
    use crate::domain::knowledge_base::Document;
    use crate::domain::llm::{MockLlmProvider, Usage, text_response};
    use crate::domain::retrieval::{SearchStrategy, StubStrategy, stub_router};

    const MODEL: &str = "mistral-small-latest";
    const GRADE: &str = r#"{"Relevance": "RELEVANT", "Explanation": "On topic."}"#;

    struct Fixture {
        local: Arc<StubStrategy>,
        keyword: Arc<StubStrategy>,
        provider: Arc<MockLlmProvider>,
        pipeline: AnswerPipeline,
    }

    fn cairo_docs() -> Vec<Document> {
        vec![
            Document::new("c1", "Cairo", "Eat", "Try koshary."),
            Document::new("c2", "Cairo", "See", "Visit Giza."),
        ]
    }

    fn fixture_with(provider: MockLlmProvider, hybrid: StubStrategy) -> Fixture {
        let local = Arc::new(
            StubStrategy::new(SearchStrategy::LexicalIndexLocal).with_documents(cairo_docs()),
        );
        let keyword =
            Arc::new(StubStrategy::new(SearchStrategy::Keyword).with_documents(cairo_docs()));
        let vector = Arc::new(StubStrategy::new(SearchStrategy::Vector));
        let router = stub_router(keyword.clone(), vector, Arc::new(hybrid), local.clone());

        let provider = Arc::new(provider);
        let generator = Generator::new(provider.clone(), ModelAllowList::default());
        let evaluator =
            RelevanceEvaluator::new(generator.clone(), DEFAULT_EVALUATOR_MODEL).unwrap();

        Fixture {
            local,
            keyword,
            provider,
            pipeline: AnswerPipeline::new(router, PromptBuilder::new(), generator, evaluator),
        }
    }

    fn fixture() -> Fixture {
        let provider = MockLlmProvider::new("mock")
            .with_model_response(MODEL, text_response("Eat koshary.", Some(Usage::new(300, 12))))
            .with_model_response(
                DEFAULT_EVALUATOR_MODEL,
                text_response(GRADE, Some(Usage::new(120, 9))),
            );
        fixture_with(provider, StubStrategy::new(SearchStrategy::HybridFusion))
    }

    #[tokio::test]
    async fn test_answer_end_to_end() {
        let f = fixture();
        let request = AnswerRequest::new("Where to eat?", MODEL)
            .with_city("Cairo")
            .with_strategy("keyword");

        let result = f.pipeline.answer(request).await.unwrap();

        assert_eq!(result.answer(), "Eat koshary.");
        assert_eq!(result.strategy, SearchStrategy::Keyword);
        assert_eq!(result.relevance(), Relevance::Relevant);
        assert_eq!(result.generation.usage.total_tokens, Some(312));
        assert_eq!(result.evaluation.usage.total_tokens, Some(129));
        assert_eq!(result.sources.len(), 2);
        assert_eq!(result.sources[0].rank, 1);
        assert_eq!(f.provider.call_count(), 2);

        let calls = f.keyword.calls();
        assert_eq!(calls, vec![("Where to eat?".to_string(), Some("Cairo".to_string()))]);

        let requests = f.provider.requests();
        assert_eq!(requests[0].0, MODEL);
        assert_eq!(requests[1].0, DEFAULT_EVALUATOR_MODEL);
    }

    #[tokio::test]
    async fn test_unknown_strategy_uses_default() {
        let f = fixture();
        let request = AnswerRequest::new("Where to eat?", MODEL).with_strategy("Bogus");

        let result = f.pipeline.answer(request).await.unwrap();

        assert_eq!(result.strategy, SearchStrategy::LexicalIndexLocal);
        assert_eq!(f.local.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_model_fails_before_any_call() {
        let f = fixture();
        let request = AnswerRequest::new("Where to eat?", "gpt-4");

        let err = f.pipeline.answer(request).await.unwrap_err();

        assert!(matches!(err, PipelineError::InvalidModelSelection { .. }));
        assert_eq!(f.provider.call_count(), 0);
        assert!(f.local.calls().is_empty());
    }

    #[tokio::test]
    async fn test_retrieval_failure_is_surfaced() {
        let provider = MockLlmProvider::new("mock").with_response(text_response("x", None));
        let f = fixture_with(
            provider,
            StubStrategy::new(SearchStrategy::HybridFusion).with_error("qdrant unavailable"),
        );
        let request = AnswerRequest::new("q", MODEL).with_strategy("hybrid_fusion");

        let err = f.pipeline.answer(request).await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Retrieval {
                strategy: SearchStrategy::HybridFusion,
                ..
            }
        ));
        assert_eq!(f.provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_retrieval_timeout() {
        let provider = MockLlmProvider::new("mock").with_response(text_response("x", None));
        let f = fixture_with(
            provider,
            StubStrategy::new(SearchStrategy::HybridFusion)
                .with_delay(Duration::from_millis(500)),
        );
        let request = AnswerRequest::new("q", MODEL).with_strategy("Qdrant");

        let err = f
            .pipeline
            .answer_by(request, Instant::now() + Duration::from_millis(20))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::RetrievalTimeout {
                strategy: SearchStrategy::HybridFusion
            }
        ));
        assert_eq!(f.provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generation_timeout() {
        let provider = MockLlmProvider::new("mock")
            .with_response(text_response("slow", None))
            .with_delay(Duration::from_millis(500));
        let f = fixture_with(provider, StubStrategy::new(SearchStrategy::HybridFusion));

        let err = f
            .pipeline
            .clone()
            .with_deadline(Duration::from_millis(50))
            .answer(AnswerRequest::new("q", MODEL))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::GenerationTimeout { .. }));
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_evaluation_timeout() {
        // each call takes 150ms: generation fits the 250ms deadline, grading does not
        let provider = MockLlmProvider::new("mock")
            .with_model_response(MODEL, text_response("Eat koshary.", None))
            .with_model_response(DEFAULT_EVALUATOR_MODEL, text_response(GRADE, None))
            .with_delay(Duration::from_millis(150));
        let f = fixture_with(provider, StubStrategy::new(SearchStrategy::HybridFusion));

        let err = f
            .pipeline
            .clone()
            .with_deadline(Duration::from_millis(250))
            .answer(AnswerRequest::new("q", MODEL))
            .await
            .unwrap_err();

        match &err {
            PipelineError::EvaluationTimeout { model } => {
                assert_eq!(model, DEFAULT_EVALUATOR_MODEL);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_timeout());
        assert_eq!(f.provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_generation_failure_is_surfaced() {
        let provider = MockLlmProvider::new("mock").with_error("model overloaded");
        let f = fixture_with(provider, StubStrategy::new(SearchStrategy::HybridFusion));

        let err = f
            .pipeline
            .answer(AnswerRequest::new("q", MODEL))
            .await
            .unwrap_err();

        match err {
            PipelineError::Generation { model, source } => {
                assert_eq!(model, MODEL);
                assert!(source.to_string().contains("model overloaded"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unparseable_evaluation_still_answers() {
        let provider = MockLlmProvider::new("mock")
            .with_model_response(MODEL, text_response("Eat koshary.", None))
            .with_model_response(DEFAULT_EVALUATOR_MODEL, text_response("relevant!", None));
        let f = fixture_with(provider, StubStrategy::new(SearchStrategy::HybridFusion));

        let result = f
            .pipeline
            .answer(AnswerRequest::new("q", MODEL))
            .await
            .unwrap();

        assert_eq!(result.relevance(), Relevance::Unknown);
        assert_eq!(result.evaluation.explanation, "Failed to parse evaluation");
        assert_eq!(result.generation.usage.prompt_tokens, None);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(PipelineStage::PromptBuilding.to_string(), "prompt_building");
        assert_eq!(PipelineStage::Failed.as_str(), "failed");
    }
}
