//! The escalation state machine.

use super::{
    Action, AdaptiveOutcome, AttemptOutcome, AttemptRecord, CallLimiter, CallPermit,
    CancellationToken, DocumentSource, EscalationDecision, EscalationOptions, Extraction,
    ExtractionError, ExtractionStrategy, StrategyRegistry,
};
use crate::confidence::{ConfidenceScore, ConfidenceScorer, ExtractionContext};
use crate::error::{Error, Result};
use crossbeam_channel::RecvTimeoutError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

type StrategyResult = std::result::Result<Extraction, ExtractionError>;

/// Pipeline state.
///
/// `Pending(i)` runs strategy `i`, `Evaluating(i)` scores it and decides,
/// `Escalating(i)` moves on to `i + 1`. `Accepted` and `Exhausted` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Pending(usize),
    Evaluating(usize),
    Escalating(usize),
    Accepted(usize),
    Exhausted,
}

/// Runs strategies cheapest first until one is confident enough.
///
/// A pipeline is immutable once built and can run many sources, from many
/// threads at once.
#[derive(Debug)]
pub struct EscalationPipeline {
    strategies: Vec<Arc<dyn ExtractionStrategy>>,
    options: EscalationOptions,
    scorer: ConfidenceScorer,
    limiter: Option<CallLimiter>,
}

impl EscalationPipeline {
    /// Create a pipeline over strategies in escalation order.
    ///
    /// Fails if the options are invalid, no strategy is given, or the
    /// strategies are not ordered by non-decreasing cost.
    pub fn new(
        strategies: Vec<Arc<dyn ExtractionStrategy>>,
        options: EscalationOptions,
    ) -> Result<Self> {
        options.validate()?;
        if strategies.is_empty() {
            return Err(Error::config("at least one extraction strategy is required"));
        }
        for pair in strategies.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if !(a.cost() <= b.cost()) {
                return Err(Error::config(format!(
                    "strategy {} (cost {}) is ordered after {} (cost {}); order strategies by increasing cost",
                    b.name(),
                    b.cost(),
                    a.name(),
                    a.cost()
                )));
            }
        }
        for strategy in &strategies {
            let cost = strategy.cost();
            if !cost.is_finite() || cost < 0.0 {
                return Err(Error::config(format!(
                    "strategy {} has invalid cost {}",
                    strategy.name(),
                    cost
                )));
            }
        }

        Ok(Self {
            strategies,
            options,
            scorer: ConfidenceScorer::default(),
            limiter: None,
        })
    }

    /// Create a pipeline from the names in `options.strategy_order`.
    pub fn from_registry(registry: &StrategyRegistry, options: EscalationOptions) -> Result<Self> {
        let strategies = registry.resolve(&options.strategy_order)?;
        Self::new(strategies, options)
    }

    /// Replace the confidence scorer.
    pub fn with_scorer(mut self, scorer: ConfidenceScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Hold a permit from `limiter` for every strategy call.
    ///
    /// Share one limiter between pipelines to bound their calls together.
    pub fn with_call_limiter(mut self, limiter: CallLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// The call limiter, if any.
    pub fn call_limiter(&self) -> Option<&CallLimiter> {
        self.limiter.as_ref()
    }

    /// Get the pipeline options.
    pub fn options(&self) -> &EscalationOptions {
        &self.options
    }

    /// Names of the strategies in escalation order.
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the pipeline on one source.
    ///
    /// Strategy failures, timeouts and panics become zero-confidence
    /// attempts. The result is `Err` only for cancellation.
    pub fn run(&self, source: &DocumentSource) -> Result<AdaptiveOutcome> {
        self.run_with_cancel(source, &CancellationToken::new())
    }

    /// Run the pipeline, checking `token` before every attempt.
    pub fn run_with_cancel(
        &self,
        source: &DocumentSource,
        token: &CancellationToken,
    ) -> Result<AdaptiveOutcome> {
        let threshold = self.options.threshold_for(source.category);
        let mut attempts: Vec<AttemptRecord> = Vec::new();
        let mut spent = 0.0;
        let mut last: Option<(AttemptOutcome, Option<Extraction>, Duration)> = None;
        let mut state = PipelineState::Pending(0);

        loop {
            log::debug!("{}: {:?}", source.id, state);
            state = match state {
                PipelineState::Pending(index) => {
                    if token.is_cancelled() {
                        log::info!(
                            "{}: cancelled after {} attempt(s)",
                            source.id,
                            attempts.len()
                        );
                        return Err(Error::Cancelled {
                            completed_attempts: attempts.len(),
                        });
                    }
                    let permit = match &self.limiter {
                        Some(limiter) => match limiter.acquire(token) {
                            Some(permit) => Some(permit),
                            None => {
                                log::info!(
                                    "{}: cancelled waiting for a call slot after {} attempt(s)",
                                    source.id,
                                    attempts.len()
                                );
                                return Err(Error::Cancelled {
                                    completed_attempts: attempts.len(),
                                });
                            }
                        },
                        None => None,
                    };
                    let strategy = &self.strategies[index];
                    let started = Instant::now();
                    let (outcome, extraction) = self.execute(strategy, source, permit);
                    spent += strategy.cost();
                    last = Some((outcome, extraction, started.elapsed()));
                    PipelineState::Evaluating(index)
                }

                PipelineState::Evaluating(index) => {
                    let strategy = &self.strategies[index];
                    let (outcome, extraction, duration) = last
                        .take()
                        .unwrap_or((AttemptOutcome::TimedOut, None, Duration::ZERO));
                    let (document, confidence) = match extraction {
                        Some(extraction) => {
                            let context = ExtractionContext {
                                strategy: Some(strategy.name().to_string()),
                                reported_confidence: extraction.reported_confidence,
                                category: source.category,
                            };
                            let score = self.scorer.score(&extraction.document, &context);
                            (Some(extraction.document), score)
                        }
                        None => (None, ConfidenceScore::zero(format!("attempt {}", outcome))),
                    };

                    let next = if document.is_some() && confidence.overall >= threshold {
                        PipelineState::Accepted(index)
                    } else if self.can_escalate(index, spent) {
                        PipelineState::Escalating(index)
                    } else {
                        PipelineState::Exhausted
                    };
                    let decision = match next {
                        PipelineState::Accepted(_) => Action::Accept,
                        PipelineState::Escalating(_) => Action::Escalate,
                        _ => Action::Exhausted,
                    };
                    log::debug!(
                        "{}: {} scored {:.3} against {:.2}, {}",
                        source.id,
                        strategy.name(),
                        confidence.overall,
                        threshold,
                        decision
                    );

                    attempts.push(AttemptRecord {
                        index,
                        strategy: strategy.name().to_string(),
                        outcome,
                        document,
                        confidence,
                        duration,
                        cost: strategy.cost(),
                        decision,
                    });
                    next
                }

                PipelineState::Escalating(index) => PipelineState::Pending(index + 1),

                PipelineState::Accepted(index) => {
                    log::info!(
                        "{}: accepted {} at attempt {}",
                        source.id,
                        self.strategies[index].name(),
                        index
                    );
                    return Ok(accepted(index, attempts));
                }

                PipelineState::Exhausted => {
                    log::info!(
                        "{}: exhausted after {} attempt(s)",
                        source.id,
                        attempts.len()
                    );
                    return Ok(exhausted(attempts));
                }
            };
        }
    }

    /// Whether the strategy after `index` may run.
    fn can_escalate(&self, index: usize, spent: f64) -> bool {
        let next = index + 1;
        let Some(strategy) = self.strategies.get(next) else {
            return false;
        };
        if self.options.max_attempts.is_some_and(|max| next >= max) {
            return false;
        }
        if let Some(budget) = self.options.max_total_cost {
            if spent + strategy.cost() > budget {
                log::debug!(
                    "{} would exceed the cost budget ({} + {} > {})",
                    strategy.name(),
                    spent,
                    strategy.cost(),
                    budget
                );
                return false;
            }
        }
        true
    }

    /// Run one strategy, containing errors, panics and timeouts.
    ///
    /// `permit` is released when the strategy call returns, even if that
    /// happens after the attempt timed out.
    fn execute(
        &self,
        strategy: &Arc<dyn ExtractionStrategy>,
        source: &DocumentSource,
        permit: Option<CallPermit>,
    ) -> (AttemptOutcome, Option<Extraction>) {
        let result = match self.options.attempt_timeout() {
            Some(timeout) => {
                run_with_timeout(Arc::clone(strategy), source.clone(), timeout, permit)
            }
            None => {
                let result = panic::catch_unwind(AssertUnwindSafe(|| strategy.run(source)));
                drop(permit);
                Ok(result)
            }
        };

        match result {
            Ok(Ok(Ok(extraction))) => (AttemptOutcome::Succeeded, Some(extraction)),
            Ok(Ok(Err(e))) => {
                log::warn!("{}: strategy {} failed: {}", source.id, strategy.name(), e);
                (
                    AttemptOutcome::Failed {
                        message: e.to_string(),
                    },
                    None,
                )
            }
            Ok(Err(payload)) => {
                let message = panic_message(payload.as_ref());
                log::warn!(
                    "{}: strategy {} panicked: {}",
                    source.id,
                    strategy.name(),
                    message
                );
                (AttemptOutcome::Panicked { message }, None)
            }
            Err(outcome) => {
                log::warn!("{}: strategy {} {}", source.id, strategy.name(), outcome);
                (outcome, None)
            }
        }
    }
}

/// Run a strategy on a worker thread, waiting at most `timeout`.
///
/// A timed-out worker is detached and left to finish on its own; its
/// result is dropped. The worker keeps `permit` until the call returns.
fn run_with_timeout(
    strategy: Arc<dyn ExtractionStrategy>,
    source: DocumentSource,
    timeout: Duration,
    permit: Option<CallPermit>,
) -> std::result::Result<thread::Result<StrategyResult>, AttemptOutcome> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let name = format!("docparity-{}", strategy.name());

    let spawned = thread::Builder::new().name(name).spawn(move || {
        let result = panic::catch_unwind(AssertUnwindSafe(|| strategy.run(&source)));
        drop(permit);
        // The receiver is gone when the attempt already timed out.
        let _ = tx.send(result);
    });
    if let Err(e) = spawned {
        return Err(AttemptOutcome::Failed {
            message: format!("could not start worker thread: {}", e),
        });
    }

    match rx.recv_timeout(timeout) {
        Ok(result) => Ok(result),
        Err(RecvTimeoutError::Timeout) => Err(AttemptOutcome::TimedOut),
        Err(RecvTimeoutError::Disconnected) => Err(AttemptOutcome::Panicked {
            message: "worker exited without a result".to_string(),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn accepted(index: usize, attempts: Vec<AttemptRecord>) -> AdaptiveOutcome {
    let chosen = attempts.iter().find(|a| a.index == index);
    let decision = EscalationDecision {
        action: Action::Accept,
        attempt_index: Some(index),
        chosen_strategy: chosen.map(|a| a.strategy.clone()),
    };
    let document = chosen.and_then(|a| a.document.clone());
    let confidence = chosen
        .map(|a| a.confidence.clone())
        .unwrap_or_else(|| ConfidenceScore::zero("accepted attempt missing"));
    AdaptiveOutcome {
        decision,
        document,
        confidence,
        attempts,
    }
}

/// Pick the best attempt that produced a document, earliest on ties.
fn exhausted(attempts: Vec<AttemptRecord>) -> AdaptiveOutcome {
    let mut best: Option<&AttemptRecord> = None;
    for attempt in attempts.iter().filter(|a| a.document.is_some()) {
        if best.map_or(true, |b| attempt.confidence.overall > b.confidence.overall) {
            best = Some(attempt);
        }
    }

    let decision = EscalationDecision {
        action: Action::Exhausted,
        attempt_index: best.map(|a| a.index),
        chosen_strategy: best.map(|a| a.strategy.clone()),
    };
    let document = best.and_then(|a| a.document.clone());
    let confidence = best
        .map(|a| a.confidence.clone())
        .unwrap_or_else(|| ConfidenceScore::zero("every attempt failed"));
    AdaptiveOutcome {
        decision,
        document,
        confidence,
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::{ConfidenceOptions, SignalFloors, SignalWeights};
    use crate::model::{Document, DocumentFormat};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        name: &'static str,
        cost: f64,
        confidence: Option<f64>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(name: &'static str, cost: f64, confidence: Option<f64>) -> Arc<Self> {
            Arc::new(Self {
                name,
                cost,
                confidence,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl ExtractionStrategy for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        fn cost(&self) -> f64 {
            self.cost
        }

        fn run(&self, source: &DocumentSource) -> StrategyResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.confidence {
                Some(c) => Ok(Extraction::new(Document::new(&source.id, DocumentFormat::Pdf))
                    .with_reported_confidence(c)),
                None => Err(ExtractionError::Transient("rate limited".into())),
            }
        }
    }

    fn dyns(list: Vec<Arc<Scripted>>) -> Vec<Arc<dyn ExtractionStrategy>> {
        list.into_iter()
            .map(|s| s as Arc<dyn ExtractionStrategy>)
            .collect()
    }

    fn extractor_scorer() -> ConfidenceScorer {
        let options = ConfidenceOptions::new()
            .with_weights(SignalWeights::extractor_only())
            .with_floors(SignalFloors::none());
        ConfidenceScorer::new(options).unwrap()
    }

    fn pipeline(strategies: Vec<Arc<dyn ExtractionStrategy>>, threshold: f64) -> EscalationPipeline {
        EscalationPipeline::new(
            strategies,
            EscalationOptions::new().with_accept_threshold(threshold),
        )
        .unwrap()
        .with_scorer(extractor_scorer())
    }

    #[test]
    fn test_exhausted_keeps_best_attempt() {
        let p = pipeline(
            dyns(vec![
                Scripted::new("a", 1.0, Some(0.3)),
                Scripted::new("b", 2.0, Some(0.6)),
                Scripted::new("c", 3.0, Some(0.5)),
            ]),
            0.9,
        );
        let outcome = p.run(&DocumentSource::new("doc")).unwrap();
        assert_eq!(outcome.decision.action, Action::Exhausted);
        assert_eq!(outcome.decision.attempt_index, Some(1));
        assert_eq!(outcome.decision.chosen_strategy.as_deref(), Some("b"));
        assert_eq!(outcome.attempts.len(), 3);
        assert_eq!(outcome.attempts[2].decision, Action::Exhausted);
        assert!((outcome.confidence.overall - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_failure_is_zero_confidence_attempt() {
        let p = pipeline(
            dyns(vec![
                Scripted::new("flaky", 1.0, None),
                Scripted::new("steady", 2.0, Some(0.8)),
            ]),
            0.7,
        );
        let outcome = p.run(&DocumentSource::new("doc")).unwrap();
        assert!(outcome.is_accepted());
        assert_eq!(outcome.decision.attempt_index, Some(1));
        assert!(matches!(outcome.attempts[0].outcome, AttemptOutcome::Failed { .. }));
        assert_eq!(outcome.attempts[0].confidence.overall, 0.0);
        assert!(outcome.attempts[0].document.is_none());
    }

    #[test]
    fn test_all_failed_has_no_document() {
        let p = pipeline(dyns(vec![Scripted::new("flaky", 1.0, None)]), 0.5);
        let outcome = p.run(&DocumentSource::new("doc")).unwrap();
        assert_eq!(outcome.decision.action, Action::Exhausted);
        assert_eq!(outcome.decision.attempt_index, None);
        assert!(outcome.document.is_none());
    }

    #[test]
    fn test_budget_stops_escalation() {
        let expensive = Scripted::new("expensive", 10.0, Some(0.99));
        let p = EscalationPipeline::new(
            dyns(vec![Scripted::new("cheap", 1.0, Some(0.2)), expensive.clone()]),
            EscalationOptions::new()
                .with_accept_threshold(0.9)
                .with_max_total_cost(5.0),
        )
        .unwrap()
        .with_scorer(extractor_scorer());

        let outcome = p.run(&DocumentSource::new("doc")).unwrap();
        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.decision.action, Action::Exhausted);
        assert_eq!(expensive.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_max_attempts() {
        let p = EscalationPipeline::new(
            dyns(vec![
                Scripted::new("a", 1.0, Some(0.1)),
                Scripted::new("b", 1.0, Some(0.2)),
                Scripted::new("c", 1.0, Some(0.3)),
            ]),
            EscalationOptions::new().with_max_attempts(2),
        )
        .unwrap()
        .with_scorer(extractor_scorer());
        let outcome = p.run(&DocumentSource::new("doc")).unwrap();
        assert_eq!(outcome.attempts.len(), 2);
    }

    #[test]
    fn test_rejects_decreasing_cost() {
        let result = EscalationPipeline::new(
            dyns(vec![Scripted::new("a", 5.0, Some(0.1)), Scripted::new("b", 1.0, Some(0.2))]),
            EscalationOptions::new(),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_empty_strategy_list() {
        let result = EscalationPipeline::new(Vec::new(), EscalationOptions::new());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_cancelled_before_first_attempt() {
        let strategy = Scripted::new("a", 1.0, Some(0.9));
        let p = pipeline(dyns(vec![strategy.clone()]), 0.5);
        let token = CancellationToken::new();
        token.cancel();
        let result = p.run_with_cancel(&DocumentSource::new("doc"), &token);
        assert!(matches!(
            result,
            Err(Error::Cancelled {
                completed_attempts: 0
            })
        ));
        assert_eq!(strategy.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
