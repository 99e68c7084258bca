//! Parallel escalation over independent documents.

use super::{AdaptiveOutcome, CallLimiter, CancellationToken, DocumentSource, EscalationPipeline};
use crate::error::{Error, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Fixed-size worker pool running one pipeline per document.
///
/// The pool size bounds how many strategy calls run at once. Unless the
/// pipeline already carries a [`CallLimiter`], one with a permit per
/// worker is attached, so a call that outlives its attempt timeout still
/// occupies a slot until it returns. Documents share nothing but the
/// read-only pipeline, the limiter and the cancellation token.
pub struct BatchRunner {
    pipeline: EscalationPipeline,
    pool: ThreadPool,
    token: CancellationToken,
}

impl BatchRunner {
    /// Create a runner with `concurrency` worker threads.
    pub fn new(pipeline: EscalationPipeline, concurrency: usize) -> Result<Self> {
        if concurrency == 0 {
            return Err(Error::config("concurrency must be at least 1"));
        }
        let pipeline = match pipeline.call_limiter() {
            Some(_) => pipeline,
            None => pipeline.with_call_limiter(CallLimiter::new(concurrency)?),
        };
        let pool = ThreadPoolBuilder::new()
            .num_threads(concurrency)
            .thread_name(|i| format!("docparity-worker-{}", i))
            .build()
            .map_err(|e| Error::Other(format!("Failed to build worker pool: {}", e)))?;
        Ok(Self {
            pipeline,
            pool,
            token: CancellationToken::new(),
        })
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Token cancelling every pipeline of this runner.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Number of worker threads.
    pub fn concurrency(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run every source. Results keep the input order.
    pub fn run(&self, sources: &[DocumentSource]) -> Vec<Result<AdaptiveOutcome>> {
        self.run_with_progress(sources, |_, _| {})
    }

    /// Run every source, calling `progress` as each one finishes.
    pub fn run_with_progress<F>(
        &self,
        sources: &[DocumentSource],
        progress: F,
    ) -> Vec<Result<AdaptiveOutcome>>
    where
        F: Fn(&DocumentSource, &Result<AdaptiveOutcome>) + Sync,
    {
        log::debug!(
            "Running {} source(s) on {} worker(s)",
            sources.len(),
            self.concurrency()
        );
        self.pool.install(|| {
            sources
                .par_iter()
                .map(|source| {
                    let result = self.pipeline.run_with_cancel(source, &self.token);
                    progress(source, &result);
                    result
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalate::{EscalationOptions, Extraction, ExtractionError, ExtractionStrategy};
    use crate::model::{Document, DocumentFormat};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Echo;

    impl ExtractionStrategy for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn run(&self, source: &DocumentSource) -> std::result::Result<Extraction, ExtractionError> {
            Ok(Extraction::new(
                Document::new(&source.id, DocumentFormat::Html).with_title(source.id.clone()),
            )
            .with_reported_confidence(0.9))
        }
    }

    fn runner(concurrency: usize) -> BatchRunner {
        let strategies: Vec<Arc<dyn ExtractionStrategy>> = vec![Arc::new(Echo)];
        let pipeline = EscalationPipeline::new(strategies, EscalationOptions::new()).unwrap();
        BatchRunner::new(pipeline, concurrency).unwrap()
    }

    #[test]
    fn test_results_keep_order() {
        let sources: Vec<DocumentSource> =
            (0..20).map(|i| DocumentSource::new(format!("doc-{}", i))).collect();
        let results = runner(4).run(&sources);
        assert_eq!(results.len(), 20);
        for (i, result) in results.iter().enumerate() {
            let outcome = result.as_ref().unwrap();
            assert_eq!(outcome.document.as_ref().unwrap().id, format!("doc-{}", i));
        }
    }

    #[test]
    fn test_progress_called_per_source() {
        let sources: Vec<DocumentSource> =
            (0..5).map(|i| DocumentSource::new(format!("d{}", i))).collect();
        let seen = AtomicUsize::new(0);
        runner(2).run_with_progress(&sources, |_, _| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(seen.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_cancelled_runner() {
        let runner = runner(2);
        runner.cancellation_token().cancel();
        let results = runner.run(&[DocumentSource::new("a"), DocumentSource::new("b")]);
        assert!(results
            .iter()
            .all(|r| matches!(r, Err(Error::Cancelled { .. }))));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let strategies: Vec<Arc<dyn ExtractionStrategy>> = vec![Arc::new(Echo)];
        let pipeline = EscalationPipeline::new(strategies, EscalationOptions::new()).unwrap();
        assert!(matches!(
            BatchRunner::new(pipeline, 0),
            Err(Error::Config(_))
        ));
    }
}
