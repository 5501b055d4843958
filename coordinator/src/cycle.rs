//! The full planning cycle (§4.6 steps 1-7) and incremental batch mode.

use crate::cache::WeightsCache;
use crate::cancellation::CancellationToken;
use crate::config::CoordinatorConfig;
use crate::lock::PlanningLock;
use crate::recommendation::{PendingRecommendation, RecommendationStore};
use crate::state::CycleInputs;
use chrono::Utc;
use glidepath_core::error::{CycleOutcome, GlidepathError};
use glidepath_core::hash::{optimizer_settings_hash, portfolio_hash, OptimizerSettingsHash, PortfolioHash};
use glidepath_core::plan::SequenceEvaluation;
use glidepath_core::weights::{FallbackStrategy, TargetWeights};
use glidepath_evaluator::{ScoringInputs, WorkerPool};
use glidepath_external::TradeExecutor;
use glidepath_integration::{EventBus, PlanningEvent, PlanningProgress};
use glidepath_optimizer::{optimize, OptimizerInputs};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration as StdDuration;
use tokio::sync::Mutex;

/// The outcome of one full cycle or one incremental batch run.
#[derive(Debug, Clone)]
pub struct CycleResult {
    pub portfolio_hash: PortfolioHash,
    pub outcome: CycleOutcome,
    pub top_k: Vec<PendingRecommendation>,
}

/// Drives C1-C5 through one planning cycle: the process-wide lock, the
/// `(portfolio_hash, optimizer_settings_hash)` weights cache, the pending
/// recommendation store and the outbound event bus (component C6).
pub struct Coordinator {
    lock: PlanningLock,
    cache: Mutex<WeightsCache>,
    /// A plain `std::sync::Mutex`, not `tokio::sync::Mutex`: every
    /// `EventBus` call is a non-blocking in-memory send, never worth an
    /// `.await` point, and a std mutex can be locked from `subscribe`'s
    /// synchronous `&self` signature without risking the "called
    /// `blocking_lock` from an async context" panic a tokio mutex would
    /// invite there.
    events: StdMutex<EventBus>,
    recommendations: Mutex<RecommendationStore>,
    pool: Arc<WorkerPool>,
    executor: Arc<dyn TradeExecutor>,
    config: CoordinatorConfig,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Coordinator {
    pub fn new(executor: Arc<dyn TradeExecutor>, config: CoordinatorConfig) -> Result<Self, GlidepathError> {
        let pool = WorkerPool::with_default_workers()?;
        Ok(Self {
            lock: PlanningLock::new(),
            cache: Mutex::new(WeightsCache::new(config.cache_ttl)),
            events: StdMutex::new(EventBus::default()),
            recommendations: Mutex::new(RecommendationStore::new()),
            pool: Arc::new(pool),
            executor,
            config,
        })
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<glidepath_integration::SequencedEvent> {
        self.events.lock().expect("event bus mutex poisoned").subscribe()
    }

    fn publish(&self, event: PlanningEvent) {
        let mut events = self.events.lock().expect("event bus mutex poisoned");
        events.publish(event);
    }

    fn optimizer_settings_hash(&self) -> OptimizerSettingsHash {
        optimizer_settings_hash(&[
            ("blend".to_string(), self.config.optimizer_blend.to_string()),
            ("target_return".to_string(), self.config.optimizer_target_return.to_string()),
            ("risk_cap".to_string(), self.config.optimizer_risk_cap.to_string()),
            ("max_position_concentration".to_string(), self.config.max_position_concentration.to_string()),
            ("max_sector_concentration".to_string(), self.config.max_sector_concentration.to_string()),
        ])
    }

    /// Step 3 of §4.6: resolve `TargetWeights`, from cache if the
    /// `(portfolio_hash, optimizer_settings_hash)` pair is still fresh,
    /// otherwise by invoking C3 and caching the result.
    async fn resolve_target_weights(
        &self,
        inputs: &CycleInputs<'_>,
        portfolio_hash: PortfolioHash,
    ) -> Result<TargetWeights, GlidepathError> {
        let cache_key = (portfolio_hash, self.optimizer_settings_hash());
        let now = inputs.now;

        if let Some(cached) = self.cache.lock().await.get(&cache_key, now) {
            return Ok(cached.weights.clone());
        }

        let (isins, expected_returns, bounds, group) = inputs.build_optimizer_inputs(&self.config)?;
        let weights = optimize(OptimizerInputs {
            isins: &isins,
            expected_returns: &expected_returns,
            covariance: &inputs.covariance.values,
            bounds: &bounds,
            group: Some(&group),
            target_return: self.config.optimizer_target_return,
            risk_cap: self.config.optimizer_risk_cap,
            blend: self.config.optimizer_blend,
        })?;

        let snapshot = self.cache.lock().await.put(cache_key, weights, now);
        Ok(snapshot.weights.clone())
    }

    /// Steps 4-5 of §4.6: C4 generates candidate sequences, C5 scores them
    /// against the portfolio state derived from C1.
    fn plan_and_evaluate(
        &self,
        inputs: &CycleInputs<'_>,
        target_weights: &TargetWeights,
    ) -> Result<Vec<SequenceEvaluation>, GlidepathError> {
        let planning_ctx = inputs.planning_context(target_weights);
        let sequences = glidepath_planner::generate_sequences(&planning_ctx, &self.config.planner_config)?;

        let portfolio_ctx = inputs.portfolio_context(target_weights.clone());
        let scoring_inputs = ScoringInputs {
            scores: inputs.scores,
            dividend_yields: inputs.dividend_yields,
            estimated_cagr: inputs.estimated_cagr,
        };
        let evaluations = self.pool.evaluate_batch(
            &sequences,
            &portfolio_ctx,
            &self.config.cost_config,
            &self.config.scoring_config,
            &scoring_inputs,
            self.config.min_currency_reserve,
            inputs.now,
        )?;
        Ok(evaluations)
    }

    fn rank_top_k(mut evaluations: Vec<SequenceEvaluation>, top_k: usize) -> Vec<PendingRecommendation> {
        evaluations.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    let isin_a = a.actions.first().map(|action| action.isin.to_string()).unwrap_or_default();
                    let isin_b = b.actions.first().map(|action| action.isin.to_string()).unwrap_or_default();
                    isin_a.cmp(&isin_b)
                })
        });
        evaluations
            .into_iter()
            .take(top_k)
            .enumerate()
            .map(|(rank, evaluation)| PendingRecommendation { rank, evaluation })
            .collect()
    }

    fn classify_outcome(target_weights: &TargetWeights, ranked: &[PendingRecommendation]) -> CycleOutcome {
        if !ranked.is_empty() && ranked.iter().all(|r| !r.evaluation.feasible) {
            return CycleOutcome::Failed;
        }
        if target_weights.fallback_used != FallbackStrategy::None && target_weights.fallback_used != FallbackStrategy::EfficientReturn {
            return CycleOutcome::FallbackUsed;
        }
        if ranked.iter().any(|r| !r.evaluation.feasible) {
            return CycleOutcome::CompleteWithWarnings;
        }
        CycleOutcome::Complete
    }

    /// Runs one full cycle (§4.6 steps 1-7): acquire the process-wide lock,
    /// resolve target weights (cache or C3), run C4/C5, rank and persist
    /// the top-K, release the lock, broadcast completion.
    ///
    /// The wall-clock deadline (§4.6 "Cancellation & timeouts") wraps only
    /// the C4/C5 stage: C3's mean-variance chain is a handful of convex
    /// solves over the universe size and is never the long pole, so the
    /// `tokio::time::timeout` only needs to race the combinatorial
    /// sequence search, not the whole cycle.
    pub async fn run_cycle(&self, inputs: CycleInputs<'_>) -> Result<CycleResult, GlidepathError> {
        let guard = self.lock.try_acquire()?;
        let hash = portfolio_hash(inputs.positions, &inputs.cash_by_currency_strings(), self.config.universe_version);
        self.publish(PlanningEvent::PlanningStarted { portfolio_hash: hash.to_string() });

        let result = self.run_cycle_locked(&inputs, hash).await;

        match &result {
            Ok(cycle_result) => {
                self.publish(PlanningEvent::PlanningComplete {
                    portfolio_hash: hash.to_string(),
                    outcome: cycle_result.outcome,
                    top_k: cycle_result.top_k.iter().map(|r| r.evaluation.clone()).collect(),
                });
            }
            Err(err) => {
                self.publish(PlanningEvent::PlanningFailed { portfolio_hash: hash.to_string(), reason: err.to_string() });
            }
        }

        drop(guard);
        result
    }

    async fn run_cycle_locked(&self, inputs: &CycleInputs<'_>, hash: PortfolioHash) -> Result<CycleResult, GlidepathError> {
        let target_weights = self.resolve_target_weights(inputs, hash).await?;

        let evaluations = tokio::time::timeout(self.config.deadline, self.plan_and_evaluate_yielding(inputs, &target_weights))
            .await
            .map_err(|_| GlidepathError::DeadlineExceeded)??;

        let ranked = Self::rank_top_k(evaluations, self.config.top_k);
        let outcome = Self::classify_outcome(&target_weights, &ranked);

        self.recommendations.lock().await.publish(&hash, ranked.clone());
        for recommendation in &ranked {
            self.publish(PlanningEvent::RecommendationCreated { portfolio_hash: hash.to_string(), rank: recommendation.rank });
        }

        Ok(CycleResult { portfolio_hash: hash, outcome, top_k: ranked })
    }

    /// Wraps the synchronous C4/C5 call in a single `yield_now` so the
    /// surrounding `tokio::time::timeout` gets at least one scheduling
    /// point to observe an already-elapsed deadline.
    async fn plan_and_evaluate_yielding(
        &self,
        inputs: &CycleInputs<'_>,
        target_weights: &TargetWeights,
    ) -> Result<Vec<SequenceEvaluation>, GlidepathError> {
        tokio::task::yield_now().await;
        self.plan_and_evaluate(inputs, target_weights)
    }

    /// Incremental batch mode (§4.6 "When invoked with `batch_size=B`,
    /// generate sequences lazily in tranches of B ..."). The planner
    /// itself runs its four stages once per cycle rather than tranche by
    /// tranche (its stages aren't independently resumable); tranching is
    /// applied to the resulting sequence list, which is evaluated and
    /// streamed B sequences at a time so a subscriber sees an improving
    /// top-K while the remaining tranches are still being scored.
    pub async fn run_incremental(
        &self,
        inputs: CycleInputs<'_>,
        cancellation: CancellationToken,
    ) -> Result<CycleResult, GlidepathError> {
        let hash = portfolio_hash(inputs.positions, &inputs.cash_by_currency_strings(), self.config.universe_version);
        self.publish(PlanningEvent::PlanningStarted { portfolio_hash: hash.to_string() });

        let started = std::time::Instant::now();
        let target_weights = self.resolve_target_weights(&inputs, hash).await?;
        let planning_ctx = inputs.planning_context(&target_weights);
        let sequences = glidepath_planner::generate_sequences(&planning_ctx, &self.config.planner_config)?;
        let portfolio_ctx = inputs.portfolio_context(target_weights.clone());
        let scoring_inputs =
            ScoringInputs { scores: inputs.scores, dividend_yields: inputs.dividend_yields, estimated_cagr: inputs.estimated_cagr };

        let mut accumulated: Vec<SequenceEvaluation> = Vec::new();
        let mut terminated_early = false;

        for (tranche_index, tranche) in sequences.chunks(self.config.batch_size.max(1)).enumerate() {
            if cancellation.is_cancelled() || started.elapsed() > self.config.deadline {
                terminated_early = true;
                break;
            }

            let evaluated = self.pool.evaluate_batch(
                tranche,
                &portfolio_ctx,
                &self.config.cost_config,
                &self.config.scoring_config,
                &scoring_inputs,
                self.config.min_currency_reserve,
                inputs.now,
            )?;
            accumulated.extend(evaluated);

            let preview = Self::rank_top_k(accumulated.clone(), self.config.top_k);
            self.publish(PlanningEvent::PlanningProgress(PlanningProgress {
                portfolio_hash: hash.to_string(),
                tranche_index,
                top_k_preview: preview.into_iter().map(|r| r.evaluation).collect(),
            }));

            tokio::task::yield_now().await;
        }

        let ranked = Self::rank_top_k(accumulated, self.config.top_k);
        let outcome = if terminated_early {
            if ranked.is_empty() {
                CycleOutcome::Failed
            } else {
                CycleOutcome::CompleteWithWarnings
            }
        } else {
            Self::classify_outcome(&target_weights, &ranked)
        };

        self.recommendations.lock().await.publish(&hash, ranked.clone());
        for recommendation in &ranked {
            self.publish(PlanningEvent::RecommendationCreated { portfolio_hash: hash.to_string(), rank: recommendation.rank });
        }
        self.publish(PlanningEvent::PlanningComplete {
            portfolio_hash: hash.to_string(),
            outcome,
            top_k: ranked.iter().map(|r| r.evaluation.clone()).collect(),
        });

        Ok(CycleResult { portfolio_hash: hash, outcome, top_k: ranked })
    }

    /// The execute path (§4.6, §6 "trade executor"): hands a previously
    /// persisted recommendation's actions to the trade executor and
    /// broadcasts one `trade_executed` event per resulting fill. The
    /// coordinator itself never calls the broker.
    pub async fn execute_recommendation(
        &self,
        portfolio_hash: &PortfolioHash,
        rank: usize,
    ) -> Result<Vec<glidepath_core::trade::Trade>, GlidepathError> {
        let actions = {
            let recommendations = self.recommendations.lock().await;
            let Some(recommendation) = recommendations.get(portfolio_hash, rank) else {
                return Err(GlidepathError::InvalidInput(format!(
                    "no pending recommendation at rank {rank} for portfolio {portfolio_hash}"
                )));
            };
            recommendation.evaluation.actions.clone()
        };

        let trades = self
            .executor
            .execute(&actions)
            .await
            .map_err(|err| GlidepathError::BrokerUnavailable(err.to_string()))?;

        for trade in &trades {
            self.publish(PlanningEvent::TradeExecuted { trade: trade.clone() });
        }

        Ok(trades)
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn default_deadline() -> StdDuration {
        crate::config::DEFAULT_DEADLINE
    }
}
