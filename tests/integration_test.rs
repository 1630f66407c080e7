//! Integration Tests - End-to-end Bot Component Testing
//!
//! Tests the interaction between usecases, ports, and mock adapters.
//! Uses mockall for trait mocking and tokio::test for async tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use mockall::mock;

use swarm_trading_bot::adapters::metrics::MetricsRegistry;
use swarm_trading_bot::config::RiskConfig;
use swarm_trading_bot::domain::holdings::{HoldingsSnapshot, TokenHolding};
use swarm_trading_bot::domain::strategy::{DcaSettings, DcaStrategy, StrategyEngine};
use swarm_trading_bot::domain::trade::{
    PreviewResult, StrategyState, TradeProposal, Transaction, TransactionId, TransactionStatus,
};
use swarm_trading_bot::usecases::shutdown;
use swarm_trading_bot::usecases::{
    ExecutionOutcome, Orchestrator, RiskGate, RiskRejection, SettlementOutcome, TickOutcome,
    TradeExecutor, TradingContext, TransactionMonitor,
};

// ---- Mock Definitions ----

mock! {
    pub Holdings {}

    #[async_trait::async_trait]
    impl swarm_trading_bot::ports::HoldingsSource for Holdings {
        async fn get_holdings(&self, swarm_id: &str) -> anyhow::Result<HoldingsSnapshot>;
    }
}

mock! {
    pub Settlement {}

    #[async_trait::async_trait]
    impl swarm_trading_bot::ports::SwapSettlement for Settlement {
        async fn preview_swap(
            &self,
            swarm_id: &str,
            proposal: &TradeProposal,
        ) -> anyhow::Result<PreviewResult>;

        async fn execute_swap(
            &self,
            swarm_id: &str,
            proposal: &TradeProposal,
        ) -> anyhow::Result<TransactionId>;

        async fn get_transaction(&self, transaction_id: &str) -> anyhow::Result<Transaction>;
    }
}

// ---- Fixtures ----

const SWARM: &str = "swarm-1";
const USDC: &str = "0xusdc";
const WETH: &str = "0xweth";

fn snapshot(usdc_balance: u64) -> HoldingsSnapshot {
    HoldingsSnapshot {
        native_balance: "1000000000000000000".to_string(),
        tokens: vec![TokenHolding {
            address: USDC.to_string(),
            symbol: "USDC".to_string(),
            name: "USD Coin".to_string(),
            decimals: 0,
            balance: usdc_balance.to_string(),
            total_balance: None,
            holder_count: Some(2),
        }],
        member_count: 2,
        captured_at: Utc::now(),
    }
}

fn proposal(pct: f64) -> TradeProposal {
    TradeProposal {
        sell_token: USDC.to_string(),
        buy_token: WETH.to_string(),
        sell_percentage: pct,
        slippage_percentage: 1.0,
    }
}

fn preview(success_count: u32) -> PreviewResult {
    PreviewResult {
        sell_token: USDC.to_string(),
        buy_token: WETH.to_string(),
        sell_percentage: 10.0,
        slippage_percentage: 1.0,
        members: Vec::new(),
        total_sell_amount: "1000".to_string(),
        total_buy_amount: "5".to_string(),
        total_fee_amount: "0".to_string(),
        success_count,
        error_count: 2 - success_count.min(2),
        fee: None,
    }
}

fn transaction(status: TransactionStatus) -> Transaction {
    Transaction {
        id: "tx-1".to_string(),
        swarm_id: SWARM.to_string(),
        status,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        target_count: Some(2),
        status_counts: Some(HashMap::from([("CONFIRMED".to_string(), 2)])),
        targets: Vec::new(),
    }
}

fn context(simulation: bool) -> TradingContext {
    TradingContext::new(SWARM, simulation, Arc::new(MetricsRegistry::new().unwrap()))
}

fn dca(sell_percentage: f64) -> StrategyEngine {
    DcaStrategy::new(DcaSettings {
        sell_token: USDC.to_string(),
        buy_token: WETH.to_string(),
        sell_percentage,
        interval_secs: 3600,
        slippage_percentage: 1.0,
    })
    .unwrap()
    .into()
}

fn risk_gate(max_pct: f64) -> RiskGate {
    RiskGate::new(&RiskConfig {
        min_trade_interval: 300,
        max_trade_percentage: max_pct,
    })
}

fn orchestrator(
    holdings: MockHoldings,
    settlement: MockSettlement,
    strategy: StrategyEngine,
    max_pct: f64,
    simulation: bool,
    shutdown_rx: tokio::sync::watch::Receiver<bool>,
) -> Orchestrator<MockHoldings, MockSettlement> {
    let settlement = Arc::new(settlement);
    Orchestrator::new(
        Arc::new(holdings),
        Arc::clone(&settlement),
        strategy,
        risk_gate(max_pct),
        TransactionMonitor::new(settlement, Duration::from_secs(60), Duration::from_secs(5)),
        context(simulation),
        Duration::from_secs(300),
        shutdown_rx,
    )
}

// ---- Trade Executor ----

#[tokio::test]
async fn test_zero_viable_members_never_executes() {
    let mut settlement = MockSettlement::new();
    settlement
        .expect_preview_swap()
        .times(1)
        .returning(|_, _| Ok(preview(0)));
    settlement.expect_execute_swap().never();

    let ctx = context(false);
    let metrics = Arc::clone(&ctx.metrics);
    let executor = TradeExecutor::new(Arc::new(settlement), ctx);
    let mut state = StrategyState::new();

    let outcome = executor
        .execute(&proposal(10.0), &mut state, Utc::now())
        .await
        .unwrap();

    assert_eq!(outcome, ExecutionOutcome::NoViableMembers);
    assert!(state.ledger().is_empty());
    assert!(state.last_trade_at().is_none());
    assert_eq!(metrics.zero_viable_previews.get(), 1);
}

#[tokio::test]
async fn test_simulation_previews_only() {
    let mut settlement = MockSettlement::new();
    settlement
        .expect_preview_swap()
        .times(1)
        .returning(|_, _| Ok(preview(2)));
    settlement.expect_execute_swap().never();

    let ctx = context(true);
    let metrics = Arc::clone(&ctx.metrics);
    let executor = TradeExecutor::new(Arc::new(settlement), ctx);
    let mut state = StrategyState::new();

    let outcome = executor
        .execute(&proposal(10.0), &mut state, Utc::now())
        .await
        .unwrap();

    assert_eq!(outcome, ExecutionOutcome::Simulated);
    assert!(state.ledger().is_empty());
    assert_eq!(metrics.simulated_trades.get(), 1);
}

#[tokio::test]
async fn test_live_submission_records_ledger_entry() {
    let mut settlement = MockSettlement::new();
    settlement
        .expect_preview_swap()
        .withf(|_, p| p.sell_token == USDC && p.sell_percentage > 9.9)
        .returning(|_, _| Ok(preview(1)));
    settlement
        .expect_execute_swap()
        .times(1)
        .returning(|_, _| Ok("tx-42".to_string()));

    let executor = TradeExecutor::new(Arc::new(settlement), context(false));
    let mut state = StrategyState::new();
    let now = Utc::now();

    let outcome = executor.execute(&proposal(10.0), &mut state, now).await.unwrap();

    assert_eq!(
        outcome,
        ExecutionOutcome::Submitted {
            transaction_id: "tx-42".to_string()
        }
    );
    assert_eq!(state.ledger().len(), 1);
    assert_eq!(state.last_trade_at(), Some(now));
    let entry = state.ledger().last().unwrap();
    assert_eq!(entry.transaction_id, "tx-42");
    assert_eq!(entry.preview.success_count, 1);
}

#[tokio::test]
async fn test_failed_execute_leaves_state_untouched() {
    let mut settlement = MockSettlement::new();
    settlement
        .expect_preview_swap()
        .returning(|_, _| Ok(preview(2)));
    settlement
        .expect_execute_swap()
        .returning(|_, _| Err(anyhow::anyhow!("API error [SWAP_FAILED]: rejected")));

    let executor = TradeExecutor::new(Arc::new(settlement), context(false));
    let mut state = StrategyState::new();

    let err = executor
        .execute(&proposal(10.0), &mut state, Utc::now())
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("SWAP_FAILED"));
    assert!(state.ledger().is_empty());
    assert!(state.last_trade_at().is_none());
}

// ---- Transaction Monitor ----

fn monitor_with_statuses(statuses: Vec<TransactionStatus>) -> (TransactionMonitor<MockSettlement>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut settlement = MockSettlement::new();
    settlement.expect_get_transaction().returning(move |_| {
        let i = counter.fetch_add(1, Ordering::SeqCst);
        let status = statuses[i.min(statuses.len() - 1)];
        Ok(transaction(status))
    });

    let monitor = TransactionMonitor::new(
        Arc::new(settlement),
        Duration::from_secs(300),
        Duration::from_secs(5),
    );
    (monitor, calls)
}

#[tokio::test(start_paused = true)]
async fn test_monitor_follows_pending_processing_completed() {
    let (monitor, calls) = monitor_with_statuses(vec![
        TransactionStatus::Pending,
        TransactionStatus::Processing,
        TransactionStatus::Completed,
    ]);
    let (_tx, mut rx) = shutdown::channel();

    let outcome = monitor.await_settlement("tx-1", &mut rx).await.unwrap();

    assert!(matches!(outcome, SettlementOutcome::Completed(ref tx) if tx.confirmed_count() == 2));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_monitor_reports_failure() {
    let (monitor, _calls) = monitor_with_statuses(vec![TransactionStatus::Failed]);
    let (_tx, mut rx) = shutdown::channel();

    let outcome = monitor.await_settlement("tx-1", &mut rx).await.unwrap();
    assert_eq!(outcome.label(), "failed");
}

#[tokio::test(start_paused = true)]
async fn test_monitor_stops_on_failure_after_progress() {
    let (monitor, calls) = monitor_with_statuses(vec![
        TransactionStatus::Pending,
        TransactionStatus::Processing,
        TransactionStatus::Failed,
    ]);
    let (_tx, mut rx) = shutdown::channel();
    let start = tokio::time::Instant::now();

    let outcome = monitor.await_settlement("tx-1", &mut rx).await.unwrap();

    assert!(matches!(outcome, SettlementOutcome::Failed(ref tx) if tx.status == TransactionStatus::Failed));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // Two poll intervals, nowhere near the 300s timeout.
    assert!(start.elapsed() < Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn test_monitor_times_out_on_stuck_transaction() {
    let (monitor, calls) = monitor_with_statuses(vec![TransactionStatus::Pending]);
    let (_tx, mut rx) = shutdown::channel();
    let start = tokio::time::Instant::now();

    let outcome = monitor.await_settlement("tx-1", &mut rx).await.unwrap();

    assert!(matches!(outcome, SettlementOutcome::TimedOut(ref tx) if tx.status == TransactionStatus::Pending));
    assert!(start.elapsed() > Duration::from_secs(300));
    assert!(calls.load(Ordering::SeqCst) > 60);
}

#[tokio::test(start_paused = true)]
async fn test_monitor_interrupted_by_shutdown() {
    let (monitor, calls) = monitor_with_statuses(vec![TransactionStatus::Processing]);
    let (tx, mut rx) = shutdown::channel();
    tx.send(true).unwrap();

    let outcome = monitor.await_settlement("tx-1", &mut rx).await.unwrap();

    assert_eq!(outcome.label(), "interrupted");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_monitor_propagates_fetch_errors() {
    let mut settlement = MockSettlement::new();
    settlement
        .expect_get_transaction()
        .returning(|_| Err(anyhow::anyhow!("connection reset")));
    let monitor = TransactionMonitor::new(
        Arc::new(settlement),
        Duration::from_secs(300),
        Duration::from_secs(5),
    );
    let (_tx, mut rx) = shutdown::channel();

    assert!(monitor.await_settlement("tx-1", &mut rx).await.is_err());
}

// ---- Orchestrator ----

#[tokio::test]
async fn test_tick_without_sell_balance_skips_preview() {
    let mut holdings = MockHoldings::new();
    holdings.expect_get_holdings().returning(|_| Ok(snapshot(0)));
    let mut settlement = MockSettlement::new();
    settlement.expect_preview_swap().never();
    settlement.expect_execute_swap().never();

    let (_tx, rx) = shutdown::channel();
    let mut bot = orchestrator(holdings, settlement, dca(10.0), 100.0, false, rx);

    let outcome = bot.tick().await.unwrap();

    assert!(matches!(outcome, TickOutcome::NoProposal));
    assert_eq!(bot.iterations(), 1);
}

#[tokio::test]
async fn test_tick_blocked_by_percentage_cap() {
    let mut holdings = MockHoldings::new();
    holdings.expect_get_holdings().returning(|_| Ok(snapshot(1000)));
    let mut settlement = MockSettlement::new();
    settlement.expect_preview_swap().never();

    let (_tx, rx) = shutdown::channel();
    let mut bot = orchestrator(holdings, settlement, dca(60.0), 50.0, false, rx);

    let outcome = bot.tick().await.unwrap();

    assert!(matches!(
        outcome,
        TickOutcome::Blocked(RiskRejection::PercentageTooHigh { .. })
    ));
    assert!(bot.state().ledger().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_live_tick_submits_and_settles() {
    let mut holdings = MockHoldings::new();
    holdings
        .expect_get_holdings()
        .times(2)
        .returning(|_| Ok(snapshot(1000)));
    let mut settlement = MockSettlement::new();
    settlement
        .expect_preview_swap()
        .times(1)
        .returning(|_, _| Ok(preview(2)));
    settlement
        .expect_execute_swap()
        .times(1)
        .returning(|_, _| Ok("tx-1".to_string()));
    settlement
        .expect_get_transaction()
        .returning(|_| Ok(transaction(TransactionStatus::Completed)));

    let (_tx, rx) = shutdown::channel();
    let mut bot = orchestrator(holdings, settlement, dca(10.0), 100.0, false, rx);

    let first = bot.tick().await.unwrap();
    assert!(matches!(
        first,
        TickOutcome::Settled { ref transaction_id, outcome: SettlementOutcome::Completed(_) }
            if transaction_id == "tx-1"
    ));
    assert_eq!(bot.state().ledger().len(), 1);

    // DCA interval has not elapsed since the recorded trade.
    let second = bot.tick().await.unwrap();
    assert!(matches!(second, TickOutcome::NoSignal));
    assert_eq!(bot.report().total_trades, 1);
}

#[tokio::test]
async fn test_monitor_error_after_submission_keeps_trade() {
    let mut holdings = MockHoldings::new();
    holdings.expect_get_holdings().returning(|_| Ok(snapshot(1000)));
    let mut settlement = MockSettlement::new();
    settlement
        .expect_preview_swap()
        .returning(|_, _| Ok(preview(2)));
    settlement
        .expect_execute_swap()
        .returning(|_, _| Ok("tx-9".to_string()));
    settlement
        .expect_get_transaction()
        .returning(|_| Err(anyhow::anyhow!("gateway timeout")));

    let (_tx, rx) = shutdown::channel();
    let mut bot = orchestrator(holdings, settlement, dca(10.0), 100.0, false, rx);

    let outcome = bot.tick().await.unwrap();

    assert!(matches!(outcome, TickOutcome::Submitted { ref transaction_id } if transaction_id == "tx-9"));
    assert_eq!(bot.state().ledger().len(), 1);
}

#[tokio::test]
async fn test_holdings_error_fails_tick() {
    let mut holdings = MockHoldings::new();
    holdings
        .expect_get_holdings()
        .returning(|_| Err(anyhow::anyhow!("503 Service Unavailable")));
    let settlement = MockSettlement::new();

    let (_tx, rx) = shutdown::channel();
    let mut bot = orchestrator(holdings, settlement, dca(10.0), 100.0, true, rx);

    assert!(bot.tick().await.is_err());
    assert_eq!(bot.iterations(), 1);
}

#[tokio::test]
async fn test_run_stops_immediately_when_already_shut_down() {
    let holdings = MockHoldings::new();
    let settlement = MockSettlement::new();
    let (tx, rx) = shutdown::channel();
    tx.send(true).unwrap();

    let mut bot = orchestrator(holdings, settlement, dca(10.0), 100.0, true, rx);
    let report = bot.run().await;

    assert_eq!(report.iterations, 0);
    assert_eq!(report.total_trades, 0);
    assert_eq!(report.strategy, "dca");
    assert!(report.simulation);
}

#[tokio::test(start_paused = true)]
async fn test_run_survives_tick_errors_until_shutdown() {
    let mut holdings = MockHoldings::new();
    holdings
        .expect_get_holdings()
        .returning(|_| Err(anyhow::anyhow!("boom")));
    let settlement = MockSettlement::new();
    let (tx, rx) = shutdown::channel();

    let mut bot = orchestrator(holdings, settlement, dca(10.0), 100.0, true, rx);

    // Three ticks at t=0, 300 and 600, then shutdown during the third sleep.
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(700)).await;
        let _ = tx.send(true);
    });

    let report = bot.run().await;
    assert_eq!(report.iterations, 3);
    assert!(report.last_trade_at.is_none());
}

#[tokio::test]
async fn test_simulated_tick_does_not_move_last_trade() {
    let mut holdings = MockHoldings::new();
    holdings.expect_get_holdings().returning(|_| Ok(snapshot(1000)));
    let mut settlement = MockSettlement::new();
    settlement
        .expect_preview_swap()
        .times(2)
        .returning(|_, _| Ok(preview(2)));
    settlement.expect_execute_swap().never();

    let (_tx, rx) = shutdown::channel();
    let mut bot = orchestrator(holdings, settlement, dca(10.0), 100.0, true, rx);

    // With no recorded trade, DCA stays due every tick in simulation.
    assert!(matches!(bot.tick().await.unwrap(), TickOutcome::Simulated));
    assert!(matches!(bot.tick().await.unwrap(), TickOutcome::Simulated));
    assert!(bot.state().last_trade_at().is_none());
}

#[test]
fn test_risk_gate_interval_uses_last_submission() {
    let gate = risk_gate(100.0);
    let now = Utc::now();
    assert!(gate.check(&proposal(10.0), Some(now - TimeDelta::seconds(10)), now).is_err());
    assert!(gate.check(&proposal(10.0), Some(now - TimeDelta::seconds(301)), now).is_ok());
}
