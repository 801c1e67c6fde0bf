use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    batch::{
        assembler,
        draft::{BatchDraft, Selection},
        entry::{EntryField, TransferEntry},
        executor::{BatchExecutor, BatchTarget},
        guard,
        normalizer::{self, NormalizedBatch},
    },
    error::{AppError, AppResult, LedgerError, SubmissionError},
    ledger::LedgerGateway,
    orders::{Order, OrderLog},
};

#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    /// Balance the user was shown when confirming
    pub expected_balance: Option<Decimal>,
    pub max_fees: Decimal,
}

/// Draft state plus the verdict of the balance guard
#[derive(Debug, Clone, Serialize)]
pub struct DraftSummary {
    pub selection: Option<Selection>,
    pub entries: Vec<TransferEntry>,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub available_balance: Option<Decimal>,
    pub can_submit: bool,
    pub rejection: Option<String>,
    pub in_flight: bool,
}

async fn bounded<T, F>(limit: Duration, endpoint: &str, call: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| LedgerError::Timeout {
            endpoint: endpoint.to_string(),
        })?
}

/// Drives a batch from the editable draft to an order in the log
#[derive(Clone)]
pub struct DisbursementService {
    gateway: Arc<dyn LedgerGateway>,
    executor: Arc<BatchExecutor>,
    order_log: Arc<dyn OrderLog>,
    draft: Arc<Mutex<BatchDraft>>,
    lookup_timeout: Duration,
}

impl DisbursementService {
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        executor: Arc<BatchExecutor>,
        order_log: Arc<dyn OrderLog>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            executor,
            order_log,
            draft: Arc::new(Mutex::new(BatchDraft::new())),
            lookup_timeout,
        }
    }

    pub fn executor(&self) -> &Arc<BatchExecutor> {
        &self.executor
    }

    pub fn draft(&self) -> BatchDraft {
        self.draft.lock().clone()
    }

    pub fn select(&self, chain: &str, token: &str) {
        self.draft.lock().select(chain, token);
    }

    /// Load delimited text into the draft, replacing its rows
    pub fn import(&self, raw: &str) -> NormalizedBatch {
        let normalized = normalizer::normalize(raw);
        self.draft.lock().replace_entries(normalized.entries.clone());
        info!(
            "Imported {} entries ({} skipped)",
            normalized.entries.len(),
            normalized.skipped.len()
        );
        normalized
    }

    pub fn add_row(&self) -> TransferEntry {
        self.draft.lock().add_row().clone()
    }

    pub fn update_row(&self, index: usize, field: EntryField, value: &str) -> AppResult<TransferEntry> {
        self.draft.lock().update(index, field, value).cloned()
    }

    pub fn reset_draft(&self) {
        self.draft.lock().reset();
    }

    pub async fn available_balance(&self, chain: &str, token: &str) -> AppResult<Decimal> {
        bounded(
            self.lookup_timeout,
            "balance",
            self.gateway.get_balance(chain, token),
        )
        .await
    }

    /// First checkpoint: evaluate the draft against the current balance
    pub async fn summarize(&self) -> AppResult<DraftSummary> {
        let draft = self.draft();
        let total_amount = guard::total_amount(draft.entries());

        let (available_balance, rejection) = match draft.selection() {
            Some(selection) => {
                let available = self
                    .available_balance(&selection.chain, &selection.token)
                    .await?;
                (Some(available), guard::check(draft.entries(), available).err())
            }
            None => (None, Some(SubmissionError::NoSelection)),
        };

        Ok(DraftSummary {
            selection: draft.selection().cloned(),
            entries: draft.entries().to_vec(),
            total_amount,
            available_balance,
            can_submit: available_balance
                .map(|available| guard::can_submit(draft.entries(), available))
                .unwrap_or(false),
            rejection: rejection.map(|e| e.to_string()),
            in_flight: self.executor.is_running(),
        })
    }

    /// First checkpoint as a hard check: the guard's refusal becomes the error
    pub async fn check_draft(&self) -> AppResult<DraftSummary> {
        let draft = self.draft();
        let selection = draft
            .selection()
            .cloned()
            .ok_or(SubmissionError::NoSelection)?;

        let available = self
            .available_balance(&selection.chain, &selection.token)
            .await?;
        let total_amount = guard::check(draft.entries(), available)?;

        Ok(DraftSummary {
            selection: Some(selection),
            entries: draft.entries().to_vec(),
            total_amount,
            available_balance: Some(available),
            can_submit: true,
            rejection: None,
            in_flight: self.executor.is_running(),
        })
    }

    /// Submit the current draft. The draft is cleared together with recording
    /// the order, so it is gone even if the caller stops waiting.
    pub async fn submit_draft(&self, options: SubmitOptions) -> AppResult<Order> {
        let draft = self.draft();
        let selection = draft
            .selection()
            .cloned()
            .ok_or(SubmissionError::NoSelection)?;

        self.run_batch(
            draft.entries().to_vec(),
            selection,
            options,
            Some(self.draft.clone()),
        )
        .await
    }

    /// Guard, execute, assemble and record one batch.
    ///
    /// Once transfers have started the batch runs to the end even if the
    /// caller goes away.
    pub async fn execute_batch(
        &self,
        entries: Vec<TransferEntry>,
        selection: Selection,
        options: SubmitOptions,
    ) -> AppResult<Order> {
        self.run_batch(entries, selection, options, None).await
    }

    #[instrument(skip(self, entries, options, draft), fields(chain = %selection.chain, token = %selection.token))]
    async fn run_batch(
        &self,
        entries: Vec<TransferEntry>,
        selection: Selection,
        options: SubmitOptions,
        draft: Option<Arc<Mutex<BatchDraft>>>,
    ) -> AppResult<Order> {
        let claim = self.executor.try_begin()?;

        if let Some(seen) = options.expected_balance {
            guard::check(&entries, seen)?;
        }
        let available = self
            .available_balance(&selection.chain, &selection.token)
            .await?;
        guard::check(&entries, available)?;

        let token = bounded(
            self.lookup_timeout,
            "supported tokens",
            self.gateway.resolve_token(&selection.chain, &selection.token),
        )
        .await?;

        let target = BatchTarget {
            chain: selection.chain,
            token: selection.token,
            token_address: token.token_address,
        };
        let executor = self.executor.clone();
        let order_log = self.order_log.clone();

        let task = tokio::spawn(async move {
            // released only after the draft is cleared
            let _claim = claim;
            let batch_id = Uuid::new_v4();

            let outcomes = executor.run(batch_id, &target, &entries).await;
            let order = assembler::assemble(batch_id, &target, options.max_fees, &entries, outcomes)?;
            order_log.append(order.clone()).await?;

            if let Some(draft) = draft {
                draft.lock().reset();
            }

            info!(
                "📦 Order {} recorded: {} {} to {} wallets",
                order.id, order.total_amount, order.token, order.total_wallets
            );
            Ok::<Order, AppError>(order)
        });

        task.await
            .map_err(|e| AppError::Internal(format!("batch task aborted: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::executor::ExecutorConfig;
    use crate::ledger::stub::{StubLedger, TransferScript};
    use crate::orders::{ExpiringOrderLog, OutcomeStatus, TransferOutcome};
    use rust_decimal_macros::dec;

    fn service(stub: Arc<StubLedger>) -> (DisbursementService, Arc<ExpiringOrderLog>) {
        let log = Arc::new(ExpiringOrderLog::new(Duration::from_secs(600)));
        let executor = Arc::new(BatchExecutor::new(stub.clone(), ExecutorConfig::default()));
        let service = DisbursementService::new(stub, executor, log.clone(), Duration::from_secs(1));
        (service, log)
    }

    fn ledger() -> StubLedger {
        StubLedger::new()
            .with_token("APTOS", "APT", "0x1::aptos_coin")
            .with_balance("APTOS", "APT", dec!(15))
            .with_transfer("0xA", TransferScript::Accept("o1".to_string()))
    }

    #[tokio::test]
    async fn test_import_submit_and_record() {
        let stub = Arc::new(ledger());
        let (service, log) = service(stub.clone());

        service.select("APTOS", "APT");
        service.import("id,address,amount\n1,0xA,10\n2,0xB,5");

        let order = service.submit_draft(SubmitOptions::default()).await.unwrap();

        assert_eq!(order.total_amount, dec!(15));
        assert_eq!(order.total_wallets, 2);
        assert_eq!(
            order.outcomes,
            vec![TransferOutcome::success("0xA", "o1"), TransferOutcome::failed("0xB")]
        );
        assert_eq!(log.list().await.unwrap().len(), 1);
        assert!(service.draft().entries().is_empty());
        assert!(service.draft().selection().is_none());
        assert!(!service.executor().is_running());
    }

    #[tokio::test]
    async fn test_guard_blocks_without_side_effects() {
        let stub = Arc::new(ledger().with_balance("APTOS", "APT", dec!(14)));
        let (service, log) = service(stub.clone());

        service.select("APTOS", "APT");
        service.import("h\n1,0xA,10\n2,0xB,5");

        let result = service.submit_draft(SubmitOptions::default()).await;

        assert!(matches!(
            result,
            Err(AppError::Submission(SubmissionError::InsufficientBalance { .. }))
        ));
        assert!(stub.transfers_made().is_empty());
        assert!(log.list().await.unwrap().is_empty());
        assert_eq!(service.draft().entries().len(), 2);
        assert!(!service.executor().is_running());
    }

    #[tokio::test]
    async fn test_stale_confirmed_balance_is_rejected() {
        let stub = Arc::new(ledger().with_balance("APTOS", "APT", dec!(100)));
        let (service, _) = service(stub.clone());

        let result = service
            .execute_batch(
                vec![TransferEntry::new(1, "0xA", "20")],
                Selection { chain: "APTOS".to_string(), token: "APT".to_string() },
                SubmitOptions { expected_balance: Some(dec!(10)), max_fees: dec!(0) },
            )
            .await;

        assert!(matches!(result, Err(AppError::Submission(_))));
        assert!(stub.transfers_made().is_empty());
    }

    #[tokio::test]
    async fn test_balance_is_rechecked_at_submission() {
        let stub = Arc::new(ledger().with_balance("APTOS", "APT", dec!(100)));
        let (service, _) = service(stub.clone());
        service.select("APTOS", "APT");
        service.import("h\n1,0xA,50");

        assert!(service.summarize().await.unwrap().can_submit);

        stub.set_balance("APTOS", "APT", dec!(10));
        let result = service
            .submit_draft(SubmitOptions { expected_balance: Some(dec!(100)), max_fees: dec!(0) })
            .await;

        assert!(matches!(
            result,
            Err(AppError::Submission(SubmissionError::InsufficientBalance { .. }))
        ));
    }

    #[tokio::test]
    async fn test_resubmission_refused_while_running() {
        let stub = Arc::new(ledger());
        let (service, _) = service(stub.clone());
        let _claim = service.executor().try_begin().unwrap();

        let result = service
            .execute_batch(
                vec![TransferEntry::new(1, "0xA", "1")],
                Selection { chain: "APTOS".to_string(), token: "APT".to_string() },
                SubmitOptions::default(),
            )
            .await;

        assert!(matches!(result, Err(AppError::BatchInFlight)));
        assert!(stub.transfers_made().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_token_is_rejected() {
        let stub = Arc::new(ledger().with_balance("APTOS", "USDT", dec!(100)));
        let (service, _) = service(stub.clone());

        let result = service
            .execute_batch(
                vec![TransferEntry::new(1, "0xA", "1")],
                Selection { chain: "APTOS".to_string(), token: "USDT".to_string() },
                SubmitOptions::default(),
            )
            .await;

        assert!(matches!(result, Err(AppError::TokenNotFound { .. })));
    }

    #[tokio::test]
    async fn test_summary_without_selection() {
        let (service, _) = service(Arc::new(ledger()));
        service.add_row();
        service.update_row(0, EntryField::Recipient, "0xA").unwrap();
        service.update_row(0, EntryField::Amount, "3").unwrap();

        let summary = service.summarize().await.unwrap();
        assert!(!summary.can_submit);
        assert_eq!(summary.total_amount, dec!(3));
        assert!(summary.available_balance.is_none());
        assert_eq!(summary.rejection.as_deref(), Some("No chain/token selected"));
    }

    #[tokio::test]
    async fn test_check_reports_the_guard_verdict() {
        let stub = Arc::new(ledger().with_balance("APTOS", "APT", dec!(5)));
        let (service, _) = service(stub.clone());
        service.select("APTOS", "APT");
        service.import("h\n1,0xA,3\n2,0xB,2");

        let summary = service.check_draft().await.unwrap();
        assert_eq!(summary.total_amount, dec!(5));

        service.update_row(1, EntryField::Amount, "2.5").unwrap();
        let result = service.check_draft().await;
        assert!(matches!(
            result,
            Err(AppError::Submission(SubmissionError::InsufficientBalance { .. }))
        ));
        assert!(stub.transfers_made().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_submission_still_clears_draft() {
        let stub = Arc::new(ledger().with_transfer("0xA", TransferScript::Stall(Duration::from_millis(300))));
        let (service, log) = service(stub.clone());
        service.select("APTOS", "APT");
        service.import("h\n1,0xA,10");

        // caller gives up while the transfer is still running
        let abandoned = tokio::time::timeout(
            Duration::from_millis(50),
            service.submit_draft(SubmitOptions::default()),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(log.list().await.unwrap().len(), 1);
        assert!(service.draft().entries().is_empty());
        assert!(service.draft().selection().is_none());
        assert!(!service.executor().is_running());

        let resubmit = service.submit_draft(SubmitOptions::default()).await;
        assert!(matches!(
            resubmit,
            Err(AppError::Submission(SubmissionError::NoSelection))
        ));
        assert_eq!(stub.transfers_made().len(), 1);
    }

    #[tokio::test]
    async fn test_execute_batch_leaves_draft_alone() {
        let stub = Arc::new(ledger());
        let (service, _) = service(stub);
        service.select("APTOS", "APT");
        service.import("h\n1,0xA,3");

        service
            .execute_batch(
                vec![TransferEntry::new(1, "0xA", "1")],
                Selection { chain: "APTOS".to_string(), token: "APT".to_string() },
                SubmitOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(service.draft().entries().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_outcomes_keep_order_totals() {
        let stub = Arc::new(
            ledger()
                .with_balance("APTOS", "APT", dec!(100))
                .with_transfer("0xA", TransferScript::Reject),
        );
        let (service, _) = service(stub);

        let order = service
            .execute_batch(
                vec![TransferEntry::new(1, "0xA", "7"), TransferEntry::new(2, "0xB", "3")],
                Selection { chain: "APTOS".to_string(), token: "APT".to_string() },
                SubmitOptions { expected_balance: None, max_fees: dec!(0.01) },
            )
            .await
            .unwrap();

        assert_eq!(order.total_amount, dec!(10));
        assert_eq!(order.max_fees, dec!(0.01));
        assert!(order.outcomes.iter().all(|o| o.status() == OutcomeStatus::Failed));
    }
}
