//! Scripted provider adapter for tests and development.
//!
//! Behaves like a real adapter with configurable outcomes: connect can be
//! made to fail, sync results can be scripted, and every call is recorded
//! for assertion. Implements the full capability set (integration, wallet,
//! OAuth) so one mock covers every registry path.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use crate::domain::foundation::Timestamp;
use crate::domain::integration::{
    ExpenseReport, ExternalAccount, IntegrationConfig, ProviderKind, SyncIssue, SyncResult,
};
use crate::ports::{
    IntegrationProvider, OAuthWallet, PaymentLink, ProviderError, WalletBalance, WalletProvider,
};

/// Scripted provider adapter.
pub struct MockProvider {
    kind: ProviderKind,
    fail_connect: AtomicBool,
    connected: AtomicBool,
    expenses_result: Mutex<SyncResult>,
    categories_result: Mutex<SyncResult>,
    reports: Mutex<HashMap<String, ExpenseReport>>,
    report_counter: AtomicU32,
    calls: Mutex<Vec<String>>,
}

impl MockProvider {
    /// Creates a mock that connects successfully and syncs nothing.
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            fail_connect: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            expenses_result: Mutex::new(SyncResult::ok(0)),
            categories_result: Mutex::new(SyncResult::ok(0)),
            reports: Mutex::new(HashMap::new()),
            report_counter: AtomicU32::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Makes `connect` (and `test_connection`) fail.
    pub fn with_failing_connect(self) -> Self {
        self.fail_connect.store(true, Ordering::SeqCst);
        self
    }

    /// Scripts the expense sync outcome.
    pub fn with_expenses_result(self, result: SyncResult) -> Self {
        *self.expenses_result.lock().unwrap() = result;
        self
    }

    /// Scripts the category sync outcome.
    pub fn with_categories_result(self, result: SyncResult) -> Self {
        *self.categories_result.lock().unwrap() = result;
        self
    }

    /// Stores credentials without probing, like the real adapters.
    pub async fn configure(&self, _config: &IntegrationConfig) -> Result<(), ProviderError> {
        self.record("configure");
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Returns the calls recorded so far.
    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn ensure_connected(&self) -> Result<(), ProviderError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ProviderError::not_connected(self.kind))
        }
    }
}

#[async_trait]
impl IntegrationProvider for MockProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn connect(&self, _config: &IntegrationConfig) -> Result<(), ProviderError> {
        self.record("connect");
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(ProviderError::connection("scripted connect failure"));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        self.record("disconnect");
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn test_connection(&self) -> bool {
        self.record("test_connection");
        !self.fail_connect.load(Ordering::SeqCst)
    }

    async fn sync_expenses(&self, _since: Option<Timestamp>) -> Result<SyncResult, ProviderError> {
        self.record("sync_expenses");
        self.ensure_connected()?;
        Ok(self.expenses_result.lock().unwrap().clone())
    }

    async fn sync_categories(&self) -> Result<SyncResult, ProviderError> {
        self.record("sync_categories");
        self.ensure_connected()?;
        Ok(self.categories_result.lock().unwrap().clone())
    }

    async fn create_expense_report(
        &self,
        report: &ExpenseReport,
    ) -> Result<ExpenseReport, ProviderError> {
        self.record("create_expense_report");
        self.ensure_connected()?;
        let n = self.report_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let mut created = report.clone();
        created.id = format!("mock-report-{}", n);
        self.reports
            .lock()
            .unwrap()
            .insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn update_expense_report(
        &self,
        report: &ExpenseReport,
    ) -> Result<ExpenseReport, ProviderError> {
        self.record("update_expense_report");
        self.ensure_connected()?;
        let mut reports = self.reports.lock().unwrap();
        if !reports.contains_key(&report.id) {
            return Err(ProviderError::not_found("report"));
        }
        reports.insert(report.id.clone(), report.clone());
        Ok(report.clone())
    }

    async fn get_expense_report(&self, report_id: &str) -> Result<ExpenseReport, ProviderError> {
        self.record("get_expense_report");
        self.ensure_connected()?;
        self.reports
            .lock()
            .unwrap()
            .get(report_id)
            .cloned()
            .ok_or_else(|| ProviderError::not_found("report"))
    }

    async fn get_categories(&self) -> Result<Vec<String>, ProviderError> {
        self.record("get_categories");
        Ok(vec!["Meals".to_string(), "Travel".to_string()])
    }

    fn get_mapping_fields(&self) -> HashMap<String, String> {
        HashMap::from([("id".to_string(), "mock_id".to_string())])
    }
}

#[async_trait]
impl WalletProvider for MockProvider {
    async fn create_payment_link(
        &self,
        amount: f64,
        currency: &str,
        _note: Option<&str>,
    ) -> Result<PaymentLink, ProviderError> {
        self.record("create_payment_link");
        self.ensure_connected()?;
        Ok(PaymentLink {
            url: format!("https://pay.mock.test/{:.2}", amount),
            reference: Some("mock-order-1".to_string()),
            amount,
            currency: currency.to_string(),
        })
    }

    async fn get_balance(&self) -> Result<WalletBalance, ProviderError> {
        self.record("get_balance");
        self.ensure_connected()?;
        Ok(WalletBalance {
            available: 100.0,
            currency: "USD".to_string(),
            as_of: Timestamp::now(),
        })
    }

    async fn validate_recipient(&self, handle: &str) -> Result<bool, ProviderError> {
        self.record("validate_recipient");
        Ok(!handle.is_empty() && !handle.contains(char::is_whitespace))
    }
}

#[async_trait]
impl OAuthWallet for MockProvider {
    fn authorization_url(&self, state: &str) -> String {
        format!("https://auth.mock.test/authorize?state={}", state)
    }

    async fn exchange_code(&self, code: &str) -> Result<ExternalAccount, ProviderError> {
        self.record("exchange_code");
        if code == "bad-code" {
            return Err(ProviderError::authentication("scripted exchange failure"));
        }
        Ok(ExternalAccount {
            account_id: format!("mock-account-{}", code),
            display_name: Some(format!("{} account", self.kind.display_name())),
        })
    }
}

/// Builds a failed sync result with one scripted issue.
pub fn failed_sync(code: &str, message: &str) -> SyncResult {
    SyncResult::failed(SyncIssue::new(code, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::IntegrationId;

    fn config() -> IntegrationConfig {
        IntegrationConfig::new(
            IntegrationId::new("mk-1").unwrap(),
            "Mock",
            ProviderKind::PayPal,
        )
    }

    #[tokio::test]
    async fn scripted_connect_failure() {
        let mock = MockProvider::new(ProviderKind::PayPal).with_failing_connect();
        assert!(mock.connect(&config()).await.is_err());
        assert!(!mock.test_connection().await);
    }

    #[tokio::test]
    async fn report_lifecycle_round_trips() {
        let mock = MockProvider::new(ProviderKind::Expensify);
        mock.connect(&config()).await.unwrap();

        let draft = ExpenseReport::draft("r", "a@b.c", 10.0, "USD");
        let created = mock.create_expense_report(&draft).await.unwrap();
        assert_eq!(created.id, "mock-report-1");

        let fetched = mock.get_expense_report(&created.id).await.unwrap();
        assert_eq!(fetched.title, "r");

        let mut updated = fetched.clone();
        updated.total_amount = 20.0;
        mock.update_expense_report(&updated).await.unwrap();
        let fetched = mock.get_expense_report(&created.id).await.unwrap();
        assert_eq!(fetched.total_amount, 20.0);
    }

    #[tokio::test]
    async fn calls_are_recorded() {
        let mock = MockProvider::new(ProviderKind::Venmo);
        mock.connect(&config()).await.unwrap();
        mock.sync_expenses(None).await.unwrap();
        let calls = mock.recorded_calls();
        assert_eq!(calls, vec!["connect", "sync_expenses"]);
    }

    #[tokio::test]
    async fn exchange_code_honors_bad_code() {
        let mock = MockProvider::new(ProviderKind::CashApp);
        assert!(mock.exchange_code("bad-code").await.is_err());
        let account = mock.exchange_code("ok").await.unwrap();
        assert_eq!(account.account_id, "mock-account-ok");
    }
}
