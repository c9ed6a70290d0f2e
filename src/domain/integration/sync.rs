//! Sync result shape returned by provider sync operations.
//!
//! Sync failures travel inside the result rather than as errors so the
//! registry can run remaining sync steps and report partial success.

use serde::{Deserialize, Serialize};

/// A structured error captured during a sync step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncIssue {
    /// Machine-readable code, e.g. `PROVIDER_ERROR`.
    pub code: String,
    /// Human-readable description.
    pub message: String,
    /// Provider-specific context, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl SyncIssue {
    /// Creates a sync issue without details.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Attaches provider-specific details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Outcome of one sync operation (or of several merged steps).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResult {
    /// True only if every merged step succeeded.
    pub success: bool,
    /// Total items pulled across merged steps.
    pub synced_items: u32,
    /// Structured errors from failed steps.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<SyncIssue>,
    /// Opaque provider-specific payload (synced records, category names).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl SyncResult {
    /// Creates a successful result.
    pub fn ok(synced_items: u32) -> Self {
        Self {
            success: true,
            synced_items,
            errors: Vec::new(),
            details: None,
        }
    }

    /// Creates a successful result carrying a details payload.
    pub fn ok_with_details(synced_items: u32, details: serde_json::Value) -> Self {
        Self {
            success: true,
            synced_items,
            errors: Vec::new(),
            details: Some(details),
        }
    }

    /// Creates a failed result from a single issue.
    pub fn failed(issue: SyncIssue) -> Self {
        Self {
            success: false,
            synced_items: 0,
            errors: vec![issue],
            details: None,
        }
    }

    /// Merges another step into this result.
    ///
    /// Item counts sum, success ANDs, errors concatenate, and details
    /// payloads collect into an array when both sides carry one.
    pub fn merge(mut self, other: SyncResult) -> SyncResult {
        self.success = self.success && other.success;
        self.synced_items += other.synced_items;
        self.errors.extend(other.errors);
        self.details = match (self.details.take(), other.details) {
            (None, d) => d,
            (d, None) => d,
            (Some(a), Some(b)) => Some(serde_json::json!([a, b])),
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_counts_and_ands_success() {
        let merged = SyncResult::ok(3).merge(SyncResult::ok(4));
        assert!(merged.success);
        assert_eq!(merged.synced_items, 7);
        assert!(merged.errors.is_empty());
    }

    #[test]
    fn merge_with_failure_is_failure_but_keeps_counts() {
        let merged =
            SyncResult::ok(5).merge(SyncResult::failed(SyncIssue::new("PROVIDER_ERROR", "boom")));
        assert!(!merged.success);
        assert_eq!(merged.synced_items, 5);
        assert_eq!(merged.errors.len(), 1);
        assert_eq!(merged.errors[0].code, "PROVIDER_ERROR");
    }

    #[test]
    fn merge_collects_details_payloads() {
        let merged = SyncResult::ok_with_details(1, serde_json::json!({"a": 1}))
            .merge(SyncResult::ok_with_details(1, serde_json::json!({"b": 2})));
        let details = merged.details.unwrap();
        assert!(details.is_array());
        assert_eq!(details.as_array().unwrap().len(), 2);
    }
}
