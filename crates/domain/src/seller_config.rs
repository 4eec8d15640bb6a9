//! Merging per-server seller configuration into one editable form.

use async_trait::async_trait;
use serde::Serialize;

use crate::model::{SellerConfiguration, SellerConfigurationWire, ServerResults};

/// Payment methods the listing bots understand.
pub const PAYMENT_METHOD_ALLOW_LIST: [&str; 16] = [
    "paypal",
    "bitcoin",
    "litecoin",
    "ethereum",
    "venmo",
    "cashapp",
    "zelle",
    "paysafecard",
    "google_pay",
    "apple_pay",
    "binance_pay",
    "swap",
    "bank_transfer",
    "usdc",
    "usdt",
    "solana",
];

pub fn is_allowed_payment_method(method: &str) -> bool {
    let lowered = method.to_lowercase();
    PAYMENT_METHOD_ALLOW_LIST.contains(&lowered.as_str())
}

/// Outcome of checking stored payment methods against the allow-list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaymentMethodReport {
    /// Allowed methods in their original spelling.
    pub valid: Vec<String>,
    pub invalid: Vec<String>,
    /// Lower-cased, de-duplicated allowed methods in first-seen order.
    pub suggested: Vec<String>,
}

impl PaymentMethodReport {
    pub fn from_methods(methods: &[String]) -> Self {
        let mut report = Self::default();
        for method in methods {
            let lowered = method.to_lowercase();
            if is_allowed_payment_method(&lowered) {
                report.valid.push(method.clone());
                if !report.suggested.contains(&lowered) {
                    report.suggested.push(lowered);
                }
            } else {
                report.invalid.push(method.clone());
            }
        }
        report
    }

    pub fn needs_correction(&self) -> bool {
        !self.invalid.is_empty()
    }

    /// `/`-joined suggestion, as offered to the user.
    pub fn suggested_string(&self) -> String {
        self.suggested.join("/")
    }
}

/// How the user chose to resolve invalid payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionDecision {
    AcceptSuggested,
    KeepValid,
}

/// Asks the user how to resolve invalid payment methods without blocking
/// the runtime.
#[async_trait]
pub trait CorrectionPrompt: Send + Sync {
    async fn decide(&self, report: &PaymentMethodReport) -> CorrectionDecision;
}

/// Prompt that always answers the same way; used by non-interactive
/// callers.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecision(pub CorrectionDecision);

#[async_trait]
impl CorrectionPrompt for FixedDecision {
    async fn decide(&self, _report: &PaymentMethodReport) -> CorrectionDecision {
        self.0
    }
}

/// Result of merging before any correction is applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigurationMerge {
    pub configuration: SellerConfiguration,
    /// Server whose data seeded the form, `None` when every server failed.
    pub source: Option<String>,
    /// Present only when invalid methods were found.
    pub report: Option<PaymentMethodReport>,
}

impl ConfigurationMerge {
    /// Applies the user's decision to the payment methods and returns the
    /// final form. Without a report the configuration is already final.
    pub fn resolve(self, decision: CorrectionDecision) -> SellerConfiguration {
        let mut configuration = self.configuration;
        if let Some(report) = self.report {
            configuration.payment_methods = match decision {
                CorrectionDecision::AcceptSuggested => report.suggested,
                CorrectionDecision::KeepValid => report.valid,
            };
        }
        configuration
    }

    /// Resolves through `prompt`, only consulting it when needed.
    pub async fn resolve_with(self, prompt: &dyn CorrectionPrompt) -> SellerConfiguration {
        let decision = match &self.report {
            Some(report) => prompt.decide(report).await,
            None => CorrectionDecision::KeepValid,
        };
        self.resolve(decision)
    }
}

/// Seeds the form from the first server with `success` and data; its
/// sellauth and payment details overlay the defaults field by field.
pub fn merge_seller_configuration(
    results: &ServerResults<SellerConfigurationWire>,
) -> ConfigurationMerge {
    let mut merge = ConfigurationMerge::default();
    let Some((server, data)) = results.first_success() else {
        return merge;
    };
    merge.source = Some(server.to_string());

    if let Some(sellauth) = &data.sellauth {
        merge.configuration.sellauth.apply(sellauth);
    }
    if let Some(methods) = &data.payment_methods {
        let report = PaymentMethodReport::from_methods(&methods.normalize());
        if report.needs_correction() {
            tracing::info!(
                server,
                invalid = ?report.invalid,
                "stored payment methods include unsupported entries"
            );
            merge.configuration.payment_methods = report.valid.clone();
            merge.report = Some(report);
        } else {
            merge.configuration.payment_methods = report.valid;
        }
    }
    if let Some(details) = &data.payment_details {
        merge.configuration.payment_details.apply(details);
    }

    merge
}

/// Payment methods attached to listing payloads: the first successful
/// server's value, with lists joined by `/`.
pub fn payment_methods_string(results: &ServerResults<SellerConfigurationWire>) -> Option<String> {
    results
        .first_success()
        .and_then(|(_, data)| data.payment_methods.as_ref())
        .map(|methods| methods.joined())
        .filter(|joined| !joined.is_empty())
}
