//! # Store Settings
//!
//! The configuration value object the engine receives with every operation:
//! currency, discount, tax and invoice numbering. Nothing in the engine
//! reads settings from global state.

use crate::error::CoreResult;
use crate::invoice::{InvoiceTemplate, SequenceReset};
use crate::money::{Money, Rate};

/// Store-wide pricing and numbering settings.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    /// ISO 4217 code, e.g. "IDR".
    pub currency: String,
    /// Digits after the decimal point in the currency (0 for IDR, 2 for USD).
    pub currency_decimals: u8,
    /// Applied to the subtotal first.
    pub discount: Rate,
    /// Applied to the discounted base.
    pub tax: Rate,
    pub invoice_template: InvoiceTemplate,
    pub sequence_reset: SequenceReset,
}

impl StoreSettings {
    /// Builds settings from configuration values, validating the template.
    ///
    /// ## Errors
    /// * `InvalidTemplate` - the template does not parse, or `Daily` reset is
    ///   paired with a template that does not print the full date
    pub fn new(
        currency: impl Into<String>,
        currency_decimals: u8,
        discount_percent: f64,
        tax_percent: f64,
        invoice_template: &str,
        sequence_width: usize,
        sequence_reset: SequenceReset,
    ) -> CoreResult<Self> {
        let invoice_template = InvoiceTemplate::parse(invoice_template, sequence_width)?;
        invoice_template.check_reset(sequence_reset)?;

        Ok(StoreSettings {
            currency: currency.into().trim().to_ascii_uppercase(),
            currency_decimals,
            discount: Rate::from_percentage(discount_percent).min_full(),
            tax: Rate::from_percentage(tax_percent),
            invoice_template,
            sequence_reset,
        })
    }

    /// Formats an amount for people: `IDR 1,250,000` or `USD 10.99`.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::{Money, StoreSettings};
    ///
    /// let settings = StoreSettings::default();
    /// assert_eq!(settings.format_amount(Money::from_minor(1_250_000)), "IDR 1,250,000");
    /// ```
    pub fn format_amount(&self, amount: Money) -> String {
        let minor = amount.minor();
        let sign = if minor < 0 { "-" } else { "" };
        let abs = minor.unsigned_abs();
        let divisor = 10_u64.pow(self.currency_decimals as u32);

        let major = group_thousands(abs / divisor);
        if self.currency_decimals == 0 {
            format!("{} {}{}", self.currency, sign, major)
        } else {
            format!(
                "{} {}{}.{:0width$}",
                self.currency,
                sign,
                major,
                abs % divisor,
                width = self.currency_decimals as usize
            )
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            currency: "IDR".to_string(),
            currency_decimals: 0,
            discount: Rate::zero(),
            tax: Rate::zero(),
            invoice_template: InvoiceTemplate::default(),
            sequence_reset: SequenceReset::Daily,
        }
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
