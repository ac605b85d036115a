//! Payment instruments and their wire representation
//!
//! Every instrument is reduced to three wire fields: `PTOK` (token),
//! `PTYP` (4-letter type code) and `LAST4`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment instrument kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentKind {
    /// No payment (`NONE`)
    None,
    /// Credit or debit card (`CARD`)
    Card,
    /// Check (`CHEK`)
    Check,
    /// Gift card (`GIFT`)
    GiftCard,
    /// Google payment (`GOOG`)
    Google,
    /// Green Dot MoneyPak (`GDMP`)
    GreenDotMoneyPak,
    /// Bill Me Later (`BLML`)
    BillMeLater,
    /// PayPal (`PYPL`)
    Paypal,
    /// Type code outside the known table, carried verbatim
    Other(String),
}

impl PaymentKind {
    /// Map a type code onto a kind. Unknown codes become [`PaymentKind::Other`].
    pub fn for_code(code: &str) -> Self {
        match code {
            "NONE" => PaymentKind::None,
            "CARD" => PaymentKind::Card,
            "CHEK" => PaymentKind::Check,
            "GIFT" => PaymentKind::GiftCard,
            "GOOG" => PaymentKind::Google,
            "GDMP" => PaymentKind::GreenDotMoneyPak,
            "BLML" => PaymentKind::BillMeLater,
            "PYPL" => PaymentKind::Paypal,
            other => PaymentKind::Other(other.to_string()),
        }
    }

    /// Wire type code (`PTYP`)
    pub fn code(&self) -> &str {
        match self {
            PaymentKind::None => "NONE",
            PaymentKind::Card => "CARD",
            PaymentKind::Check => "CHEK",
            PaymentKind::GiftCard => "GIFT",
            PaymentKind::Google => "GOOG",
            PaymentKind::GreenDotMoneyPak => "GDMP",
            PaymentKind::BillMeLater => "BLML",
            PaymentKind::Paypal => "PYPL",
            PaymentKind::Other(code) => code,
        }
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A payment instrument attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    kind: PaymentKind,
    token: String,
    last4: String,
    khashed: bool,
}

impl Payment {
    /// Create a payment. `last4` is taken from the raw token here and never
    /// recomputed.
    pub fn new(kind: PaymentKind, token: impl Into<String>) -> Self {
        let token = token.into();
        let last4 = last_chars(&token, 4).to_string();

        Self {
            kind,
            token,
            last4,
            khashed: false,
        }
    }

    /// Build a payment from a type code and token
    pub fn for_code(code: &str, token: impl Into<String>) -> Self {
        Self::new(PaymentKind::for_code(code), token)
    }

    /// The no-payment instrument
    pub fn none() -> Self {
        Self::new(PaymentKind::None, "")
    }

    /// Card payment
    pub fn card(number: impl Into<String>) -> Self {
        Self::new(PaymentKind::Card, number)
    }

    /// Check payment (micr line)
    pub fn check(micr: impl Into<String>) -> Self {
        Self::new(PaymentKind::Check, micr)
    }

    /// Gift card payment
    pub fn gift_card(number: impl Into<String>) -> Self {
        Self::new(PaymentKind::GiftCard, number)
    }

    /// Google payment
    pub fn google(id: impl Into<String>) -> Self {
        Self::new(PaymentKind::Google, id)
    }

    /// Green Dot MoneyPak payment
    pub fn green_dot_money_pak(id: impl Into<String>) -> Self {
        Self::new(PaymentKind::GreenDotMoneyPak, id)
    }

    /// Bill Me Later payment
    pub fn bill_me_later(id: impl Into<String>) -> Self {
        Self::new(PaymentKind::BillMeLater, id)
    }

    /// PayPal payment (payer id)
    pub fn paypal(payer_id: impl Into<String>) -> Self {
        Self::new(PaymentKind::Paypal, payer_id)
    }

    /// Payment kind
    pub fn kind(&self) -> &PaymentKind {
        &self.kind
    }

    /// Current token, KHASH-encoded once [`Payment::is_khashed`] is true
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Last four characters of the original token
    pub fn last4(&self) -> &str {
        &self.last4
    }

    /// Whether the token has been replaced by its KHASH form
    pub fn is_khashed(&self) -> bool {
        self.khashed
    }

    /// Check if this is a card payment
    pub fn is_card(&self) -> bool {
        self.kind == PaymentKind::Card
    }

    /// Check if this is the no-payment instrument
    pub fn is_none(&self) -> bool {
        self.kind == PaymentKind::None
    }

    /// Replace the token with its KHASH form. Only the first call has any
    /// effect.
    pub(crate) fn apply_khash(&mut self, hashed: String) {
        if self.khashed {
            return;
        }
        self.token = hashed;
        self.khashed = true;
    }

    /// The `PTOK`/`PTYP`/`LAST4` triple for the current token
    pub fn wire_fields(&self) -> PaymentFields {
        PaymentFields {
            token: self.token.clone(),
            payment_type: self.kind.code().to_string(),
            last4: self.last4.clone(),
        }
    }
}

/// Wire triple written for an attached payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFields {
    /// `PTOK`
    pub token: String,
    /// `PTYP`
    pub payment_type: String,
    /// `LAST4`
    pub last4: String,
}

/// Trailing `n` characters of `s` (all of `s` when shorter)
pub(crate) fn last_chars(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    let start = s
        .char_indices()
        .nth(count - n)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    &s[start..]
}
