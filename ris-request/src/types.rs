//! Wire-level value types for RIS request fields

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Payment token encoding (`PENC`)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentEncoding {
    /// One-way KHASH encoding
    #[default]
    Khash,
    /// First-6/last-4 masking
    Mask,
    /// Plaintext token (empty `PENC`)
    Plain,
    /// Unrecognized `PENC` value, sent verbatim
    Other(String),
}

impl PaymentEncoding {
    /// Wire value
    pub fn as_str(&self) -> &str {
        match self {
            PaymentEncoding::Khash => "KHASH",
            PaymentEncoding::Mask => "MASK",
            PaymentEncoding::Plain => "",
            PaymentEncoding::Other(raw) => raw,
        }
    }

    /// Parse a raw `PENC` value. Unrecognized values are kept as
    /// [`PaymentEncoding::Other`].
    pub fn from_wire(value: &str) -> Self {
        match value {
            "KHASH" => PaymentEncoding::Khash,
            "MASK" => PaymentEncoding::Mask,
            "" => PaymentEncoding::Plain,
            other => PaymentEncoding::Other(other.to_string()),
        }
    }
}

impl fmt::Display for PaymentEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merchant acknowledgment to ship/process the order (`MACK`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MerchantAcknowledgment {
    /// `Y`
    Yes,
    /// `N`
    No,
}

impl MerchantAcknowledgment {
    /// Wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            MerchantAcknowledgment::Yes => "Y",
            MerchantAcknowledgment::No => "N",
        }
    }
}

impl FromStr for MerchantAcknowledgment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "YES" => Ok(MerchantAcknowledgment::Yes),
            "NO" => Ok(MerchantAcknowledgment::No),
            other => Err(Error::UnrecognizedMerchantAcknowledgment(other.to_string())),
        }
    }
}

/// Authorization status returned by the processor (`AUTH`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthStatus {
    /// Authorized; counts towards persona velocity
    Approved,
    /// Declined; decrements persona velocity
    Declined,
}

impl AuthStatus {
    /// Wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthStatus::Approved => "A",
            AuthStatus::Declined => "D",
        }
    }
}

/// Bankcard AVS / CVV reply (`AVSZ`, `AVST`, `CVVR`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BankcardReply {
    /// Match
    Match,
    /// No match
    NoMatch,
    /// Unsupported or unavailable
    Unavailable,
}

impl BankcardReply {
    /// Wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            BankcardReply::Match => "M",
            BankcardReply::NoMatch => "N",
            BankcardReply::Unavailable => "X",
        }
    }
}

/// RIS inquiry mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum InquiryMode {
    /// Internet order (`Q`)
    #[default]
    #[serde(rename = "Q")]
    Default,
    /// Phone order (`P`)
    #[serde(rename = "P")]
    Phone,
    /// Kount Central full inquiry with thresholds (`W`)
    #[serde(rename = "W")]
    WithThresholds,
    /// Kount Central fast inquiry, thresholds only (`J`)
    #[serde(rename = "J")]
    JustThresholds,
}

impl InquiryMode {
    /// Wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryMode::Default => "Q",
            InquiryMode::Phone => "P",
            InquiryMode::WithThresholds => "W",
            InquiryMode::JustThresholds => "J",
        }
    }
}

impl fmt::Display for InquiryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_wire_values() {
        assert_eq!(PaymentEncoding::default().as_str(), "KHASH");
        assert_eq!(PaymentEncoding::from_wire("MASK"), PaymentEncoding::Mask);
        assert_eq!(PaymentEncoding::from_wire(""), PaymentEncoding::Plain);
        assert_eq!(
            PaymentEncoding::from_wire("khash"),
            PaymentEncoding::Other("khash".to_string())
        );
        assert_eq!(PaymentEncoding::from_wire("KHASH2").as_str(), "KHASH2");
    }

    #[test]
    fn test_merchant_acknowledgment_parse() {
        assert_eq!("YES".parse::<MerchantAcknowledgment>().unwrap().as_str(), "Y");
        assert_eq!("NO".parse::<MerchantAcknowledgment>().unwrap().as_str(), "N");

        let err = "MAYBE".parse::<MerchantAcknowledgment>().unwrap_err();
        assert!(matches!(err, Error::UnrecognizedMerchantAcknowledgment(v) if v == "MAYBE"));
    }
}
