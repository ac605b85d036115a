//! RIS request parameter store
//!
//! [`RisRequest`] accumulates the fields of one inquiry or update and
//! flattens them into the key/value map handed to the transport.
//!
//! # Invariants
//!
//! - `VERS` and `PENC` are always present
//! - Once a payment is attached, `PTOK`, `PTYP` and `LAST4` are written
//!   together from the same payment and never partially updated
//! - A failed payment attachment leaves the store as it was

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::config::Config;
use crate::khash::{mask_token, HashError, Khash, TokenHasher};
use crate::payment::{Payment, PaymentFields, PaymentKind};
use crate::types::{AuthStatus, BankcardReply, MerchantAcknowledgment, PaymentEncoding};
use crate::{Error, Result};

/// Default RIS protocol version
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Default SDK identifier
pub const DEFAULT_SDK: &str = "Rust";

/// Payload of a RIS inquiry or update
pub struct RisRequest {
    version: String,
    sdk: String,
    encoding: PaymentEncoding,
    payment: Option<Payment>,
    payment_fields: Option<PaymentFields>,
    params: BTreeMap<String, String>,
    close_on_finish: bool,
    hasher: Arc<dyn TokenHasher>,
}

impl RisRequest {
    /// Create a request with KHASH encoding enabled
    pub fn new(hasher: Arc<dyn TokenHasher>) -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            sdk: DEFAULT_SDK.to_string(),
            encoding: PaymentEncoding::Khash,
            payment: None,
            payment_fields: None,
            params: BTreeMap::new(),
            close_on_finish: false,
            hasher,
        }
    }

    /// Create a request from configuration, hashing with [`Khash`]
    pub fn from_config(config: &Config) -> Self {
        let hasher = match &config.khash_salt {
            Some(salt) => Khash::new(salt.clone()),
            None => Khash::unconfigured(),
        };

        if config.khash_enabled && config.khash_salt.is_none() {
            warn!("No KHASH salt configured, payment tokens will be sent in plaintext");
        }

        let mut request = Self::new(Arc::new(hasher));
        request.set_version(config.version.clone());
        request.sdk = config.sdk.clone();
        request.set_khash_payment_encoding(config.khash_enabled);
        if let Some(merchant_id) = &config.merchant_id {
            request.set_merchant(merchant_id.clone());
        }
        request
    }

    /// Set any wire field. No validation is done here.
    ///
    /// `VERS`, `SDK` and `PENC` update their typed fields. `PTOK`, `PTYP` and
    /// `LAST4` are shadowed by an attached payment.
    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        match key.as_str() {
            "VERS" => self.version = value,
            "SDK" => self.sdk = value,
            "PENC" => self.encoding = PaymentEncoding::from_wire(&value),
            _ => {
                self.params.insert(key, value);
            }
        }
    }

    /// Raw value of a wire field, as it would appear in [`RisRequest::to_wire_map`]
    pub fn field(&self, key: &str) -> Option<String> {
        self.to_wire_map().remove(key)
    }

    /// Set the RIS version (`VERS`)
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    /// Set the session id (`SESS`). Must be unique over a 30-day span.
    pub fn set_session(&mut self, session_id: impl Into<String>) {
        self.params.insert("SESS".into(), session_id.into());
    }

    /// Set the merchant id (`MERC`)
    pub fn set_merchant(&mut self, merchant_id: impl Into<String>) {
        self.params.insert("MERC".into(), merchant_id.into());
    }

    /// Set the Kount Central customer id (`CUSTOMER_ID`)
    pub fn set_customer_id(&mut self, customer_id: impl Into<String>) {
        self.params.insert("CUSTOMER_ID".into(), customer_id.into());
    }

    /// Set the merchant's unique order number (`ORDR`)
    pub fn set_order_number(&mut self, order_number: impl Into<String>) {
        self.params.insert("ORDR".into(), order_number.into());
    }

    /// Set the merchant acknowledgment (`MACK`) from `"YES"` or `"NO"`.
    ///
    /// Any other value is reported and leaves the request unchanged.
    pub fn set_merchant_acknowledgment(&mut self, value: &str) -> Result<()> {
        let ack: MerchantAcknowledgment = value.parse()?;
        self.params.insert("MACK".into(), ack.as_str().into());
        Ok(())
    }

    /// Set the authorization status returned by the processor (`AUTH`)
    pub fn set_authorization_status(&mut self, status: AuthStatus) {
        self.params.insert("AUTH".into(), status.as_str().into());
    }

    /// Set the bankcard AVS zip code reply (`AVSZ`)
    pub fn set_avs_zip_reply(&mut self, reply: BankcardReply) {
        self.params.insert("AVSZ".into(), reply.as_str().into());
    }

    /// Set the bankcard AVS street address reply (`AVST`)
    pub fn set_avs_address_reply(&mut self, reply: BankcardReply) {
        self.params.insert("AVST".into(), reply.as_str().into());
    }

    /// Set the bankcard CVV/CVC/CVV2 reply (`CVVR`)
    pub fn set_cvv_reply(&mut self, reply: BankcardReply) {
        self.params.insert("CVVR".into(), reply.as_str().into());
    }

    /// Set the card expiration date: month as `MM` (`CCMM`), year as `YYYY` (`CCYY`)
    pub fn set_expiration_date(&mut self, month: impl Into<String>, year: impl Into<String>) {
        self.params.insert("CCMM".into(), month.into());
        self.params.insert("CCYY".into(), year.into());
    }

    /// Enable or disable KHASH payment encoding. Read by
    /// [`RisRequest::set_payment`] at call time.
    pub fn set_khash_payment_encoding(&mut self, enabled: bool) {
        self.encoding = if enabled {
            PaymentEncoding::Khash
        } else {
            PaymentEncoding::Plain
        };
    }

    /// Check if KHASH payment encoding is set
    pub fn is_khash_payment_encoding(&self) -> bool {
        self.encoding == PaymentEncoding::Khash
    }

    /// Current payment encoding (`PENC`)
    pub fn payment_encoding(&self) -> &PaymentEncoding {
        &self.encoding
    }

    /// Attach a payment, writing `PTOK`, `PTYP` and `LAST4`.
    ///
    /// With KHASH enabled the token is hashed first, unless the payment is
    /// `NONE` or already hashed. Gift cards are hashed together with the
    /// numeric merchant id, so `MERC` must be set before attaching one.
    ///
    /// If the hasher is unavailable, `PENC` is cleared and the plaintext
    /// token is sent. Any other failure is returned and the request is left
    /// untouched.
    pub fn set_payment(&mut self, mut payment: Payment) -> Result<()> {
        if self.is_khash_payment_encoding() && !payment.is_none() && !payment.is_khashed() {
            match self.khash(&payment) {
                Ok(hashed) => payment.apply_khash(hashed),
                Err(Error::Hash(HashError::Unavailable(reason))) => {
                    warn!(
                        payment_type = %payment.kind(),
                        reason = %reason,
                        "Unable to create payment token hash, KHASH payment encoding disabled"
                    );
                    self.encoding = PaymentEncoding::Plain;
                }
                Err(e) => return Err(e),
            }
        }

        // A token written here is never masked
        if self.encoding == PaymentEncoding::Mask {
            self.encoding = if payment.is_khashed() {
                PaymentEncoding::Khash
            } else {
                PaymentEncoding::Plain
            };
        }

        self.attach(payment);
        Ok(())
    }

    /// Attach a payment built from a type code and token.
    ///
    /// Unknown codes are accepted and sent verbatim as `PTYP`.
    pub fn set_payment_by_type_code(&mut self, code: &str, token: impl Into<String>) -> Result<()> {
        self.set_payment(Payment::for_code(code, token))
    }

    /// Replace the attached card payment with a MASK-encoded card number.
    ///
    /// Masking applies only when the currently attached payment is a card
    /// and `payment` is an unhashed card. Otherwise `payment` gets standard
    /// KHASH encoding through [`RisRequest::set_payment`] instead.
    pub fn set_payment_masked(&mut self, payment: Payment) -> Result<()> {
        let current_is_card = self.payment.as_ref().map_or(false, Payment::is_card);
        if !current_is_card || !payment.is_card() || payment.is_khashed() {
            warn!(
                current_type = self.payment.as_ref().map(|p| p.kind().code()),
                payment_type = %payment.kind(),
                khashed = payment.is_khashed(),
                "Payment cannot be masked, applying KHASH instead"
            );
            return self.set_payment(payment);
        }

        self.payment_fields = Some(PaymentFields {
            token: mask_token(payment.token()),
            payment_type: payment.kind().code().to_string(),
            last4: payment.last4().to_string(),
        });
        self.encoding = PaymentEncoding::Mask;
        debug!(
            payment_type = %payment.kind(),
            last4 = %payment.last4(),
            "Masked payment attached"
        );
        self.payment = Some(payment);
        Ok(())
    }

    /// Attached payment
    pub fn payment(&self) -> Option<&Payment> {
        self.payment.as_ref()
    }

    /// Set the transport close-on-finish flag
    pub fn set_close_on_finish(&mut self, close_on_finish: bool) {
        self.close_on_finish = close_on_finish;
    }

    /// Transport close-on-finish flag
    pub fn close_on_finish(&self) -> bool {
        self.close_on_finish
    }

    /// Flatten into the wire map sent to RIS
    pub fn to_wire_map(&self) -> BTreeMap<String, String> {
        let mut wire = self.params.clone();

        wire.insert("VERS".into(), self.version.clone());
        wire.insert("SDK".into(), self.sdk.clone());
        wire.insert("PENC".into(), self.encoding.as_str().into());

        if let Some(fields) = &self.payment_fields {
            wire.insert("PTOK".into(), fields.token.clone());
            wire.insert("PTYP".into(), fields.payment_type.clone());
            wire.insert("LAST4".into(), fields.last4.clone());
        }

        wire
    }

    fn khash(&self, payment: &Payment) -> Result<String> {
        if *payment.kind() == PaymentKind::GiftCard {
            let merchant_id = self.merchant_id()?;
            Ok(self.hasher.hash_gift_card(merchant_id, payment.token())?)
        } else {
            Ok(self.hasher.hash(payment.token())?)
        }
    }

    fn merchant_id(&self) -> Result<u64> {
        let raw = self.params.get("MERC").map(String::as_str).unwrap_or("");
        raw.trim().parse::<u64>().map_err(|e| {
            error!(
                merchant_id = raw,
                error = %e,
                "Error converting merchant ID to integer, set a valid merchant ID"
            );
            Error::InvalidMerchantId(raw.to_string())
        })
    }

    fn attach(&mut self, payment: Payment) {
        self.payment_fields = Some(payment.wire_fields());
        debug!(
            payment_type = %payment.kind(),
            last4 = %payment.last4(),
            khashed = payment.is_khashed(),
            encoding = %self.encoding,
            "Payment attached"
        );
        self.payment = Some(payment);
    }
}

impl fmt::Debug for RisRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RisRequest")
            .field("version", &self.version)
            .field("sdk", &self.sdk)
            .field("encoding", &self.encoding)
            .field("payment_type", &self.payment.as_ref().map(|p| p.kind().code()))
            .field("params", &self.params.keys().collect::<Vec<_>>())
            .field("close_on_finish", &self.close_on_finish)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RisRequest {
        RisRequest::new(Arc::new(Khash::new("test-salt")))
    }

    #[test]
    fn test_defaults() {
        let request = request();
        let wire = request.to_wire_map();

        assert_eq!(wire["VERS"], "1.0.0");
        assert_eq!(wire["PENC"], "KHASH");
        assert_eq!(wire["SDK"], "Rust");
        assert!(!wire.contains_key("PTOK"));
        assert!(request.is_khash_payment_encoding());
    }

    #[test]
    fn test_set_field_routes_typed_keys() {
        let mut request = request();
        request.set_field("VERS", "2.0.0");
        request.set_field("PENC", "");
        request.set_field("FRMT", "JSON");

        let wire = request.to_wire_map();
        assert_eq!(wire["VERS"], "2.0.0");
        assert_eq!(wire["PENC"], "");
        assert_eq!(wire["FRMT"], "JSON");
        assert!(!request.is_khash_payment_encoding());
    }

    #[test]
    fn test_semantic_setters() {
        let mut request = request();
        request.set_session("sess-1");
        request.set_merchant("999666");
        request.set_customer_id("cust-7");
        request.set_order_number("ord-42");
        request.set_authorization_status(AuthStatus::Declined);
        request.set_avs_zip_reply(BankcardReply::Match);
        request.set_avs_address_reply(BankcardReply::NoMatch);
        request.set_cvv_reply(BankcardReply::Unavailable);
        request.set_expiration_date("04", "2029");

        let wire = request.to_wire_map();
        assert_eq!(wire["SESS"], "sess-1");
        assert_eq!(wire["MERC"], "999666");
        assert_eq!(wire["CUSTOMER_ID"], "cust-7");
        assert_eq!(wire["ORDR"], "ord-42");
        assert_eq!(wire["AUTH"], "D");
        assert_eq!(wire["AVSZ"], "M");
        assert_eq!(wire["AVST"], "N");
        assert_eq!(wire["CVVR"], "X");
        assert_eq!(wire["CCMM"], "04");
        assert_eq!(wire["CCYY"], "2029");
    }

    #[test]
    fn test_merchant_acknowledgment() {
        let mut request = request();

        request.set_merchant_acknowledgment("YES").unwrap();
        assert_eq!(request.field("MACK").as_deref(), Some("Y"));

        let err = request.set_merchant_acknowledgment("maybe").unwrap_err();
        assert!(matches!(err, Error::UnrecognizedMerchantAcknowledgment(_)));
        assert_eq!(request.field("MACK").as_deref(), Some("Y"));
    }

    #[test]
    fn test_card_payment_is_khashed() {
        let mut request = request();
        request.set_payment_by_type_code("CARD", "4111111111111111").unwrap();

        let wire = request.to_wire_map();
        assert_ne!(wire["PTOK"], "4111111111111111");
        assert!(wire["PTOK"].starts_with("411111"));
        assert_eq!(wire["PTYP"], "CARD");
        assert_eq!(wire["LAST4"], "1111");
        assert!(request.payment().unwrap().is_khashed());
    }

    #[test]
    fn test_no_payment_not_hashed() {
        let mut request = request();
        request.set_payment(Payment::none()).unwrap();

        let wire = request.to_wire_map();
        assert_eq!(wire["PTOK"], "");
        assert_eq!(wire["PTYP"], "NONE");
        assert_eq!(wire["LAST4"], "");
        assert_eq!(wire["PENC"], "KHASH");
    }

    #[test]
    fn test_plaintext_when_khash_disabled() {
        let mut request = request();
        request.set_khash_payment_encoding(false);
        request.set_payment(Payment::card("4111111111111111")).unwrap();

        assert_eq!(request.field("PTOK").as_deref(), Some("4111111111111111"));
        assert_eq!(request.field("PENC").as_deref(), Some(""));
        assert!(!request.payment().unwrap().is_khashed());
    }

    #[test]
    fn test_unavailable_hasher_downgrades() {
        let mut request = RisRequest::new(Arc::new(Khash::unconfigured()));
        request.set_payment(Payment::card("4111111111111111")).unwrap();

        let wire = request.to_wire_map();
        assert_eq!(wire["PENC"], "");
        assert_eq!(wire["PTOK"], "4111111111111111");
        assert_eq!(wire["PTYP"], "CARD");
        assert_eq!(wire["LAST4"], "1111");
    }

    #[test]
    fn test_malformed_token_is_fatal() {
        let mut request = request();
        let err = request.set_payment(Payment::card("")).unwrap_err();

        assert!(matches!(err, Error::Hash(HashError::MalformedInput(_))));
        assert!(request.payment().is_none());
        assert_eq!(request.field("PENC").as_deref(), Some("KHASH"));
    }

    #[test]
    fn test_gift_card_requires_numeric_merchant() {
        let mut request = request();
        request.set_merchant("999666");
        request.set_payment(Payment::check("021000021")).unwrap();
        let before = request.to_wire_map();

        request.set_merchant("not-a-number");
        let err = request.set_payment(Payment::gift_card("600512345678")).unwrap_err();
        assert!(matches!(err, Error::InvalidMerchantId(ref m) if m == "not-a-number"));

        let after = request.to_wire_map();
        assert_eq!(after["PTOK"], before["PTOK"]);
        assert_eq!(after["PTYP"], "CHEK");
        assert_eq!(after["LAST4"], "0021");
        assert_eq!(after["PENC"], "KHASH");
    }

    #[test]
    fn test_gift_card_hashed_with_merchant() {
        let mut request = request();
        request.set_merchant("999666");
        request.set_payment(Payment::gift_card("600512345678")).unwrap();

        let wire = request.to_wire_map();
        assert!(wire["PTOK"].starts_with("999666"));
        assert_eq!(wire["PTYP"], "GIFT");
        assert_eq!(wire["LAST4"], "5678");
    }

    #[test]
    fn test_khashed_payment_not_rehashed() {
        let mut first = request();
        first.set_payment(Payment::card("4111111111111111")).unwrap();
        let payment = first.payment().unwrap().clone();
        let token = payment.token().to_string();

        let mut second = request();
        second.set_payment(payment).unwrap();
        assert_eq!(second.field("PTOK"), Some(token));
    }

    #[test]
    fn test_masked_card() {
        let mut request = request();
        request.set_payment(Payment::card("4111111111111111")).unwrap();
        request.set_payment_masked(Payment::card("4111111111111111")).unwrap();

        let wire = request.to_wire_map();
        assert_eq!(wire["PTOK"], "411111XXXXXX1111");
        assert_eq!(wire["PTYP"], "CARD");
        assert_eq!(wire["LAST4"], "1111");
        assert_eq!(wire["PENC"], "MASK");
    }

    #[test]
    fn test_masked_non_card_falls_back_to_khash() {
        let mut request = request();
        request.set_payment_masked(Payment::paypal("PAYER-ID-1234567")).unwrap();

        let wire = request.to_wire_map();
        assert_eq!(wire["PENC"], "KHASH");
        assert_eq!(wire["PTYP"], "PYPL");
        assert_ne!(wire["PTOK"], "PAYER-ID-1234567");
        assert!(request.payment().unwrap().is_khashed());
    }

    #[test]
    fn test_masked_requires_current_card_payment() {
        let mut request = request();
        request.set_payment(Payment::check("021000021")).unwrap();
        request.set_payment_masked(Payment::card("4111111111111111")).unwrap();

        let wire = request.to_wire_map();
        assert_eq!(wire["PENC"], "KHASH");
        assert_eq!(wire["PTYP"], "CARD");
        assert_ne!(wire["PTOK"], "411111XXXXXX1111");
        assert!(wire["PTOK"].starts_with("411111"));
        assert!(request.payment().unwrap().is_khashed());
    }

    #[test]
    fn test_masked_without_attached_payment_is_khashed() {
        let mut request = request();
        request.set_payment_masked(Payment::card("4111111111111111")).unwrap();

        assert_eq!(request.field("PENC").as_deref(), Some("KHASH"));
        assert!(request.payment().unwrap().is_khashed());
    }

    #[test]
    fn test_plain_payment_after_mask_clears_penc() {
        let mut request = request();
        request.set_khash_payment_encoding(false);
        request.set_payment(Payment::card("4111111111111111")).unwrap();
        request.set_payment_masked(Payment::card("4111111111111111")).unwrap();
        assert_eq!(request.field("PENC").as_deref(), Some("MASK"));

        request.set_payment(Payment::card("5500000000000004")).unwrap();

        let wire = request.to_wire_map();
        assert_eq!(wire["PTOK"], "5500000000000004");
        assert_eq!(wire["PENC"], "");
        assert_eq!(wire["LAST4"], "0004");
    }

    #[test]
    fn test_khashed_payment_after_mask_reports_khash() {
        let mut hashed = request();
        hashed.set_payment(Payment::card("5500000000000004")).unwrap();
        let payment = hashed.payment().unwrap().clone();

        let mut request = request();
        request.set_payment(Payment::card("4111111111111111")).unwrap();
        request.set_payment_masked(Payment::card("4111111111111111")).unwrap();
        request.set_payment(payment.clone()).unwrap();

        assert_eq!(request.field("PENC").as_deref(), Some("KHASH"));
        assert_eq!(request.field("PTOK").as_deref(), Some(payment.token()));
    }

    #[test]
    fn test_set_field_keeps_unknown_penc() {
        let mut request = request();
        request.set_field("PENC", "KHASH2");

        assert_eq!(request.field("PENC").as_deref(), Some("KHASH2"));
        assert!(!request.is_khash_payment_encoding());

        request.set_payment(Payment::card("4111111111111111")).unwrap();
        assert_eq!(request.field("PENC").as_deref(), Some("KHASH2"));
        assert_eq!(request.field("PTOK").as_deref(), Some("4111111111111111"));
    }

    #[test]
    fn test_payment_triple_shadows_raw_fields() {
        let mut request = request();
        request.set_field("PTOK", "raw");
        assert_eq!(request.field("PTOK").as_deref(), Some("raw"));

        request.set_khash_payment_encoding(false);
        request.set_payment(Payment::card("4111111111111111")).unwrap();
        assert_eq!(request.field("PTOK").as_deref(), Some("4111111111111111"));
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            merchant_id: Some("999666".into()),
            khash_salt: Some("config-salt".into()),
            ..Config::default()
        };
        let mut request = RisRequest::from_config(&config);
        request.set_payment(Payment::gift_card("600512345678")).unwrap();

        assert_eq!(request.field("MERC").as_deref(), Some("999666"));
        assert!(request.field("PTOK").unwrap().starts_with("999666"));
    }

    #[test]
    fn test_from_config_without_salt_sends_plaintext() {
        let mut request = RisRequest::from_config(&Config::default());
        assert!(request.is_khash_payment_encoding());

        request.set_payment(Payment::card("4111111111111111")).unwrap();
        assert_eq!(request.field("PENC").as_deref(), Some(""));
        assert_eq!(request.field("PTOK").as_deref(), Some("4111111111111111"));
    }
}
