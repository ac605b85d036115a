//! RIS request assembly
//!
//! Builds the key/value payload submitted to the RIS fraud-risk scoring
//! service and encodes the payment token it carries.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use ris_request::{Khash, Payment, RisRequest};
//!
//! let mut request = RisRequest::new(Arc::new(Khash::new("salt")));
//! request.set_merchant("999666");
//! request.set_session("a1b2c3");
//! request.set_payment(Payment::card("4111111111111111")).unwrap();
//!
//! let wire = request.to_wire_map();
//! assert_eq!(wire["PTYP"], "CARD");
//! assert_eq!(wire["LAST4"], "1111");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod khash;
pub mod payment;
pub mod request;
pub mod types;
pub mod validation;

pub use config::Config;
pub use error::{Error, Result};
pub use khash::{mask_token, HashError, Khash, TokenHasher};
pub use payment::{Payment, PaymentFields, PaymentKind};
pub use request::RisRequest;
pub use types::*;
pub use validation::{ErrorKind, FieldRules, RequestValidator, ValidationError};
