//! Transaction bookkeeping from response headers.

use chrono::{DateTime, Utc};
use http::HeaderMap;
use parking_lot::Mutex;
use xroad_core::xml::Element;

use crate::interceptor::Interceptor;

/// Header carrying the transaction id assigned by the Security Server.
pub const TRANSACTION_ID_HEADER: &str = "uxp-transaction-id";

/// Remembers the HTTP headers of the last received message.
///
/// Shared between the interceptor chain and the client through an `Arc`.
#[derive(Debug, Default)]
pub struct TransactionHistory {
    last: Mutex<Option<HeaderMap>>,
}

impl TransactionHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transaction id of the last response, empty when absent.
    pub fn transaction_id(&self) -> String {
        self.last
            .lock()
            .as_ref()
            .and_then(|headers| headers.get(TRANSACTION_ID_HEADER))
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    /// `Date` of the last response, or now when missing or unparseable.
    pub fn transaction_date(&self) -> DateTime<Utc> {
        self.last
            .lock()
            .as_ref()
            .and_then(|headers| headers.get(http::header::DATE))
            .and_then(|value| value.to_str().ok())
            .and_then(|value| DateTime::parse_from_rfc2822(value).ok())
            .map_or_else(Utc::now, |date| date.with_timezone(&Utc))
    }

    /// Headers of the last response.
    pub fn last_headers(&self) -> Option<HeaderMap> {
        self.last.lock().clone()
    }
}

impl Interceptor for TransactionHistory {
    fn name(&self) -> &'static str {
        "transaction_history"
    }

    fn ingress(&self, _envelope: &mut Element, headers: &HeaderMap) {
        *self.last.lock() = Some(headers.clone());
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Duration};
    use http::HeaderValue;

    use super::*;

    fn received(history: &TransactionHistory, headers: &[(&'static str, &'static str)]) {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(*name, HeaderValue::from_static(value));
        }
        history.ingress(&mut Element::new("Envelope"), &map);
    }

    #[test]
    fn test_transaction_id() {
        let history = TransactionHistory::new();
        assert_eq!(history.transaction_id(), "");

        received(&history, &[(TRANSACTION_ID_HEADER, "EE/GOV/1234/SUB/abc")]);
        assert_eq!(history.transaction_id(), "EE/GOV/1234/SUB/abc");

        received(&history, &[]);
        assert_eq!(history.transaction_id(), "");
    }

    #[test]
    fn test_transaction_date() {
        let history = TransactionHistory::new();
        received(&history, &[("date", "Wed, 21 Oct 2015 07:28:00 GMT")]);

        let date = history.transaction_date();
        assert_eq!((date.year(), date.month(), date.day()), (2015, 10, 21));
    }

    #[test]
    fn test_transaction_date_falls_back_to_now() {
        let history = TransactionHistory::new();
        received(&history, &[("date", "yesterday")]);

        let date = history.transaction_date();
        assert!((Utc::now() - date) < Duration::seconds(5));
    }
}
