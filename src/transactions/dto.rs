use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::ledger::money::to_minor_units;
use crate::ledger::MAX_TEXT_LEN;

pub const DEPOSIT: &str = "deposit";
pub const TRANSFER: &str = "transfer";

/// Request body for `POST /transactions`. Fields are optional here so that
/// missing ones are reported by [`CreateTransactionRequest::validate`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTransactionRequest {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Whole major units; scaled to minor units during validation.
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub reference: Option<String>,
}

/// A validated request. Deposits are already rewritten as transfers out of
/// the genesis account and `amount` is in minor units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: i64,
    pub reference: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

fn present(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn invalid(msg: &str) -> LedgerError {
    LedgerError::InvalidRequest(msg.to_string())
}

impl CreateTransactionRequest {
    pub fn validate(self, genesis_account_number: &str) -> Result<Transfer, LedgerError> {
        let to = present(self.to);
        let from = present(self.from);

        let (from, to) = match self.kind.as_deref().map(str::trim) {
            Some(DEPOSIT) => {
                let to = to.ok_or_else(|| invalid("destination account is required for 'deposit'"))?;
                if to == genesis_account_number {
                    return Err(invalid("action not allowed for this account number"));
                }
                (genesis_account_number.to_string(), to)
            }
            Some(TRANSFER) => match (from, to) {
                (Some(from), Some(to)) => (from, to),
                _ => {
                    return Err(invalid(
                        "origin/destination accounts are required for 'transfer'",
                    ))
                }
            },
            _ => return Err(invalid("transaction 'type' must be 'deposit' or 'transfer'")),
        };

        let amount = match self.amount {
            None | Some(0) => return Err(invalid("amount is required (non-zero value)")),
            Some(a) if a < 0 => return Err(invalid("amount must be positive")),
            Some(a) => to_minor_units(a).ok_or_else(|| invalid("amount is too large"))?,
        };

        let reference = present(self.reference).ok_or_else(|| invalid("reference is required"))?;
        if reference.chars().count() > MAX_TEXT_LEN {
            return Err(invalid("reference must be at most 100 characters"));
        }

        Ok(Transfer {
            from,
            to,
            amount,
            reference,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS: &str = "000000000";

    fn req(kind: &str, from: Option<&str>, to: Option<&str>, amount: Option<i64>) -> CreateTransactionRequest {
        CreateTransactionRequest {
            from: from.map(Into::into),
            to: to.map(Into::into),
            kind: Some(kind.into()),
            amount,
            reference: Some("r1".into()),
        }
    }

    #[test]
    fn deposit_is_a_transfer_out_of_genesis() {
        let t = req(DEPOSIT, None, Some("111111111"), Some(200)).validate(GENESIS).unwrap();
        assert_eq!(
            t,
            Transfer {
                from: GENESIS.into(),
                to: "111111111".into(),
                amount: 20_000,
                reference: "r1".into(),
            }
        );
    }

    #[test]
    fn deposit_ignores_supplied_source() {
        let t = req(DEPOSIT, Some("222222222"), Some("111111111"), Some(1))
            .validate(GENESIS)
            .unwrap();
        assert_eq!(t.from, GENESIS);
    }

    #[test]
    fn rejects_malformed_requests() {
        let cases = [
            req(DEPOSIT, None, None, Some(1)),
            req(DEPOSIT, None, Some(GENESIS), Some(1)),
            req(TRANSFER, None, Some("111111111"), Some(1)),
            req(TRANSFER, Some("111111111"), Some("  "), Some(1)),
            req("withdraw", Some("111111111"), Some("222222222"), Some(1)),
            req(TRANSFER, Some("111111111"), Some("222222222"), None),
            req(TRANSFER, Some("111111111"), Some("222222222"), Some(0)),
            req(TRANSFER, Some("111111111"), Some("222222222"), Some(-5)),
            req(TRANSFER, Some("111111111"), Some("222222222"), Some(i64::MAX)),
            CreateTransactionRequest {
                reference: None,
                ..req(TRANSFER, Some("111111111"), Some("222222222"), Some(1))
            },
            CreateTransactionRequest::default(),
        ];
        for case in cases {
            let debug = format!("{case:?}");
            assert!(
                matches!(case.validate(GENESIS), Err(LedgerError::InvalidRequest(_))),
                "accepted {debug}"
            );
        }
    }

    #[test]
    fn reference_fits_its_column() {
        let mut r = req(TRANSFER, Some("111111111"), Some("222222222"), Some(1));
        r.reference = Some("r".repeat(MAX_TEXT_LEN + 1));
        assert!(matches!(r.validate(GENESIS), Err(LedgerError::InvalidRequest(_))));

        let mut r = req(TRANSFER, Some("111111111"), Some("222222222"), Some(1));
        r.reference = Some(format!("  {}  ", "r".repeat(MAX_TEXT_LEN)));
        assert_eq!(r.validate(GENESIS).unwrap().reference.len(), MAX_TEXT_LEN);
    }

    #[test]
    fn trims_fields() {
        let mut r = req(TRANSFER, Some(" 111111111 "), Some("222222222 "), Some(3));
        r.reference = Some(" abc ".into());
        let t = r.validate(GENESIS).unwrap();
        assert_eq!(t.from, "111111111");
        assert_eq!(t.to, "222222222");
        assert_eq!(t.reference, "abc");
    }

    #[test]
    fn decodes_wire_shape() {
        let r: CreateTransactionRequest =
            serde_json::from_str(r#"{"to":"111111111","type":"deposit","amount":200,"reference":"r1"}"#)
                .unwrap();
        assert_eq!(r.kind.as_deref(), Some(DEPOSIT));
        assert_eq!(r.from, None);
        assert_eq!(r.amount, Some(200));
    }
}
