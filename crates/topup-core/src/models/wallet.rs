use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::de_amount;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Balance {
    #[serde(deserialize_with = "de_amount")]
    pub balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    Credit,
    Debit,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Credit => "credit",
            TxType::Debit => "debit",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TxType::Credit => "In",
            TxType::Debit => "Out",
        }
    }

    /// Sign prefix used when listing amounts.
    pub fn sign(&self) -> char {
        match self {
            TxType::Credit => '+',
            TxType::Debit => '-',
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for TxType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "credit" => Ok(TxType::Credit),
            "debit" => Ok(TxType::Debit),
            other => Err(format!("unknown transaction type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Transaction {
    pub id: i64,
    #[serde(deserialize_with = "de_amount")]
    pub amount: f64,
    pub tx_type: TxType,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionPage {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
}

pub(crate) fn first_page() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize)]
pub struct DepositRequest {
    pub amount: f64,
}

/// Response of state-changing endpoints: an optional message plus whatever
/// else the backend attached.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ActionResult {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ActionResult {
    pub fn message_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.message.as_deref().unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_transaction_page() {
        let page: TransactionPage = serde_json::from_value(json!({
            "transactions": [
                {"id": 1, "amount": "20.00", "tx_type": "credit", "description": "Depósito PIX", "created_at": "2024-05-01T10:00:00"},
                {"id": 2, "amount": 15, "tx_type": "debit", "created_at": "2024-05-02T11:30:00"}
            ],
            "total": 2,
            "page": 1,
            "pages": 1
        }))
        .expect("valid page");

        assert_eq!(page.transactions.len(), 2);
        assert_eq!(page.transactions[0].amount, 20.0);
        assert_eq!(page.transactions[1].tx_type, TxType::Debit);
        assert_eq!(page.transactions[1].description, None);
    }

    #[test]
    fn test_bad_amount_is_rejected() {
        let result: Result<Balance, _> = serde_json::from_value(json!({"balance": "abc"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_tx_type_from_str() {
        assert_eq!("CREDIT".parse::<TxType>(), Ok(TxType::Credit));
        assert!("refund".parse::<TxType>().is_err());
    }

    #[test]
    fn test_action_result_keeps_extra_fields() {
        let result: ActionResult = serde_json::from_value(json!({
            "message": "Depósito realizado",
            "new_balance": "70.00"
        }))
        .expect("valid result");
        assert_eq!(result.message_or("ok"), "Depósito realizado");
        assert_eq!(result.extra.get("new_balance"), Some(&json!("70.00")));

        let empty = ActionResult::default();
        assert_eq!(empty.message_or("ok"), "ok");
    }
}
