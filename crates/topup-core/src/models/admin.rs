use serde::{Deserialize, Serialize};

use super::wallet::{first_page, TxType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    OrderConfirm,
    OrderRefund,
    OrderCreate,
    BalanceAdjust,
    DepositPix,
    ResellerApprove,
    ResellerReject,
    #[serde(other)]
    Other,
}

impl AuditAction {
    pub fn label(&self) -> &'static str {
        match self {
            AuditAction::OrderConfirm => "Recharge confirmed",
            AuditAction::OrderRefund => "Balance refunded",
            AuditAction::OrderCreate => "Order created",
            AuditAction::BalanceAdjust => "Balance adjusted",
            AuditAction::DepositPix => "PIX deposit",
            AuditAction::ResellerApprove => "Reseller approved",
            AuditAction::ResellerReject => "Reseller rejected",
            AuditAction::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuditLog {
    #[serde(default)]
    pub id: Option<i64>,
    pub action: AuditAction,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub target_user_name: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogPage {
    #[serde(default)]
    pub logs: Vec<AuditLog>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceAdjustment {
    pub amount: f64,
    pub tx_type: TxType,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackagePriceUpdate {
    pub selling_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_log_page() {
        let page: LogPage = serde_json::from_value(json!({
            "logs": [
                {"id": 1, "action": "deposit_pix", "user_name": "Ana", "details": "R$ 50,00 | PIX", "created_at": "2024-05-01T10:00:00"},
                {"id": 2, "action": "password_reset", "created_at": "2024-05-01T11:00:00"}
            ],
            "total": 2,
            "pages": 1
        }))
        .expect("valid page");

        assert_eq!(page.page, 1);
        assert_eq!(page.logs[0].action, AuditAction::DepositPix);
        assert_eq!(page.logs[1].action, AuditAction::Other);
        assert_eq!(page.logs[1].target_user_name, None);
    }

    #[test]
    fn test_serialize_adjustment() {
        let adj = BalanceAdjustment {
            amount: 10.0,
            tx_type: TxType::Debit,
            reason: "chargeback".into(),
        };
        assert_eq!(
            serde_json::to_value(&adj).unwrap(),
            json!({"amount": 10.0, "tx_type": "debit", "reason": "chargeback"})
        );

        let update = PackagePriceUpdate { selling_price: 9.9, is_active: None };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"selling_price": 9.9}));
    }
}
