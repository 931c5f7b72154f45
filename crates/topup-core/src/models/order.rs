use std::fmt;

use serde::{Deserialize, Serialize};

use super::de_amount;
use super::wallet::first_page;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Completed,
    Canceled,
    Failed,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Completed => "completed",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Failed => "failed",
            OrderStatus::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Paid => "Paid",
            OrderStatus::Completed => "Completed",
            OrderStatus::Canceled => "Canceled",
            OrderStatus::Failed => "Failed",
            OrderStatus::Unknown => "Unknown",
        }
    }

    /// Orders an admin can still confirm or refund.
    pub fn is_actionable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Paid)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "completed" => Ok(OrderStatus::Completed),
            "canceled" => Ok(OrderStatus::Canceled),
            "failed" => Ok(OrderStatus::Failed),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Order {
    pub id: i64,
    #[serde(default)]
    pub user_name: Option<String>,
    pub operator: String,
    pub destination_phone: String,
    #[serde(deserialize_with = "de_amount")]
    pub amount: f64,
    pub status: OrderStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderPage {
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewOrder {
    pub destination_phone: String,
    pub operator: String,
    pub amount: f64,
}

/// A recharge price-table entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Package {
    pub id: i64,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "face_value", deserialize_with = "super::de_opt_amount")]
    pub amount: Option<f64>,
    #[serde(deserialize_with = "de_amount")]
    pub selling_price: f64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}
