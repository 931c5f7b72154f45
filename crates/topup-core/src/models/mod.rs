//! Data models for the wallet API.
//!
//! This module contains the domain types returned by the backend:
//! - `User`, `Role`: account profile and permissions
//! - `Balance`, `Transaction`, `TransactionPage`: wallet data
//! - `Order`, `OrderPage`: recharge orders
//! - `Package`: recharge price table
//! - `AuditLog`, `LogPage`: admin activity log
//!
//! Request payloads sent to the backend live alongside the types they produce.

pub mod admin;
pub mod order;
pub mod user;
pub mod wallet;

pub use admin::{AuditAction, AuditLog, BalanceAdjustment, LogPage, PackagePriceUpdate};
pub use order::{NewOrder, Order, OrderPage, OrderStatus, Package};
pub use user::{LoginRequest, ProfileUpdate, RegisterRequest, Role, TokenResponse, User};
pub use wallet::{ActionResult, Balance, DepositRequest, Transaction, TransactionPage, TxType};

use serde::{Deserialize, Deserializer};

/// Monetary amounts arrive either as JSON numbers or as decimal strings.
pub(crate) fn de_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    match Amount::deserialize(deserializer)? {
        Amount::Number(n) => Ok(n),
        Amount::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

pub(crate) fn de_opt_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "de_amount")] f64);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
}
