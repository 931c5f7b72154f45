//! Typed client for the wallet service endpoints.
//!
//! Every method builds an [`ApiRequest`] and runs it through the shared
//! [`RequestPipeline`], so token renewal and session expiry behave the same
//! for all of them.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use super::pipeline::RequestPipeline;
use super::request::ApiRequest;
use super::transport::{ReqwestTransport, Transport};
use super::ApiError;
use crate::auth::{CredentialStore, KeyValueStore, SessionExpiredHandler, SessionInvalidator};
use crate::models::{
    ActionResult, Balance, BalanceAdjustment, DepositRequest, LogPage, LoginRequest, NewOrder,
    OrderPage, OrderStatus, Package, PackagePriceUpdate, ProfileUpdate, RegisterRequest,
    TokenResponse, TransactionPage, TxType, User,
};

/// Default page size used by the dashboards.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Wallet service client.
/// Clone is cheap - all state lives behind the shared pipeline.
#[derive(Clone)]
pub struct WalletClient {
    pipeline: Arc<RequestPipeline>,
}

impl WalletClient {
    pub fn new(pipeline: Arc<RequestPipeline>) -> Self {
        Self { pipeline }
    }

    /// Wire the production stack: reqwest transport, `store` for the session,
    /// `handler` notified when the session ends.
    pub fn connect(
        base_url: &str,
        timeout: Duration,
        store: Arc<dyn KeyValueStore>,
        handler: Arc<dyn SessionExpiredHandler>,
    ) -> Result<Self, ApiError> {
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::with_timeout(timeout)?);
        Ok(Self::with_transport(base_url, transport, store, handler))
    }

    pub fn with_transport(
        base_url: &str,
        transport: Arc<dyn Transport>,
        store: Arc<dyn KeyValueStore>,
        handler: Arc<dyn SessionExpiredHandler>,
    ) -> Self {
        let credentials = Arc::new(CredentialStore::new(store));
        let invalidator = Arc::new(SessionInvalidator::new(credentials.clone(), handler));
        let pipeline = RequestPipeline::new(base_url, transport, credentials, invalidator);
        Self::new(Arc::new(pipeline))
    }

    pub fn pipeline(&self) -> &Arc<RequestPipeline> {
        &self.pipeline
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        self.pipeline.credentials()
    }

    /// Cached profile from the last login or profile fetch.
    pub fn current_user(&self) -> Option<User> {
        self.credentials().user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials().is_authenticated()
    }

    // ===== Auth =====

    /// Log in, then fetch and cache the profile.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let request = ApiRequest::post("/users/login")
            .with_json(&LoginRequest { email, password })?
            .without_renewal();
        let token: TokenResponse = self.pipeline.call_json(&request).await?;
        self.pipeline.start_session(&token.access_token);

        let user = self.profile().await?;
        info!(user_id = user.id, role = %user.role, "Logged in");
        Ok(user)
    }

    /// Create an account; the response carries both token and profile.
    pub async fn register(&self, registration: &RegisterRequest) -> Result<User, ApiError> {
        let request = ApiRequest::post("/users/register")
            .with_json(registration)?
            .without_renewal();
        let body = self.pipeline.call(&request).await?;

        let token: TokenResponse = serde_json::from_value(body.clone())
            .map_err(|e| ApiError::InvalidResponse(format!("Register response without token: {}", e)))?;
        self.pipeline.start_session(&token.access_token);

        let user = match serde_json::from_value::<User>(body) {
            Ok(user) => user,
            Err(e) => {
                debug!(error = %e, "Register response lacks profile, fetching it");
                return self.profile().await;
            }
        };
        self.credentials().set_user(&user);
        Ok(user)
    }

    /// Fetch the profile and refresh the cached snapshot.
    pub async fn profile(&self) -> Result<User, ApiError> {
        let user: User = self.pipeline.call_json(&ApiRequest::get("/users/me")).await?;
        self.credentials().set_user(&user);
        Ok(user)
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let request = ApiRequest::put("/users/me").with_json(update)?;
        let user: User = self.pipeline.call_json(&request).await?;
        self.credentials().set_user(&user);
        Ok(user)
    }

    pub async fn request_reseller(&self) -> Result<ActionResult, ApiError> {
        self.pipeline
            .call_json(&ApiRequest::post("/users/request-reseller"))
            .await
    }

    /// End the session server-side (best effort) and locally.
    pub async fn logout(&self) {
        if let Err(e) = self.pipeline.call(&ApiRequest::post("/users/logout")).await {
            debug!(error = %e, "Ignoring logout failure");
        }
        self.pipeline.invalidator().invalidate();
    }

    // ===== Wallet =====

    pub async fn balance(&self) -> Result<f64, ApiError> {
        let balance: Balance = self.pipeline.call_json(&ApiRequest::get("/wallet/balance")).await?;
        Ok(balance.balance)
    }

    pub async fn transactions(
        &self,
        page: u32,
        limit: u32,
        tx_type: Option<TxType>,
    ) -> Result<TransactionPage, ApiError> {
        let request = ApiRequest::get("/wallet/history").with_query(paging(page, limit, [
            ("tx_type", tx_type.map(|t| t.as_str().to_string())),
        ]));
        self.pipeline.call_json(&request).await
    }

    /// Simulated PIX deposit.
    pub async fn deposit(&self, amount: f64) -> Result<ActionResult, ApiError> {
        let request = ApiRequest::post("/wallet/deposit").with_json(&DepositRequest { amount })?;
        self.pipeline.call_json(&request).await
    }

    // ===== Orders =====

    pub async fn create_order(
        &self,
        destination_phone: &str,
        operator: &str,
        amount: f64,
    ) -> Result<ActionResult, ApiError> {
        let order = NewOrder {
            destination_phone: destination_phone.to_string(),
            operator: operator.to_string(),
            amount,
        };
        let request = ApiRequest::post("/orders/").with_json(&order)?;
        self.pipeline.call_json(&request).await
    }

    // ===== Packages =====

    pub async fn packages(&self) -> Result<Vec<Package>, ApiError> {
        self.pipeline.call_json(&ApiRequest::get("/packages/")).await
    }

    pub async fn all_packages(&self) -> Result<Vec<Package>, ApiError> {
        self.pipeline
            .call_json(&ApiRequest::get("/packages/admin/all"))
            .await
    }

    pub async fn update_package_price(
        &self,
        package_id: i64,
        selling_price: f64,
        is_active: Option<bool>,
    ) -> Result<Value, ApiError> {
        let request = ApiRequest::patch(format!("/packages/{}", package_id))
            .with_json(&PackagePriceUpdate { selling_price, is_active })?;
        self.pipeline.call(&request).await
    }

    // ===== Admin: Users =====

    pub async fn users(&self) -> Result<Vec<User>, ApiError> {
        self.pipeline.call_json(&ApiRequest::get("/admin/users")).await
    }

    pub async fn user_transactions(
        &self,
        user_id: i64,
        page: u32,
        limit: u32,
        tx_type: Option<TxType>,
    ) -> Result<TransactionPage, ApiError> {
        let request = ApiRequest::get(format!("/admin/users/{}/transactions", user_id)).with_query(
            paging(page, limit, [("tx_type", tx_type.map(|t| t.as_str().to_string()))]),
        );
        self.pipeline.call_json(&request).await
    }

    pub async fn adjust_balance(
        &self,
        user_id: i64,
        adjustment: &BalanceAdjustment,
    ) -> Result<ActionResult, ApiError> {
        let request = ApiRequest::post(format!("/admin/users/{}/adjust-balance", user_id))
            .with_json(adjustment)?;
        self.pipeline.call_json(&request).await
    }

    // ===== Admin: Recharge orders =====

    pub async fn orders(
        &self,
        page: u32,
        limit: u32,
        status: Option<OrderStatus>,
    ) -> Result<OrderPage, ApiError> {
        let request = ApiRequest::get("/admin/orders").with_query(paging(page, limit, [
            ("status", status.map(|s| s.as_str().to_string())),
        ]));
        self.pipeline.call_json(&request).await
    }

    pub async fn confirm_order(&self, order_id: i64) -> Result<ActionResult, ApiError> {
        self.pipeline
            .call_json(&ApiRequest::patch(format!("/admin/orders/{}/confirm", order_id)))
            .await
    }

    pub async fn refund_order(&self, order_id: i64) -> Result<ActionResult, ApiError> {
        self.pipeline
            .call_json(&ApiRequest::patch(format!("/admin/orders/{}/refund", order_id)))
            .await
    }

    // ===== Admin: Resellers =====

    pub async fn reseller_requests(&self) -> Result<Vec<User>, ApiError> {
        self.pipeline
            .call_json(&ApiRequest::get("/admin/reseller-requests"))
            .await
    }

    pub async fn approve_reseller(&self, user_id: i64) -> Result<ActionResult, ApiError> {
        self.pipeline
            .call_json(&ApiRequest::patch(format!("/admin/users/{}/approve-reseller", user_id)))
            .await
    }

    pub async fn reject_reseller(&self, user_id: i64) -> Result<ActionResult, ApiError> {
        self.pipeline
            .call_json(&ApiRequest::patch(format!("/admin/users/{}/reject-reseller", user_id)))
            .await
    }

    // ===== Admin: Logs =====

    pub async fn logs(&self, page: u32, limit: u32, action: Option<&str>) -> Result<LogPage, ApiError> {
        let request = ApiRequest::get("/admin/logs")
            .with_query(paging(page, limit, [("action", action.map(str::to_string))]));
        self.pipeline.call_json(&request).await
    }
}

fn paging<'a, const N: usize>(
    page: u32,
    limit: u32,
    filters: [(&'a str, Option<String>); N],
) -> impl Iterator<Item = (&'a str, Option<String>)> {
    [
        ("page", Some(page.max(1).to_string())),
        ("limit", Some(limit.max(1).to_string())),
    ]
    .into_iter()
    .chain(filters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{ScriptedTransport, BASE_URL};
    use crate::auth::{LogOnlyHandler, MemoryStore};
    use crate::models::Role;
    use reqwest::StatusCode;
    use serde_json::json;

    fn client() -> (WalletClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new());
        let client = WalletClient::with_transport(
            BASE_URL,
            transport.clone(),
            Arc::new(MemoryStore::new()),
            Arc::new(LogOnlyHandler),
        );
        (client, transport)
    }

    fn user_json(role: &str) -> Value {
        json!({"id": 5, "name": "Carla Dias", "email": "carla@example.com", "role": role, "balance": "12.00"})
    }

    #[tokio::test]
    async fn test_login_stores_token_and_profile() {
        let (client, transport) = client();
        transport.respond("/users/login", None, StatusCode::OK, json!({"access_token": "T1"}));
        transport.respond("/users/me", Some("T1"), StatusCode::OK, user_json("admin"));

        let user = client.login("carla@example.com", "pw").await.unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(client.credentials().token().as_deref(), Some("T1"));
        assert_eq!(client.current_user(), Some(user));
        assert!(client.credentials().is_admin());

        let login = &transport.calls_to("/users/login")[0];
        assert_eq!(login.body, Some(json!({"email": "carla@example.com", "password": "pw"})));
    }

    #[tokio::test]
    async fn test_bad_credentials_do_not_renew() {
        let (client, transport) = client();
        transport.respond(
            "/users/login",
            None,
            StatusCode::UNAUTHORIZED,
            json!({"detail": "Invalid email or password"}),
        );

        let err = client.login("carla@example.com", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid email or password");
        assert_eq!(transport.renewal_count(), 0);
        assert!(!client.is_authenticated());
    }

    #[tokio::test]
    async fn test_register_uses_inline_profile() {
        let (client, transport) = client();
        let mut body = user_json("cliente");
        body["access_token"] = json!("T9");
        transport.respond("/users/register", None, StatusCode::OK, body);

        let registration = RegisterRequest::new("Carla Dias", "Carla@Example.com", "pw", None);
        let user = client.register(&registration).await.unwrap();
        assert_eq!(user.id, 5);
        assert_eq!(client.credentials().token().as_deref(), Some("T9"));
        assert!(transport.calls_to("/users/me").is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_server_fails() {
        let (client, transport) = client();
        client.pipeline().start_session("T1");
        client.credentials().set_user(&serde_json::from_value(user_json("cliente")).unwrap());
        transport.respond("/users/logout", Some("T1"), StatusCode::INTERNAL_SERVER_ERROR, json!({}));

        client.logout().await;
        assert!(!client.is_authenticated());
        assert_eq!(client.current_user(), None);
    }

    #[tokio::test]
    async fn test_history_query() {
        let (client, transport) = client();
        client.pipeline().start_session("T1");
        transport.respond(
            "/wallet/history?page=2&limit=10&tx_type=credit",
            Some("T1"),
            StatusCode::OK,
            json!({"transactions": [], "total": 0, "page": 2, "pages": 0}),
        );

        let page = client.transactions(2, 10, Some(TxType::Credit)).await.unwrap();
        assert_eq!(page.page, 2);
        assert!(page.transactions.is_empty());
    }

    #[tokio::test]
    async fn test_orders_query_and_actions() {
        let (client, transport) = client();
        client.pipeline().start_session("T1");
        transport.respond(
            "/admin/orders?page=1&limit=20&status=pending",
            Some("T1"),
            StatusCode::OK,
            json!({"orders": [], "total": 0, "page": 1, "pages": 0}),
        );
        transport.respond(
            "/admin/orders/4/confirm",
            Some("T1"),
            StatusCode::OK,
            json!({"message": "Recarga confirmada"}),
        );

        let page = client
            .orders(0, DEFAULT_PAGE_LIMIT, Some(OrderStatus::Pending))
            .await
            .unwrap();
        assert_eq!(page.total, 0);

        let result = client.confirm_order(4).await.unwrap();
        assert_eq!(result.message.as_deref(), Some("Recarga confirmada"));
        assert_eq!(transport.calls_to("/admin/orders/4/confirm")[0].method, reqwest::Method::PATCH);
    }

    #[tokio::test]
    async fn test_balance_accepts_string_amount() {
        let (client, transport) = client();
        transport.respond("/wallet/balance", None, StatusCode::OK, json!({"balance": "42.50"}));
        assert_eq!(client.balance().await.unwrap(), 42.5);
    }

    #[tokio::test]
    async fn test_adjust_balance_body() {
        let (client, transport) = client();
        client.pipeline().start_session("T1");
        transport.respond(
            "/admin/users/5/adjust-balance",
            Some("T1"),
            StatusCode::OK,
            json!({"message": "ok"}),
        );

        let adjustment = BalanceAdjustment {
            amount: 25.0,
            tx_type: TxType::Credit,
            reason: "bonus".into(),
        };
        client.adjust_balance(5, &adjustment).await.unwrap();
        let sent = &transport.calls_to("/admin/users/5/adjust-balance")[0];
        assert_eq!(sent.body, Some(json!({"amount": 25.0, "tx_type": "credit", "reason": "bonus"})));
    }
}
