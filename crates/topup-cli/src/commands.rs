use anyhow::{bail, Context, Result};
use serde_json::Value;

use topup_core::auth::SessionExpiredHandler;
use topup_core::models::{
    ActionResult, BalanceAdjustment, LogPage, OrderPage, Package, ProfileUpdate, RegisterRequest,
    TransactionPage, User,
};
use topup_core::utils::{format_currency, format_date, format_date_time, format_phone, initials, truncate};
use topup_core::{Config, WalletClient};

use crate::{AdminCommand, Command};

/// Tells the user to log in again; fires once per lost session.
pub struct CliSessionHandler;

impl SessionExpiredHandler for CliSessionHandler {
    fn on_session_expired(&self) {
        eprintln!("Your session has ended. Run `topup login` to sign in again.");
    }
}

pub async fn run(client: &WalletClient, config: &mut Config, command: Command) -> Result<()> {
    match command {
        Command::Login { email } => login(client, config, email).await,
        Command::Register { name, email, phone } => {
            let password = rpassword::prompt_password("Password: ")?;
            let registration = RegisterRequest::new(&name, &email, &password, phone.as_deref());
            let user = client.register(&registration).await?;
            println!("Welcome, {}!", user.name);
            Ok(())
        }
        Command::Logout => {
            client.logout().await;
            println!("Logged out.");
            Ok(())
        }
        Command::Whoami => {
            require_session(client)?;
            print_profile(&client.profile().await?);
            Ok(())
        }
        Command::Profile { name, email, phone } => {
            require_session(client)?;
            let update = ProfileUpdate { name, email, phone };
            print_profile(&client.update_profile(&update).await?);
            Ok(())
        }
        Command::Balance => {
            require_session(client)?;
            println!("{}", format_currency(client.balance().await?));
            Ok(())
        }
        Command::History { page, limit, tx_type } => {
            require_session(client)?;
            print_transactions(&client.transactions(page, limit, tx_type).await?);
            Ok(())
        }
        Command::Deposit { amount } => {
            require_session(client)?;
            if amount <= 0.0 {
                bail!("Deposit amount must be positive");
            }
            print_result(&client.deposit(amount).await?, "Deposit received");
            Ok(())
        }
        Command::Order { phone, operator, amount } => {
            require_session(client)?;
            let result = client.create_order(&phone, &operator, amount).await?;
            print_result(&result, "Recharge requested");
            Ok(())
        }
        Command::Packages => {
            require_session(client)?;
            print_packages(&client.packages().await?);
            Ok(())
        }
        Command::ResellerRequest => {
            require_session(client)?;
            print_result(&client.request_reseller().await?, "Request sent");
            Ok(())
        }
        Command::Admin(command) => {
            require_session(client)?;
            if !client.credentials().is_admin() {
                bail!("This command requires an administrator account");
            }
            admin(client, command).await
        }
    }
}

async fn login(client: &WalletClient, config: &mut Config, email: Option<String>) -> Result<()> {
    let email = match email.or_else(|| config.last_email.clone()) {
        Some(email) => email,
        None => bail!("No email given; pass --email"),
    };
    let password = rpassword::prompt_password(format!("Password for {}: ", email))?;

    let user = client.login(&email, &password).await?;
    println!("Logged in as {} ({})", user.name, user.role);

    config.last_email = Some(email);
    config.save().context("Failed to save configuration")?;
    Ok(())
}

async fn admin(client: &WalletClient, command: AdminCommand) -> Result<()> {
    match command {
        AdminCommand::Users => print_users(&client.users().await?),
        AdminCommand::UserHistory { user_id, page, limit, tx_type } => {
            print_transactions(&client.user_transactions(user_id, page, limit, tx_type).await?)
        }
        AdminCommand::Adjust { user_id, amount, tx_type, reason } => {
            let adjustment = BalanceAdjustment { amount, tx_type, reason };
            print_result(&client.adjust_balance(user_id, &adjustment).await?, "Balance adjusted");
        }
        AdminCommand::Orders { page, limit, status } => {
            print_orders(&client.orders(page, limit, status).await?)
        }
        AdminCommand::Confirm { order_id } => {
            print_result(&client.confirm_order(order_id).await?, "Order confirmed")
        }
        AdminCommand::Refund { order_id } => {
            print_result(&client.refund_order(order_id).await?, "Order refunded")
        }
        AdminCommand::Resellers => print_users(&client.reseller_requests().await?),
        AdminCommand::Approve { user_id } => {
            print_result(&client.approve_reseller(user_id).await?, "Reseller approved")
        }
        AdminCommand::Reject { user_id } => {
            print_result(&client.reject_reseller(user_id).await?, "Reseller request rejected")
        }
        AdminCommand::Logs { page, limit, action } => {
            print_logs(&client.logs(page, limit, action.as_deref()).await?)
        }
        AdminCommand::Packages => print_packages(&client.all_packages().await?),
        AdminCommand::SetPrice { package_id, price, active } => {
            let body = client.update_package_price(package_id, price, active).await?;
            match body.get("message").and_then(Value::as_str) {
                Some(message) => println!("{}", message),
                None => println!("Package {} now sells for {}", package_id, format_currency(price)),
            }
        }
    }
    Ok(())
}

fn require_session(client: &WalletClient) -> Result<()> {
    if !client.is_authenticated() {
        bail!("Not logged in. Run `topup login` first.");
    }
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

fn print_result(result: &ActionResult, default: &str) {
    println!("{}", result.message_or(default));
}

fn print_profile(user: &User) {
    println!("[{}] {}", initials(&user.name), user.name);
    println!("  Email:   {}", user.email);
    if let Some(ref phone) = user.phone {
        println!("  Phone:   {}", format_phone(phone));
    }
    println!("  Role:    {}", user.role);
    if let Some(balance) = user.balance {
        println!("  Balance: {}", format_currency(balance));
    }
}

fn print_users(users: &[User]) {
    if users.is_empty() {
        println!("No users.");
        return;
    }
    for user in users {
        println!(
            "{:>5}  {:<28} {:<32} {:<10} {:>14}{}",
            user.id,
            truncate(&user.name, 28),
            truncate(&user.email, 32),
            user.role,
            user.balance.map(format_currency).unwrap_or_default(),
            if user.is_active { "" } else { "  (inactive)" },
        );
    }
}

fn print_transactions(page: &TransactionPage) {
    if page.transactions.is_empty() {
        println!("No transactions.");
        return;
    }
    for tx in &page.transactions {
        println!(
            "{}  {:<4} {}{:>14}  {}",
            format_date_time(&tx.created_at),
            tx.tx_type.label(),
            tx.tx_type.sign(),
            format_currency(tx.amount),
            tx.description.as_deref().unwrap_or(""),
        );
    }
    println!("Page {} of {} ({} total)", page.page, page.pages.max(1), page.total);
}

fn print_orders(page: &OrderPage) {
    if page.orders.is_empty() {
        println!("No orders.");
        return;
    }
    for order in &page.orders {
        println!(
            "#{:<6} {}  {:<20} {:<8} {:<16} {:>12}  {}",
            order.id,
            format_date(&order.created_at),
            truncate(order.user_name.as_deref().unwrap_or("-"), 20),
            order.operator,
            format_phone(&order.destination_phone),
            format_currency(order.amount),
            order.status,
        );
    }
    println!("Page {} of {} ({} total)", page.page, page.pages.max(1), page.total);
}

fn print_packages(packages: &[Package]) {
    if packages.is_empty() {
        println!("No packages.");
        return;
    }
    for pkg in packages {
        let title = pkg
            .name
            .clone()
            .or_else(|| pkg.operator.clone())
            .unwrap_or_else(|| format!("Package {}", pkg.id));
        println!(
            "{:>4}  {:<24} {:>12} {:>12}{}",
            pkg.id,
            truncate(&title, 24),
            pkg.amount.map(format_currency).unwrap_or_default(),
            format_currency(pkg.selling_price),
            if pkg.is_active { "" } else { "  (inactive)" },
        );
    }
}

fn print_logs(page: &LogPage) {
    if page.logs.is_empty() {
        println!("No log entries.");
        return;
    }
    for log in &page.logs {
        println!(
            "{}  {:<22} {:<20} {}",
            format_date_time(&log.created_at),
            log.action.label(),
            truncate(log.user_name.as_deref().unwrap_or("-"), 20),
            log.details.as_deref().unwrap_or(""),
        );
    }
    println!("Page {} of {} ({} total)", page.page, page.pages.max(1), page.total);
}
