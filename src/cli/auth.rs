//! CLI auth command handlers for login, status, and logout.

use std::sync::Arc;

use crate::auth::{FileTokenStorage, OAuthFlow, TokenManager, TokenStorage};
use crate::config::AuthOptions;

/// Handle `gantry auth login`.
pub async fn handle_login() -> Result<(), Box<dyn std::error::Error>> {
    let options = AuthOptions::from_env()?;
    let flow = OAuthFlow::new(options)?;
    let session = flow.authorization_url(None);

    println!("🔗 Visit: {}", session.authorize_url);
    println!("📋 After authorizing, paste the code from the redirect below:");
    print!("> ");
    use std::io::Write;
    std::io::stdout().flush()?;

    let mut code = String::new();
    std::io::stdin().read_line(&mut code)?;
    let code = code.trim();

    if code.is_empty() {
        eprintln!("❌ No code provided.");
        std::process::exit(1);
    }

    let token = flow.exchange_code(code, &session.code_verifier).await?;
    let expires = token.expires_at.format("%Y-%m-%d %H:%M");

    let storage = Arc::new(FileTokenStorage::new_default());
    let manager = TokenManager::new(storage, flow);
    manager.store_token(&token)?;

    println!("✅ Login successful (token expires {expires})");
    Ok(())
}

/// Handle `gantry auth status`.
pub async fn handle_status() -> Result<(), Box<dyn std::error::Error>> {
    let options = AuthOptions::from_env()?;
    let storage = FileTokenStorage::new_default();
    let key = format!("procore-{}", options.client_id);

    println!("🔐 Authentication Status\n");
    match storage.load(&key) {
        Ok(Some(token)) => {
            if token.is_expired() {
                if token.refresh_token.is_some() {
                    println!("  Procore: ⚠️  Token expired (will auto-refresh on next use)");
                } else {
                    println!("  Procore: ❌ Token expired, please login again");
                }
            } else {
                println!(
                    "  Procore: ✅ Logged in (expires {})",
                    token.expires_at.format("%Y-%m-%d %H:%M")
                );
            }
            if let Some(scopes) = token.scopes {
                println!("  Scopes: {}", scopes.join(", "));
            }
        }
        Ok(None) => println!("  Procore: ❌ Not logged in"),
        Err(e) => println!("  Procore: ⚠️  Error: {e}"),
    }
    Ok(())
}

/// Handle `gantry auth logout`.
pub async fn handle_logout() -> Result<(), Box<dyn std::error::Error>> {
    let options = AuthOptions::from_env()?;
    let flow = OAuthFlow::new(options)?;
    let storage = Arc::new(FileTokenStorage::new_default());
    let manager = TokenManager::new(storage, flow);

    manager.clear()?;
    println!("✅ Logged out");
    Ok(())
}
