//! Walks through the OAuth2 authorization-code login.
//!
//! This demo shows how to:
//! - Build the consent URL for a registered application
//! - Trade the returned code for an access token
//! - Use the token to fetch the signed-in user
//!
//! Set `NATURALIST_CLIENT_ID`, `NATURALIST_CLIENT_SECRET` and
//! `NATURALIST_REDIRECT_URL` to the values of your registered application.
//!
//! Run with: `cargo run --example authorize`

use naturalist::{AuthConfig, Authenticator, Error};
use std::io::BufRead;
use std::time::Duration;

fn env(name: &str) -> Result<String, Error> {
    std::env::var(name).map_err(|_| Error::ConfigurationError(format!("{} is not set", name)))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("naturalist=debug,authorize=info")
        .init();

    let config = AuthConfig::new(
        env("NATURALIST_CLIENT_ID")?,
        env("NATURALIST_CLIENT_SECRET")?,
        env("NATURALIST_REDIRECT_URL")?,
    )
    .with_scopes(["login", "write"]);
    let auth = Authenticator::new(config)?;

    println!("=== Step 1: Consent ===");
    println!("Open this URL and approve the application:");
    println!("  {}", auth.authorization_url());
    println!();
    println!("Paste the `code` parameter from the redirect:");

    let mut code = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut code)
        .map_err(|e| Error::ConfigurationError(format!("Could not read code: {}", e)))?;

    println!("=== Step 2: Token exchange ===");
    let token = match auth.exchange(code.trim()).await {
        Ok(token) => token,
        Err(Error::AuthExchange { status, message }) => {
            println!("Exchange refused ({:?}): {}", status, message);
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    println!("Token: {:?}", token);
    println!();

    println!("=== Step 3: Authenticated call ===");
    let client = auth
        .client_builder(&token)?
        .auto_retry(Duration::from_secs(5), 3)
        .timeout(Duration::from_secs(30))
        .build()?;

    let me = client.current_user().await?;
    println!("Signed in as {} (id {})", me.login, me.id);
    println!("Observations: {}", me.observations_count.unwrap_or(0));

    Ok(())
}
