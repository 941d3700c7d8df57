//! Send one message using options from the environment.
//!
//! ```text
//! O365_TENANT_NAME=contoso.onmicrosoft.com \
//! O365_CLIENT_ID=... O365_CERT_THUMBPRINT=... \
//! O365_FROM_ADDRESS=noreply@contoso.com \
//! cargo run --example send_mail -- ops@contoso.com
//! ```

use o365_mail::{CancellationToken, MessageBuilder, O365AuthenticationOptions, O365Client};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let recipient = std::env::args()
        .nth(1)
        .ok_or("usage: send_mail <recipient>")?;

    let options = O365AuthenticationOptions::from_env()?;
    let client = O365Client::new(options)?;

    let login = client.initialize_for_app_mail().await?;
    if !login.success() {
        return Err("login failed, see log for details".into());
    }

    let message = MessageBuilder::new()
        .subject("o365-mail test message")
        .html("<p>Sent from the <code>send_mail</code> demo.</p>")
        .to(recipient)
        .build();

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let result = client.send_email(&message, true, Some(&cancel)).await?;
    println!(
        "sendmail status {} ({})",
        result.status_code(),
        if result.success() { "ok" } else { "failed" }
    );

    Ok(())
}
