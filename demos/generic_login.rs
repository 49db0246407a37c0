use oauth2_generic::{
    ProviderRegistry,
    config::{ProfileFieldPaths, ProviderConfig},
    secrecy::ExposeSecret as _,
};
use snafu::prelude::*;
use tracing_subscriber::EnvFilter;

#[snafu::report]
#[tokio::main]
pub async fn main() -> Result<(), snafu::Whatever> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client_id = std::env::var("CLIENT_ID").whatever_context("Failed to get CLIENT_ID")?;
    let client_secret =
        std::env::var("CLIENT_SECRET").whatever_context("Failed to get CLIENT_SECRET")?;

    let registry = ProviderRegistry::new();
    registry
        .register(
            "github",
            ProviderConfig::builder()
                .name("GitHub")
                .authorize_url("https://github.com/login/oauth/authorize")
                .token_url("https://github.com/login/oauth/access_token")
                .user_info_url("https://api.github.com/user")
                .redirect_uri("http://localhost:8080/login/callback")
                .scope("read:user user:email")
                .client_id(client_id)
                .client_secret(client_secret)
                .profile_fields(
                    ProfileFieldPaths::builder()
                        .username("login")
                        .nickname("name")
                        .avatar("avatar_url")
                        .homepage("html_url")
                        .build(),
                )
                .build(),
        )
        .whatever_context("Failed to register provider")?;

    let client = registry
        .client("github", reqwest::Client::new())
        .whatever_context("Failed to build client")?;

    println!("Authorization URL: {}", client.authorize("demo-state"));
    println!("Paste the `code` query parameter from the redirect:");

    let mut code = String::new();
    std::io::stdin()
        .read_line(&mut code)
        .whatever_context("Failed to read code")?;

    let (user, token) = client
        .callback(code.trim(), "demo-state")
        .await
        .whatever_context("Login failed")?;

    println!("Logged in as {} <{}> ({})", user.username, user.email, user.id);
    println!("Access token: {}", token.access_token.expose_secret());

    Ok(())
}
