use mock_server::Credentials;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let defaults = Credentials::default();
    let credentials = Credentials {
        username: std::env::var("ADMIN_USER").unwrap_or(defaults.username),
        password: std::env::var("ADMIN_PASSWORD").unwrap_or(defaults.password),
    };

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "listening");
    mock_server::run_with(listener, credentials).await
}
