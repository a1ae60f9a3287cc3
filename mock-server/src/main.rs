use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let read = std::env::var("ROLLBAR_READ_TOKEN").unwrap_or_else(|_| "read-token".to_string());
    let write = std::env::var("ROLLBAR_WRITE_TOKEN").unwrap_or_else(|_| "write-token".to_string());

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    mock_server::run(listener, mock_server::Tokens::new(read, write)).await
}
