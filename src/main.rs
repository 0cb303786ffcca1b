use note_board::setup::Setup;
use note_board::store::remote::RemoteBackend;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> Result<(), handle_errors::Error> {
    dotenv::dotenv().ok();
    let setup = Setup::load("setup")?;

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| setup.log_filter());

    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    // 平台連線在啟動時建立一次，再交給所有路由
    let backend = RemoteBackend::new(&setup.backend)?;
    let routes = note_board::routes::build(backend, &setup);

    tracing::info!("listening on port {}", setup.port);
    warp::serve(routes)
        .run(([0, 0, 0, 0], setup.port))
        .await;

    Ok(())
}
