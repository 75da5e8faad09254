use pdfrelay_conversion::ConversionConfig;

#[tokio::main]
async fn main() {
    pdfrelay_observability::init();

    let server_url = std::env::var("CONVERSION_SERVER_URL").unwrap_or_else(|_| {
        tracing::warn!("CONVERSION_SERVER_URL not set; using local dev default");
        "http://localhost:9090/convert".to_string()
    });
    let callback_url = std::env::var("CONVERSION_CALLBACK_URL").unwrap_or_else(|_| {
        tracing::warn!("CONVERSION_CALLBACK_URL not set; using local dev default");
        "http://localhost:8080/conversion/callback".to_string()
    });
    let signing_key = std::env::var("CONVERSION_SIGNING_KEY").unwrap_or_else(|_| {
        tracing::warn!("CONVERSION_SIGNING_KEY not set; using insecure dev default");
        "dev-secret".to_string()
    });

    let config = ConversionConfig::new(server_url, callback_url, signing_key.into_bytes())
        .with_maintenance(env_flag("CONVERSION_MAINTENANCE"))
        .with_debug_fast_retry(env_flag("CONVERSION_DEBUG_FAST_RETRY"))
        .with_dedupe_callbacks(env_flag("CONVERSION_DEDUPE_CALLBACKS"));

    let app = build(config).await.expect("failed to build application");

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .expect("failed to bind 0.0.0.0:8080");

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

async fn build(config: ConversionConfig) -> anyhow::Result<axum::Router> {
    #[cfg(feature = "redis")]
    if let Ok(redis_url) = std::env::var("CONVERSION_REDIS_URL") {
        return pdfrelay_api::app::build_app_with_redis(config, &redis_url).await;
    }

    pdfrelay_api::app::build_app(config)
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
