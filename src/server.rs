use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    trace::TraceLayer,
};
use tracing::info;
use crate::{
    api::{
        handler::{
            add_row, check_draft, clear_session, explorer_link, get_balance, get_draft,
            health_check, import_draft, list_orders, list_tokens, reconcile_orders,
            select_token, submit_draft, update_row, AppState,
        },
        models::{SelectionRequest, SubmitRequest, UpdateRowRequest},
        streaming::stream_batch_events,
    },
    config::Config,
    middleware::{create_cors_layer, rate_limit_middleware, validate_json, RateLimitLayer},
};

pub async fn create_app(state: AppState, config: &Config) -> Router {
    info!("⚙️ Setting up HTTP routes...");

    let submit_limit = RateLimitLayer::per_minute(config.submit_rate_per_minute);

    let app = Router::new()
        // Public health check endpoint
        .route("/health", get(health_check))
        .nest("/api/v1",
            Router::new()
                // Draft editing
                .route("/draft", get(get_draft))
                .route(
                    "/draft/selection",
                    put(select_token)
                        .layer(middleware::from_fn(validate_json::<SelectionRequest>)),
                )
                .route("/draft/import", post(import_draft))
                .route("/draft/rows", post(add_row))
                .route(
                    "/draft/rows/:index",
                    put(update_row)
                        .layer(middleware::from_fn(validate_json::<UpdateRowRequest>)),
                )
                .route("/draft/check", post(check_draft))
                .route(
                    "/draft/submit",
                    post(submit_draft)
                        .layer(middleware::from_fn(validate_json::<SubmitRequest>))
                        .layer(middleware::from_fn_with_state(submit_limit, rate_limit_middleware)),
                )

                // History and reconciliation
                .route("/orders", get(list_orders))
                .route("/orders/reconcile", post(reconcile_orders))

                // Lookups
                .route("/explorer/:network/:tx_hash", get(explorer_link))
                .route("/balance/:chain/:token", get(get_balance))
                .route("/tokens", get(list_tokens))

                .route("/session/clear", post(clear_session))
                .route("/batch/events", get(stream_batch_events))
        )
        .layer(CompressionLayer::new())
        .layer(create_cors_layer(&config.origins()))
        // Add request tracing
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("✓ HTTP routes configured");
    app
}

pub async fn run_server(app: Router, bind_address: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("🌐 Server listening on: {}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
