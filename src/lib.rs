//! Marketboard Worker - Stocks & Portfolio Dashboard for Cloudflare Workers
//!
//! Serves composed JSON views over the platform's dashboard API.
//!
//! # Architecture
//! - Main entry point handles HTTP requests and routes per screen
//! - KV storage for per-screen view state (search/sort/page)
//! - Composition layer fetches remote collections concurrently and
//!   tolerates partial failure
//!
//! # Features
//! - Dashboard view composed from stocks, portfolios and news sources
//! - Per-stock quote enrichment and per-account detail enrichment
//! - Client-side search, sort and pagination without server support

// Clippy configuration for worker code patterns
#![allow(clippy::doc_markdown)] // Doc style flexibility
#![allow(clippy::needless_pass_by_value)] // Worker framework patterns
#![allow(clippy::future_not_send)] // Workers runtime is single-threaded

mod client;
mod compose;
mod config;
mod error;
mod types;
mod view;

use worker::{Context, Env, Request, Response, Router, console_warn, event};

pub use client::ApiClient;
pub use compose::{ComposedView, Enrichment, Source, SourcePolicy, compose};
pub use config::Config;
pub use error::DashboardError;
pub use types::{ListViewResponse, Record};
pub use view::{Columns, PageView, SortDirection, ViewState, project};

use crate::types::field_text;

/// Result type alias for worker operations
type WResult<T> = std::result::Result<T, worker::Error>;

/// A projected list screen: KV name, default sort key, column declaration
struct Screen {
    name: &'static str,
    default_sort: &'static str,
    columns: Columns,
}

const STOCKS: Screen = Screen {
    name: "stocks",
    default_sort: "symbol",
    columns: Columns {
        searchable: &["symbol", "name"],
        numeric: &["last_price", "change_percent"],
    },
};

const PORTFOLIOS: Screen = Screen {
    name: "portfolios",
    default_sort: "name",
    columns: Columns {
        searchable: &["name", "description"],
        numeric: &[],
    },
};

const SIMULATION: Screen = Screen {
    name: "simulation",
    default_sort: "name",
    columns: Columns {
        searchable: &["name"],
        numeric: &["initial_balance", "current_balance"],
    },
};

const NEWS: Screen = Screen {
    name: "news",
    default_sort: "publishedAt",
    columns: Columns {
        searchable: &["title", "description", "source"],
        numeric: &[],
    },
};

const TRANSACTIONS: Screen = Screen {
    name: "transactions",
    default_sort: "transaction_date",
    columns: Columns {
        searchable: &["transaction_type"],
        numeric: &["quantity", "price", "total_amount"],
    },
};

/// Main Worker entry point
#[event(fetch)]
async fn fetch(req: Request, env: Env, _ctx: Context) -> WResult<Response> {
    console_error_panic_hook::set_once();

    let router = Router::new();

    router
        // Health check
        .get_async("/health", |_req, ctx| async move {
            let config = match Config::from_env(&ctx.env) {
                Ok(c) => c,
                Err(e) => return Response::error(format!("Config error: {e}"), 500),
            };

            Response::from_json(&serde_json::json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "environment": config.environment,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }))
        })
        // Composed dashboard view
        .get_async("/api/dashboard", |_req, ctx| async move {
            respond(dashboard_view(&ctx.env).await)
        })
        // Stock list screen
        .get_async("/api/stocks", |req, ctx| async move {
            let result = async {
                let client = ApiClient::from_env(&ctx.env)?;
                let items = client.stocks().await?;
                screen_view(&ctx.env, &req, &STOCKS, items).await
            }
            .await;
            respond(result)
        })
        // Portfolio list screen
        .get_async("/api/portfolios", |req, ctx| async move {
            let result = async {
                let client = ApiClient::from_env(&ctx.env)?;
                let items = client.portfolios().await?;
                screen_view(&ctx.env, &req, &PORTFOLIOS, items).await
            }
            .await;
            respond(result)
        })
        // Transactions of one portfolio
        .get_async("/api/portfolios/:id/transactions", |req, ctx| async move {
            let Some(portfolio_id) = ctx.param("id").cloned() else {
                return Response::error("Missing portfolio id", 400);
            };
            let result = async {
                let client = ApiClient::from_env(&ctx.env)?;
                let items = client.portfolio_transactions(&portfolio_id).await?;
                screen_view(&ctx.env, &req, &TRANSACTIONS, items).await
            }
            .await;
            respond(result)
        })
        // Simulated trading accounts, enriched with per-account detail
        .get_async("/api/simulation", |req, ctx| async move {
            respond(simulation_view(&ctx.env, &req).await)
        })
        // Market news screen
        .get_async("/api/news", |req, ctx| async move {
            let result = async {
                let config = Config::from_env(&ctx.env)?;
                let client = ApiClient::from_env(&ctx.env)?;
                let items = client.market_news(config.news_page_size).await?;
                screen_view(&ctx.env, &req, &NEWS, items).await
            }
            .await;
            respond(result)
        })
        // Fallback
        .run(req, env)
        .await
}

/// Serialize a view result, mapping the error taxonomy onto responses:
/// only a failed required source fails the whole view (502); anything
/// else is reported as a JSON error object.
fn respond<T: serde::Serialize>(result: crate::error::Result<T>) -> WResult<Response> {
    match result {
        Ok(payload) => Response::from_json(&payload),
        Err(err @ DashboardError::RequiredSource { .. }) => Response::error(err.to_string(), 502),
        Err(err) => Response::from_json(&serde_json::json!({
            "error": format!("{err}")
        })),
    }
}

/// Compose the dashboard view: stocks are required and quote-enriched,
/// portfolios and news degrade to empty sections on failure.
async fn dashboard_view(env: &Env) -> crate::error::Result<serde_json::Value> {
    let config = Config::from_env(env)?;
    config.validate()?;
    let client = ApiClient::from_env(env)?;

    let stocks_client = client.clone();
    let primary = Source::required(
        "stocks",
        Box::pin(async move { stocks_client.stocks().await.map_err(|e| e.to_string()) }),
    );

    let portfolios_client = client.clone();
    let news_client = client.clone();
    let news_limit = config.news_page_size;
    let sections = vec![
        Source::best_effort(
            "portfolios",
            Box::pin(async move { portfolios_client.portfolios().await.map_err(|e| e.to_string()) }),
        ),
        Source::best_effort(
            "news",
            Box::pin(async move { news_client.market_news(news_limit).await.map_err(|e| e.to_string()) }),
        ),
    ];

    let quote_client = client.clone();
    let enrichment = Enrichment::new("symbol", move |item| {
        let client = quote_client.clone();
        let symbol = field_text(item, "symbol").unwrap_or_default();
        Box::pin(async move {
            if symbol.is_empty() {
                return Err("item has no symbol".to_string());
            }
            client.stock_quote(&symbol).await.map_err(|e| e.to_string())
        })
    });

    let composed = compose(primary, sections, Some(enrichment)).await?;

    for (name, section) in &composed.sections {
        if section.is_empty() {
            console_warn!("Dashboard section '{}' is empty (degraded or no data)", name);
        }
    }

    Ok(serde_json::json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "stocks": composed.primary,
        "sections": composed.sections,
    }))
}

/// Simulation accounts screen: the account list is required, each account
/// is enriched with its detail record (holdings, performance). A failed
/// detail fetch leaves that account's base fields untouched.
async fn simulation_view(env: &Env, req: &Request) -> crate::error::Result<ListViewResponse> {
    let client = ApiClient::from_env(env)?;

    let list_client = client.clone();
    let primary = Source::required(
        "accounts",
        Box::pin(async move {
            list_client
                .simulation_accounts()
                .await
                .map_err(|e| e.to_string())
        }),
    );

    let detail_client = client.clone();
    let enrichment = Enrichment::new("id", move |item| {
        let client = detail_client.clone();
        let account_id = field_text(item, "id").unwrap_or_default();
        Box::pin(async move {
            if account_id.is_empty() {
                return Err("account has no id".to_string());
            }
            client
                .simulation_account_detail(&account_id)
                .await
                .map_err(|e| e.to_string())
        })
    });

    let composed = compose(primary, Vec::new(), Some(enrichment)).await?;
    screen_view(env, req, &SIMULATION, composed.primary).await
}

/// Shared list-screen handler: load the screen's persisted view state,
/// apply the request's view events, persist, project.
async fn screen_view(
    env: &Env,
    req: &Request,
    screen: &Screen,
    items: Vec<Record>,
) -> crate::error::Result<ListViewResponse> {
    let config = Config::from_env(env)?;
    config.validate()?;

    let mut state = load_view_state(env, screen, &config).await?;
    apply_view_events(req, &mut state, &items, screen, &config)?;
    save_view_state(env, screen, &state).await?;

    let page = project(&items, &state, &screen.columns);
    Ok(ListViewResponse {
        items: page.items,
        filtered_count: page.filtered_count,
        page_count: page.page_count,
        state,
    })
}

/// Apply query parameters as view events: search first (resets the page),
/// then sort, then the page change clamped against the currently filtered
/// collection.
fn apply_view_events(
    req: &Request,
    state: &mut ViewState,
    items: &[Record],
    screen: &Screen,
    config: &Config,
) -> crate::error::Result<()> {
    let url = req.url()?;

    let mut requested_page = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "search" => state.search(&value),
            "sort" => state.sort_by(&value),
            "page" => requested_page = value.parse::<usize>().ok(),
            "page_size" => {
                if let Ok(size) = value.parse::<usize>() {
                    state.page_size = size.clamp(1, config.max_page_size);
                }
            }
            _ => {}
        }
    }

    if let Some(page) = requested_page {
        let current = project(items, state, &screen.columns);
        state.go_to_page(page, current.page_count);
    }

    Ok(())
}

/// Get a screen's view state from KV storage
async fn load_view_state(env: &Env, screen: &Screen, config: &Config) -> crate::error::Result<ViewState> {
    let kv = env.kv("STATE")?;

    match kv
        .get(&format!("view:{}", screen.name))
        .json::<ViewState>()
        .await
    {
        Ok(Some(state)) => Ok(state),
        Ok(None) => Ok(ViewState::new(screen.default_sort, config.default_page_size)),
        Err(e) => Err(DashboardError::Storage(e.to_string())),
    }
}

/// Save a screen's view state to KV storage
async fn save_view_state(env: &Env, screen: &Screen, state: &ViewState) -> crate::error::Result<()> {
    let kv = env.kv("STATE")?;
    kv.put(&format!("view:{}", screen.name), state)
        .map_err(|e| DashboardError::Storage(e.to_string()))?
        .execute()
        .await
        .map_err(|e| DashboardError::Storage(e.to_string()))?;
    Ok(())
}
