use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use soundfood::{
    AppState,
    cache::{MemoryStore, RedisStore},
    config::Config,
    database, router,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    // 设置数据库连接池
    let pool = database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    database::init_schema(&pool)
        .await
        .expect("Failed to create database schema");

    if config.auto_init_db {
        match database::init_database(&pool, &config.admin, config.bcrypt_cost).await {
            Ok(true) => tracing::info!("Database initialized with default data"),
            Ok(false) => {}
            Err(e) => tracing::warn!("Database initialization failed: {}", e),
        }
    }

    // 配置了 Redis 时使用共享存储，否则使用进程内存储
    let state = match &config.redis_url {
        Some(url) => {
            let store = RedisStore::open(url).expect("Failed to create Redis client");
            if let Err(e) = store.ping().await {
                tracing::warn!("Redis is not reachable yet: {}", e);
            }
            AppState::with_store(pool, config.clone(), Arc::new(store))
        }
        None => {
            tracing::warn!(
                "REDIS_URL not set, token revocation and caches are local to this process"
            );
            AppState::with_store(pool, config.clone(), Arc::new(MemoryStore::new()))
        }
    };

    let app = router::build_router(state);

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let app = {
        tracing::debug!("Adding CORS layer for development mode");
        app.layer(tower_http::cors::CorsLayer::permissive())
    };

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
