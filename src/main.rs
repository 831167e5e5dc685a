use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use location_analysis::{
    AppState, build_router,
    analysis::{Gateways, LocationAnalysisOrchestrator},
    cache::{CacheBackend, MemoryCache, RedisCache, TieredCache},
    config::{Config, ConfigError},
    database::{PgFacilityStore, operations::PgArrestRateTable},
    error::AppError,
    gateway::{GatewayError, KakaoClient},
    geo::{Coordinate, SpatialGrid, grid::GridError},
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 启动时抽样检查的记录数
const CONSISTENCY_SAMPLE_SIZE: i64 = 200;

/// 进程内缓存的过期清理周期
const MEMORY_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// 启动日志里用来估算格子大小的参考点（首尔市厅）
const REFERENCE_POINT: Coordinate = Coordinate {
    latitude: 37.5665,
    longitude: 126.9780,
};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("grid error: {0}")]
    Grid(#[from] GridError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("{0}")]
    App(#[from] AppError),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("Startup failed: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    // 加载配置
    let config = Config::from_env()?;
    let grid = SpatialGrid::new(config.grid_precision)?;
    let (cell_width, cell_height) = grid.cell_size_meters(&grid.encode(REFERENCE_POINT)?)?;
    tracing::info!(
        "Grid precision {}: cells are about {:.0}m x {:.0}m",
        grid.precision(),
        cell_width,
        cell_height
    );

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'location_analysis';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await?;

    if config.run_migrations {
        tracing::info!("Applying database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    // 设置缓存后端，未配置 Redis 时使用进程内缓存
    let backend: Arc<dyn CacheBackend> = match &config.redis_url {
        Some(url) => {
            let redis_client = redis::Client::open(url.as_str())?;
            tracing::info!("Using Redis cache backend");
            Arc::new(RedisCache::new(Arc::new(redis_client)))
        }
        None => {
            tracing::warn!("REDIS_URL not set, using in-process memory cache");
            let memory = Arc::new(MemoryCache::new());
            tokio::spawn(memory.clone().run_purge(MEMORY_PURGE_INTERVAL));
            memory
        }
    };
    let cache = TieredCache::new(backend, config.l1_cache_ttl(), config.l2_cache_ttl());

    // 外部协作方
    let kakao = Arc::new(KakaoClient::new(
        &config.kakao_api_base_url,
        &config.kakao_api_key,
        config.gateway_timeout(),
    )?);
    let gateways = Gateways {
        geocoder: kakao.clone(),
        amenities: kakao,
        arrest_rates: Arc::new(PgArrestRateTable::new(pool.clone())),
    };

    let orchestrator = LocationAnalysisOrchestrator::new(
        grid,
        cache,
        Arc::new(PgFacilityStore::new(pool)),
        gateways,
        config.analysis_strategy,
        config.gateway_timeout(),
    );

    // 存储中的 cell_id 必须和当前精度一致
    let checked = orchestrator
        .verify_grid_consistency(CONSISTENCY_SAMPLE_SIZE)
        .await?;
    tracing::info!(
        "Grid precision {} verified against {} stored facilities",
        grid.precision(),
        checked
    );

    // 设置应用状态
    let state = AppState {
        orchestrator: Arc::new(orchestrator),
    };

    let router = build_router(state, &config.api_base_uri);

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!(
        "Server listening on {} ({} strategy)",
        addr,
        config.analysis_strategy
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
