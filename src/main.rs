mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::applications::{routes as applications_routes, ApplicationService};
use crate::features::auth::clients::GithubOAuthClient;
use crate::features::auth::routes as auth_routes;
use crate::features::auth::{AuthService, JwtValidator, OAuthStateSigner, TokenService};
use crate::features::candidate::{routes as candidate_routes, CandidateService, CandidateState};
use crate::features::health::{routes as health_routes, HealthState, IntegrationFlags};
use crate::features::hr::{routes as hr_routes, HrService, HrState};
use crate::features::interviews::{routes as interviews_routes, InterviewService};
use crate::features::jobs::{routes as jobs_routes, JobService};
use crate::features::realtime::{routes as realtime_routes, EventHub, RealtimeState};
use crate::features::resumes::{routes as resumes_routes, ResumeParser, ResumeService, ResumeState};
use crate::features::users::UserService;
use crate::modules::ai::{ChatModel, DocumentTextExtractor, GroqClient, MistralClient, QdrantClient};
use crate::modules::storage::LocalStorage;
use axum::{extract::DefaultBodyLimit, middleware::from_fn, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hireflow=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );

    tracing::info!("Configuration loaded successfully");

    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    let storage = Arc::new(
        LocalStorage::new(&config.storage)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize resume storage: {}", e))?,
    );
    tracing::info!("Resume storage ready at {}", config.storage.upload_dir);

    let hub = Arc::new(EventHub::default());

    // Hosted AI providers; each one is optional
    let mistral = MistralClient::from_config(&config.ai)?.map(Arc::new);
    let groq = GroqClient::from_config(&config.ai)?.map(Arc::new);
    let qdrant = QdrantClient::from_config(&config.ai)?.map(Arc::new);
    tracing::info!(
        "AI providers: mistral={}, groq={}, qdrant={}",
        mistral.is_some(),
        groq.is_some(),
        qdrant.is_some()
    );

    let extractor = mistral
        .clone()
        .map(|client| client as Arc<dyn DocumentTextExtractor>);
    let structuring_model = mistral.map(|client| client as Arc<dyn ChatModel>);
    let insights_model = groq.map(|client| client as Arc<dyn ChatModel>);

    // Auth
    let user_service = Arc::new(UserService::new(pool.clone()));
    let token_service = Arc::new(TokenService::new(&config.auth));
    let jwt_validator = Arc::new(JwtValidator::new(
        Arc::clone(&token_service),
        Arc::clone(&user_service),
    ));
    let github_client = GithubOAuthClient::from_config(&config.github)?;
    if github_client.is_none() {
        tracing::info!("GitHub OAuth disabled (no client credentials configured)");
    }
    let auth_service = Arc::new(AuthService::new(
        Arc::clone(&user_service),
        Arc::clone(&token_service),
        OAuthStateSigner::new(&config.auth.secret_key),
        github_client,
        Arc::clone(&storage),
        Arc::clone(&hub),
    ));
    tracing::info!("Auth service initialized");

    // Resumes
    let resume_service = Arc::new(ResumeService::new(
        pool.clone(),
        Arc::clone(&storage),
        Arc::clone(&hub),
        insights_model.clone(),
    ));
    let resume_parser = Arc::new(ResumeParser::new(
        Arc::clone(&resume_service),
        Arc::clone(&storage),
        extractor,
        structuring_model,
        Arc::clone(&hub),
    ));
    tracing::info!("Resume services initialized");

    // Jobs, applications and interviews
    let job_service = Arc::new(JobService::new(pool.clone(), Arc::clone(&hub)));
    let application_service = Arc::new(ApplicationService::new(
        pool.clone(),
        Arc::clone(&job_service),
        Arc::clone(&resume_service),
        Arc::clone(&hub),
        insights_model,
    ));
    let interview_service = Arc::new(InterviewService::new(
        pool.clone(),
        Arc::clone(&application_service),
        Arc::clone(&hub),
    ));
    let hr_service = Arc::new(HrService::new(pool.clone(), Arc::clone(&hub)));
    let candidate_service = Arc::new(CandidateService::new(
        pool.clone(),
        Arc::clone(&user_service),
        Arc::clone(&application_service),
        Arc::clone(&interview_service),
    ));
    tracing::info!("Hiring services initialized");

    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Protected routes (require JWT authentication)
    let protected_routes = Router::new()
        .merge(auth_routes::protected_routes(Arc::clone(&auth_service)))
        .merge(resumes_routes::routes(ResumeState {
            service: Arc::clone(&resume_service),
            parser: resume_parser,
            max_upload_size: config.storage.max_upload_size,
        }))
        .merge(jobs_routes::routes(Arc::clone(&job_service)))
        .merge(applications_routes::routes(Arc::clone(&application_service)))
        .merge(hr_routes::routes(HrState {
            service: hr_service,
            applications: Arc::clone(&application_service),
        }))
        .merge(interviews_routes::routes(Arc::clone(&interview_service)))
        .merge(candidate_routes::routes(CandidateState {
            service: candidate_service,
            interviews: interview_service,
        }))
        .route_layer(axum::middleware::from_fn_with_state(
            jwt_validator.clone(),
            middleware::auth_middleware,
        ));

    // Public routes (no auth required). The WebSocket route authenticates
    // its own upgrade request.
    let public_routes = Router::new()
        .merge(auth_routes::public_routes(auth_service))
        .merge(realtime_routes::routes(RealtimeState {
            hub: Arc::clone(&hub),
            validator: jwt_validator,
        }))
        .merge(health_routes::routes(HealthState {
            pool: pool.clone(),
            hub,
            integrations: IntegrationFlags::from_config(&config),
            qdrant,
        }));

    let app = Router::new()
        .merge(swagger)
        .merge(protected_routes)
        .merge(public_routes)
        .layer(
            ServiceBuilder::new()
                // Generate X-Request-Id using UUID v7 (or use client-provided one)
                .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(middleware::MakeSpanWithRequestId)
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                // Propagate X-Request-Id to response headers
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(middleware::cors_layer(
                    config.app.cors_allowed_origins.clone(),
                ))
                .layer(DefaultBodyLimit::max(config.app.max_request_body_size)),
        );

    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    socket.set_recv_buffer_size(256 * 1024)?;
    socket.set_send_buffer_size(256 * 1024)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(65535)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on {}", format!("http://{}", addr));
    tracing::info!(
        "Swagger UI available at {}",
        format!("http://{}/swagger-ui/", addr)
    );

    axum::serve(listener, app).await?;

    Ok(())
}
