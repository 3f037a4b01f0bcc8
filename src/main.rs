use std::{process, sync::Arc};

use kalem::{
    application::{
        admin::AdminPostService,
        auth::{self, AuthService},
        catalog::CatalogService,
        error::AppError,
        repos::{AdminUsersRepo, PostsRepo, PostsWriteRepo},
        sitemap::SitemapService,
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AppState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    match command {
        config::Command::HashPassword(args) => run_hash_password(args),
        config::Command::Serve(_) => {
            telemetry::init(&settings.logging).map_err(AppError::from)?;
            run_serve(settings).await
        }
    }
}

fn run_hash_password(args: config::HashPasswordArgs) -> Result<(), AppError> {
    let hash = auth::hash_password(&args.password)
        .map_err(|err| AppError::unexpected(format!("failed to hash password: {err}")))?;
    println!("{hash}");
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    let repositories = Arc::new(PostgresRepositories::new(pool));

    let secret = settings
        .auth
        .secret
        .as_deref()
        .ok_or_else(|| InfraError::configuration("auth secret is not configured"))
        .map_err(AppError::from)?;
    let token_ttl = time::Duration::try_from(settings.auth.token_ttl)
        .map_err(|err| AppError::unexpected(format!("invalid token ttl: {err}")))?;

    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let users_repo: Arc<dyn AdminUsersRepo> = repositories.clone();

    let state = AppState {
        catalog: Arc::new(CatalogService::new(posts_repo.clone())),
        admin_posts: Arc::new(AdminPostService::new(posts_repo.clone(), posts_write_repo)),
        auth: Arc::new(AuthService::new(users_repo, secret, token_ttl)),
        sitemap: Arc::new(SitemapService::new(
            posts_repo,
            settings.site.base_url.clone(),
        )),
        site: Arc::new(settings.site.clone()),
        cookie_secure: settings.auth.cookie_secure,
    };

    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "kalem::server",
        addr = %settings.server.addr,
        base_url = %settings.site.base_url,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(settings.server.graceful_shutdown))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!(target = "kalem::server", "shutdown complete");
    Ok(())
}

async fn shutdown_signal(grace: std::time::Duration) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!(
        target = "kalem::server",
        grace_seconds = grace.as_secs(),
        "shutdown signal received, draining connections"
    );

    // In-flight requests get the configured window before the process is
    // forced down.
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        error!(target = "kalem::server", "graceful shutdown window elapsed");
        process::exit(1);
    });
}
