use jobsentinel::api;
use jobsentinel::config::{Profile, Settings};
use jobsentinel::db;
use jobsentinel::jobs::{JobsRepo, Pipeline};

use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let run_once = std::env::args().any(|arg| arg == "--once");

    let base_dir = std::env::var("JOBSENTINEL_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."));

    let settings = Settings::load(&base_dir)?;
    let profile = Profile::load(&base_dir)?;

    let db_path = settings.resolve_db_path(&base_dir);
    let resume_path = settings.resolve_resume_path(&base_dir);
    let interval = Duration::from_secs(settings.app.run_interval_seconds);
    let admin_addr = std::env::var("JOBSENTINEL_ADMIN_ADDR")
        .ok()
        .filter(|s| !s.trim().is_empty());

    info!(
        db_path = %db_path.display(),
        platforms = ?settings.platforms.enabled,
        interval_seconds = settings.app.run_interval_seconds,
        admin = admin_addr.as_deref().unwrap_or("disabled"),
        "jobsentinel starting"
    );

    let pool = db::make_pool(&db_path).await?;
    db::run_migrations(&pool).await?;

    let jobs_repo = JobsRepo::new(pool.clone());
    let registry = adapters::build_registry();
    let pipeline = Pipeline::new(jobs_repo.clone(), registry, settings, profile, resume_path);

    // ---- Admin API task ----
    let api_state = api::ApiState { jobs: jobs_repo };
    let app = api::router(api_state);

    let api_handle = tokio::spawn(async move {
        if let Some(addr) = admin_addr {
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!(%addr, "admin api listening");
            axum::serve(listener, app).await?;
        } else {
            std::future::pending::<()>().await;
        }
        Ok::<(), anyhow::Error>(())
    });

    // ---- Cycle loop task ----
    let cycle_handle = tokio::spawn(async move {
        loop {
            match pipeline.run_cycle().await {
                Ok(stats) => info!(?stats, "cycle finished"),
                // Store-level failures abort one cycle; the next attempt
                // happens after the normal interval.
                Err(err) => error!(error = %err, "cycle aborted"),
            }
            if run_once {
                break;
            }
            tokio::time::sleep(interval).await;
        }
        Ok::<(), anyhow::Error>(())
    });

    tokio::select! {
        res = api_handle => res??,
        res = cycle_handle => res??,
    }

    Ok(())
}
