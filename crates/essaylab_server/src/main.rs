//! Essaylab Server Binary
//!
//! Standalone server for the essay writing-session API.

use std::sync::Arc;

use essaylab_core::{
    init_logging, DirectoryBackupSink, EssayBackup, LogTarget, SystemClock,
};
use essaylab_server::backup::{QueuedBackupSink, DEFAULT_QUEUE_CAPACITY};
use essaylab_server::config::Settings;
use essaylab_server::{create_router, serve, AppState};
use log::{info, warn};
use tokio::task::JoinHandle;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    let log_target = match settings.log_dir.as_deref() {
        Some(dir) => LogTarget::directory(dir)?,
        None => LogTarget::Stderr,
    };
    init_logging(&settings.log_level, log_target)?;

    std::fs::create_dir_all(&settings.data_dir)?;
    if let Some(parent) = settings.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    info!(
        "event=server_start module=server status=start version={} env={} debug={} db_path={}",
        essaylab_core::core_version(),
        settings.environment.as_str(),
        settings.debug,
        settings.database_path.display()
    );

    let (backup, backup_worker) = build_backup(&settings).await;
    let state = Arc::new(AppState::new(
        settings.database_path.clone(),
        Arc::new(SystemClock),
        backup,
    ));
    let app = create_router(state, &settings.frontend_origins);

    serve(&settings.bind_addr, app, shutdown_signal()).await?;

    // The router (and every sink handle) is gone; let queued copies finish.
    if let Some(worker) = backup_worker {
        if let Err(err) = worker.await {
            warn!("event=backup_worker module=server status=error error={}", err);
        }
    }
    Ok(())
}

/// Object storage wins over a local directory; neither means no backups.
async fn build_backup(settings: &Settings) -> (EssayBackup, Option<JoinHandle<()>>) {
    if let Some(store_config) = settings.object_store.clone() {
        #[cfg(feature = "s3")]
        {
            let store = essaylab_server::s3::S3ObjectStore::connect(store_config).await;
            let (sink, worker) = QueuedBackupSink::spawn(store, DEFAULT_QUEUE_CAPACITY);
            info!("event=backup_config module=server status=ok target=s3");
            return (EssayBackup::new(Arc::new(sink)), Some(worker));
        }
        #[cfg(not(feature = "s3"))]
        warn!(
            "event=backup_config module=server status=skipped target=s3 bucket={} reason=built_without_s3_feature",
            store_config.bucket
        );
    }

    if let Some(dir) = settings.backup_dir.clone() {
        let store = DirectoryBackupSink::new(dir.clone(), "");
        let (sink, worker) = QueuedBackupSink::spawn(store, DEFAULT_QUEUE_CAPACITY);
        info!(
            "event=backup_config module=server status=ok target=directory dir={}",
            dir.display()
        );
        return (EssayBackup::new(Arc::new(sink)), Some(worker));
    }

    info!("event=backup_config module=server status=ok target=disabled");
    (EssayBackup::disabled(), None)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("event=server_shutdown module=server status=error error={}", err);
        return;
    }
    info!("event=server_shutdown module=server status=start");
}
