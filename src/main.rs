use clap::Parser;
use lx200_bridge::core::ConfigProvider;
use lx200_bridge::utils::{logger, validation::Validate};
use lx200_bridge::{BridgeEngine, CliConfig, LocalStorage, MountStore, StateFile, TomlConfig};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting lx200-bridge");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 有 --config 時以 TOML 為準
    let config: Box<dyn ConfigProvider> = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            let toml_config = match TomlConfig::from_file(path) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("❌ Failed to load config file '{}': {}", path, e);
                    eprintln!("💡 Make sure the file exists and is valid TOML format");
                    std::process::exit(1);
                }
            };
            validated(toml_config)
        }
        None => validated(cli.clone()),
    };

    // 先裝好 signal handler，listener 開始接線前就不會走預設處理
    let mut hangup = signal(SignalKind::hangup())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    let store = MountStore::new();
    let state_file = config
        .store_path()
        .map(|path| Arc::new(StateFile::local(path, config.store_format())));

    if let Some(state) = &state_file {
        if let Err(e) = state.load_into(&store).await {
            tracing::warn!("⚠️ Could not load saved state, starting fresh: {}", e);
            tracing::warn!("💡 Suggestion: {}", e.recovery_suggestion());
        }
    }

    let engine = BridgeEngine::new(config.as_ref(), store.clone());
    let mut running = match engine.start().await {
        Ok(running) => running,
        Err(e) => {
            tracing::error!("❌ Failed to start bridge: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("✅ LX200 server on {}", running.lx200_addr);
    tracing::info!("✅ Stellarium server on {}", running.stellarium_addr);
    tracing::info!("✅ Status server on http://{}", running.status_addr);

    let autosave = state_file.as_ref().map(|state| {
        tracing::info!(
            "💾 Saving state every {:?}",
            config.save_interval()
        );
        Arc::clone(state).spawn_autosave(store.clone(), config.save_interval())
    });

    let mut exit_code = 0;

    loop {
        tokio::select! {
            result = running.wait() => {
                if let Err(e) = result {
                    tracing::error!("❌ Bridge stopped: {}", e);
                    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
                    exit_code = 1;
                }
                break;
            }
            _ = hangup.recv() => {
                tracing::info!("SIGHUP received, saving state");
                save_state(state_file.as_deref(), &store).await;
            }
            _ = terminate.recv() => {
                tracing::info!("SIGTERM received, shutting down");
                break;
            }
            _ = quit.recv() => {
                tracing::info!("SIGQUIT received, shutting down");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("SIGINT received, shutting down");
                break;
            }
        }
    }

    if let Some(task) = autosave {
        task.abort();
    }
    running.shutdown();
    save_state(state_file.as_deref(), &store).await;

    tracing::info!("👋 lx200-bridge stopped");
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

fn validated<C>(config: C) -> Box<dyn ConfigProvider>
where
    C: ConfigProvider + Validate + 'static,
{
    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
    Box::new(config)
}

async fn save_state(state_file: Option<&StateFile<LocalStorage>>, store: &MountStore) {
    let Some(state) = state_file else {
        return;
    };
    match state.save(store).await {
        Ok(()) => tracing::info!("💾 State saved"),
        Err(e) => tracing::error!("❌ Failed to save state: {}", e),
    }
}
