use anyhow::{Context, Result};
use locale_bridge::config::{navigator_languages_from_env, I18nConfig};
use locale_bridge::i18n::{BrowserEnv, FsLoader, I18nContext, JsonFileStorage};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when not present)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("locale_bridge=info".parse()?),
        )
        .init();

    let config = I18nConfig::from_env()?;
    info!("Using locales from {}", config.locales_dir.display());

    // An explicit language switch may be passed as the first argument
    let requested = std::env::args().nth(1);

    let storage = JsonFileStorage::open(&config.storage_file)
        .context("Failed to open persisted language storage")?;
    let env = BrowserEnv::in_memory()
        .with_storage(Arc::new(storage))
        .with_query(&config.query)
        .with_navigator_languages(navigator_languages_from_env());

    let ctx = I18nContext::new(Arc::new(FsLoader::new(&config.locales_dir)), env)
        .with_namespaces(config.namespaces.clone())
        .with_debug(config.debug);

    let _loading = ctx.is_loading().subscribe(|loading| {
        if *loading {
            warn!("Translations not ready");
        }
    });
    let _language = ctx.i18n().subscribe(|engine| {
        info!(language = ?engine.language(), "i18n state updated");
    });

    ctx.initialize(config.default_locale.as_deref())
        .await
        .context("Initialization task failed")?;

    if let Some(lang) = requested {
        ctx.change_language(&lang)
            .await
            .context("Language change task failed")?;
    }

    info!(
        "Active language: {} (document lang: {})",
        ctx.engine().language().unwrap_or_default(),
        ctx.env().document.lang().unwrap_or_default()
    );

    match ctx.get_languages().await {
        Ok(catalog) => {
            for entry in catalog.entries() {
                let marker = if ctx.engine().languages().first() == Some(&entry.code) {
                    "*"
                } else {
                    " "
                };
                println!("{} {:<8} {}", marker, entry.code, entry.name);
            }
        }
        Err(e) => warn!("Could not list languages: {}", e),
    }

    let report = ctx.engine().metrics().report();
    info!("Load metrics: {}", serde_json::to_string(&report)?);

    if ctx.is_loading().get() {
        warn!("Finished with translations still not ready");
    }

    Ok(())
}
