use std::sync::Arc;

use storefront::app::{Services, Stores, build_router};
use storefront::core::auth::PasswordHasher;
use storefront::core::config::Config;
use storefront::core::db::{
    DbConfig, MemoryBannerStore, MemoryIdentityStore, MemoryOrderStore, PgBannerStore,
    PgIdentityStore, PgOrderStore, create_pool_with_migrations, health_check,
};
use storefront::core::mail::{LogMailer, Mailer, SmtpMailer};
use storefront::core::media::{CloudinaryClient, ImageHost, LogImageHost};
use storefront::core::users::seed_super_admin;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    // Log config status (without revealing secrets)
    tracing::info!(
        "Config loaded: database={}, mail={}, image_host={}",
        config.has_database(),
        config.has_mail(),
        config.has_image_host()
    );

    let stores = match config.database_url.as_deref() {
        Some(url) => {
            let pool = create_pool_with_migrations(&DbConfig::new(url)).await?;
            health_check(&pool).await?;
            tracing::info!("Connected to PostgreSQL");

            Stores {
                users: Arc::new(PgIdentityStore::users(pool.clone())),
                admins: Arc::new(PgIdentityStore::admins(pool.clone())),
                banners: Arc::new(PgBannerStore::new(pool.clone())),
                orders: Arc::new(PgOrderStore::new(pool)),
            }
        }
        None => {
            tracing::warn!("DATABASE_URL not set, records are kept in memory only");

            Stores {
                users: Arc::new(MemoryIdentityStore::new()),
                admins: Arc::new(MemoryIdentityStore::new()),
                banners: Arc::new(MemoryBannerStore::new()),
                orders: Arc::new(MemoryOrderStore::new()),
            }
        }
    };

    let mailer: Arc<dyn Mailer> = match config.mail.as_ref() {
        Some(mail) => Arc::new(SmtpMailer::new(mail)?),
        None => {
            tracing::warn!("SMTP not configured, emails are logged instead of sent");
            Arc::new(LogMailer)
        }
    };

    let images: Arc<dyn ImageHost> = match config.cloudinary.clone() {
        Some(cloudinary) => Arc::new(CloudinaryClient::new(cloudinary)),
        None => Arc::new(LogImageHost),
    };

    let hasher = PasswordHasher::new(config.bcrypt_cost)?;

    if let Some(super_admin) = config.super_admin.as_ref() {
        seed_super_admin(stores.admins.as_ref(), &hasher, super_admin).await?;
    }

    let services = Services::new(&config, stores, hasher, mailer, images);
    let app = build_router(services);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
