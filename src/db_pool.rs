use anyhow::Context;
use diesel::{ConnectionError, ConnectionResult};
use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::ManagerConfig;
use diesel_async::pooled_connection::deadpool::Pool;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use rustls::ClientConfig;
use rustls_platform_verifier::ConfigVerifierExt;

type Manager = AsyncDieselConnectionManager<AsyncPgConnection>;

#[derive(Clone)]
pub struct DbPool(pub deadpool::managed::Pool<Manager, deadpool::managed::Object<Manager>>);

fn establish_tls_connection(config: &str) -> BoxFuture<'_, ConnectionResult<AsyncPgConnection>> {
    let fut = async {
        let rustls_config = ClientConfig::with_platform_verifier()
            .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
        let tls = tokio_postgres_rustls::MakeRustlsConnect::new(rustls_config);
        let (client, conn) = tokio_postgres::connect(config, tls)
            .await
            .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;

        AsyncPgConnection::try_from_client_and_connection(client, conn).await
    };
    fut.boxed()
}

impl DbPool {
    /// Builds the shared pool and checks a connection can be made.
    ///
    /// With `tls` set, connections go through rustls using the platform
    /// certificate store; otherwise plain TCP is used.
    pub async fn build(db_url: &str, pool_size: usize, tls: bool) -> anyhow::Result<Self> {
        let mgr = if tls {
            let mut config = ManagerConfig::default();
            config.custom_setup = Box::new(establish_tls_connection);
            Manager::new_with_config(db_url, config)
        } else {
            Manager::new(db_url)
        };

        let pool = Pool::builder(mgr)
            .max_size(pool_size)
            .build()
            .context("Could not build Postgres database connection pool.")?;

        {
            use diesel_async::RunQueryDsl;
            diesel::sql_query("SELECT 1")
                .execute(&mut pool.get().await?)
                .await?;
        }

        tracing::info!(pool_size, tls, "db pool initialized");

        Ok(DbPool(pool))
    }
}

#[cfg(test)]
static CRYPTO_INIT: std::sync::OnceLock<()> = std::sync::OnceLock::new();

#[cfg(test)]
pub fn init_crypto_provider() {
    CRYPTO_INIT.get_or_init(|| {
        rustls::crypto::aws_lc_rs::default_provider()
            .install_default()
            .expect("CryptoProvider already installed");
    });
}
