//! Azure SQL Database over TDS using Entra ID access tokens.

use crate::config::{SqlConfig, SQL_TOKEN_SCOPE};
use crate::database::{Connection, Database, DatabaseFactory, ProductRow};
use crate::{ProbeError, Result};
use async_trait::async_trait;
use azure_core::auth::TokenCredential;
use std::sync::Arc;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

type TdsClient = Client<Compat<TcpStream>>;

/// Azure SQL connection descriptor.
///
/// Every [`connect`](Database::connect) asks the credential chain for a
/// token scoped to Azure SQL and opens a new encrypted TDS session with it.
/// No password is ever configured.
pub struct AzureSqlDatabase {
    config: SqlConfig,
    credential: Arc<dyn TokenCredential>,
}

impl AzureSqlDatabase {
    /// Creates a descriptor authenticating with `DefaultAzureCredential`.
    pub fn new(config: &SqlConfig) -> Result<Self> {
        let credential = super::default_credential()?;
        Ok(Self::with_credential(config, credential))
    }

    /// Creates a descriptor that authenticates with `credential`.
    pub fn with_credential(config: &SqlConfig, credential: Arc<dyn TokenCredential>) -> Self {
        Self {
            config: config.clone(),
            credential,
        }
    }

    /// Returns a factory suitable for [`RecordQuerier`](crate::tasks::RecordQuerier).
    pub fn factory() -> DatabaseFactory {
        Box::new(|config| Ok(Box::new(AzureSqlDatabase::new(config)?) as Box<dyn Database>))
    }

    async fn access_token(&self) -> Result<String> {
        let token = self
            .credential
            .get_token(&[SQL_TOKEN_SCOPE])
            .await
            .map_err(|e| ProbeError::Unauthorized(format!("failed to acquire SQL token: {}", e)))?;

        Ok(token.token.secret().to_string())
    }

    fn tds_config(&self, host: &str, port: u16, token: String) -> Config {
        let mut config = Config::new();
        config.host(host);
        config.port(port);
        config.database(&self.config.database);
        config.authentication(AuthMethod::AADToken(token));
        config.encryption(EncryptionLevel::Required);
        config
    }
}

async fn open(config: Config) -> std::result::Result<TdsClient, tiberius::error::Error> {
    let tcp = TcpStream::connect(config.get_addr()).await?;
    tcp.set_nodelay(true)?;
    Client::connect(config, tcp.compat_write()).await
}

#[async_trait]
impl Database for AzureSqlDatabase {
    fn name(&self) -> &str {
        "azuresql"
    }

    async fn connect(&self) -> Result<Box<dyn Connection>> {
        let token = self.access_token().await?;
        let config = self.tds_config(&self.config.server, self.config.port, token.clone());

        debug!(server = %self.config.server, database = %self.config.database, "opening connection");

        let client = match open(config).await {
            Ok(client) => client,
            // The gateway may redirect to the node hosting the database.
            Err(tiberius::error::Error::Routing { host, port }) => {
                debug!(%host, port, "following gateway redirect");
                open(self.tds_config(&host, port, token))
                    .await
                    .map_err(|e| ProbeError::Connect(format!("{}:{}: {}", host, port, e)))?
            }
            Err(e) => {
                return Err(ProbeError::Connect(format!(
                    "{}:{}: {}",
                    self.config.server, self.config.port, e
                )))
            }
        };

        Ok(Box::new(AzureSqlConnection { client }))
    }
}

/// Open TDS session. Dropping it closes the socket.
pub struct AzureSqlConnection {
    client: TdsClient,
}

#[async_trait]
impl Connection for AzureSqlConnection {
    async fn first_row(&mut self, sql: &str) -> Result<Option<ProductRow>> {
        let stream = self
            .client
            .simple_query(sql)
            .await
            .map_err(|e| ProbeError::Query(e.to_string()))?;

        let Some(row) = stream
            .into_row()
            .await
            .map_err(|e| ProbeError::Query(e.to_string()))?
        else {
            return Ok(None);
        };

        let column = |name: &str| -> Result<String> {
            row.try_get::<&str, _>(name)
                .map(|value| value.unwrap_or_default().to_string())
                .map_err(|e| ProbeError::Query(format!("column {}: {}", name, e)))
        };

        Ok(Some(ProductRow::new(
            column("CategoryName")?,
            column("ProductName")?,
        )))
    }
}
