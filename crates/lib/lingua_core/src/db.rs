//! Ephemeral PostgreSQL instances for integration tests.
//!
//! Spawns `initdb`/`pg_ctl`/`pg_isready` from the installation found via
//! `pg_config` on PATH. Data lives in a tempdir and is removed on drop.
//! Tests that need a database call [`EphemeralPostgres::start`] and skip
//! when PostgreSQL is not installed.

use std::net::TcpListener;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio::time::sleep;

/// Database name created inside the ephemeral instance.
const DATABASE_NAME: &str = "lingua_test";

/// Maximum time to wait for PostgreSQL to become ready.
const PG_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Poll interval when waiting for PostgreSQL readiness.
const PG_READY_POLL: Duration = Duration::from_millis(200);

/// Errors from ephemeral database management.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("PostgreSQL command failed: {0}")]
    Command(String),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pg_config not found on PATH")]
    PgConfigNotFound,

    #[error("PostgreSQL not ready after {0:?}")]
    ReadyTimeout(Duration),
}

/// A throwaway PostgreSQL instance bound to a free ephemeral port.
pub struct EphemeralPostgres {
    bin_dir: PathBuf,
    data_dir: PathBuf,
    port: u16,
    started: bool,
    /// Holds the tempdir so it lives as long as the instance.
    _tempdir: tempfile::TempDir,
}

impl EphemeralPostgres {
    /// Initialize and start a fresh instance, returning it ready for
    /// connections. Fails with [`DbError::PgConfigNotFound`] when no
    /// PostgreSQL installation is on PATH.
    pub async fn start() -> Result<Self, DbError> {
        let bin_dir = discover_bin_dir().await?;
        let tempdir = tempfile::tempdir()?;
        let data_dir = tempdir.path().join("pgdata");

        let mut instance = Self {
            bin_dir,
            data_dir,
            port: find_free_port()?,
            started: false,
            _tempdir: tempdir,
        };

        instance.initdb().await?;
        instance.pg_ctl_start().await?;
        instance.wait_for_ready().await?;
        instance.started = true;
        instance.create_database().await?;

        tracing::info!(port = instance.port, "ephemeral PostgreSQL ready");
        Ok(instance)
    }

    /// Connection URL for the test database.
    pub fn connection_url(&self) -> String {
        format!("postgresql://localhost:{}/{}", self.port, DATABASE_NAME)
    }

    /// Stop the server. Called automatically on drop as a fallback.
    pub async fn stop(&mut self) -> Result<(), DbError> {
        if !self.started {
            return Ok(());
        }
        let output = Command::new(self.bin_dir.join("pg_ctl"))
            .arg("-D")
            .arg(&self.data_dir)
            .arg("-m")
            .arg("fast")
            .arg("stop")
            .output()
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DbError::Command(format!("pg_ctl stop failed: {stderr}")));
        }
        self.started = false;
        Ok(())
    }

    async fn initdb(&self) -> Result<(), DbError> {
        let output = Command::new(self.bin_dir.join("initdb"))
            .arg("-D")
            .arg(&self.data_dir)
            .arg("--no-locale")
            .arg("--encoding=UTF8")
            .output()
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DbError::Command(format!("initdb failed: {stderr}")));
        }
        Ok(())
    }

    async fn pg_ctl_start(&self) -> Result<(), DbError> {
        let port_opt = format!(
            "-p {} -k {} -h localhost",
            self.port,
            self.data_dir.display()
        );
        let logfile = self.data_dir.join("postgresql.log");
        let output = Command::new(self.bin_dir.join("pg_ctl"))
            .arg("-D")
            .arg(&self.data_dir)
            .arg("-o")
            .arg(&port_opt)
            .arg("-l")
            .arg(&logfile)
            .arg("start")
            .output()
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DbError::Command(format!("pg_ctl start failed: {stderr}")));
        }
        Ok(())
    }

    async fn wait_for_ready(&self) -> Result<(), DbError> {
        let pg_isready = self.bin_dir.join("pg_isready");
        let deadline = tokio::time::Instant::now() + PG_READY_TIMEOUT;

        loop {
            let output = Command::new(&pg_isready)
                .arg("-p")
                .arg(self.port.to_string())
                .arg("-h")
                .arg("localhost")
                .output()
                .await?;

            if output.status.success() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(DbError::ReadyTimeout(PG_READY_TIMEOUT));
            }
            sleep(PG_READY_POLL).await;
        }
    }

    async fn create_database(&self) -> Result<(), DbError> {
        let maintenance_url = format!("postgresql://localhost:{}/postgres", self.port);
        let pool = sqlx::PgPool::connect(&maintenance_url).await?;
        // CREATE DATABASE cannot use bind parameters
        sqlx::query(&format!("CREATE DATABASE \"{DATABASE_NAME}\""))
            .execute(&pool)
            .await?;
        pool.close().await;
        Ok(())
    }
}

impl Drop for EphemeralPostgres {
    fn drop(&mut self) {
        if self.started {
            let output = std::process::Command::new(self.bin_dir.join("pg_ctl"))
                .arg("-D")
                .arg(&self.data_dir)
                .arg("-m")
                .arg("immediate")
                .arg("stop")
                .output();
            if let Err(e) = output {
                tracing::warn!(error = %e, "failed to stop ephemeral PostgreSQL");
            }
        }
    }
}

/// Discover the PG bin directory via `pg_config --bindir`.
async fn discover_bin_dir() -> Result<PathBuf, DbError> {
    let output = Command::new("pg_config")
        .arg("--bindir")
        .output()
        .await
        .map_err(|_| DbError::PgConfigNotFound)?;

    if !output.status.success() {
        return Err(DbError::PgConfigNotFound);
    }

    let bin_dir = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(PathBuf::from(bin_dir))
}

/// Find a free ephemeral port by binding to port 0.
fn find_free_port() -> Result<u16, DbError> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    Ok(port)
}
