//! Shared configuration for building statements.

use crate::dialect::{self, Dialect};
use crate::error::{OrmError, OrmResult};
use crate::schema::SchemaResolver;
use std::sync::Arc;

/// Environment variable naming the dialect (or a descriptor containing it).
pub const DIALECT_ENV: &str = "SQLCRAFT_DIALECT";

/// Dialect, schema resolver and logging settings shared by statements.
///
/// Cloning is cheap; every clone points at the same dialect and resolver.
///
/// # Example
///
/// ```ignore
/// let config = SqlConfig::from_descriptor("mysql://localhost/app")?
///     .with_schema(registry)
///     .with_max_logged_sql(500);
/// let stmt = Statement::with_config(&config);
/// ```
#[derive(Debug, Clone)]
pub struct SqlConfig {
    /// Dialect used for quoting and literals.
    pub dialect: Arc<dyn Dialect>,
    /// Resolver for entity-based clauses.
    pub schema: Option<Arc<dyn SchemaResolver>>,
    /// Truncate SQL in log events (in bytes). `None` means no truncation.
    pub max_logged_sql: Option<usize>,
}

impl SqlConfig {
    /// Create a configuration for an explicit dialect.
    pub fn new(dialect: impl Dialect + 'static) -> Self {
        Self::from_dialect(Arc::new(dialect))
    }

    /// Create a configuration around a shared dialect.
    pub fn from_dialect(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            schema: None,
            max_logged_sql: Some(200),
        }
    }

    /// Infer the dialect from a data-source descriptor.
    pub fn from_descriptor(descriptor: &str) -> OrmResult<Self> {
        Ok(Self::from_dialect(dialect::from_descriptor(descriptor)?))
    }

    /// Infer the dialect from `SQLCRAFT_DIALECT`, falling back to `DATABASE_URL`.
    pub fn from_env() -> OrmResult<Self> {
        let descriptor = std::env::var(DIALECT_ENV)
            .or_else(|_| std::env::var("DATABASE_URL"))
            .map_err(|_| {
                OrmError::UnsupportedDialect(format!("neither {DIALECT_ENV} nor DATABASE_URL is set"))
            })?;
        let config = Self::from_descriptor(&descriptor)?;
        tracing::debug!(target: "sqlcraft.config", dialect = config.dialect.name(), "dialect from environment");
        Ok(config)
    }

    /// Attach a schema resolver.
    pub fn with_schema(mut self, resolver: impl SchemaResolver + 'static) -> Self {
        self.schema = Some(Arc::new(resolver));
        self
    }

    /// Attach an already shared schema resolver.
    pub fn with_shared_schema(mut self, resolver: Arc<dyn SchemaResolver>) -> Self {
        self.schema = Some(resolver);
        self
    }

    /// Set maximum SQL length to log.
    pub fn with_max_logged_sql(mut self, len: usize) -> Self {
        self.max_logged_sql = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_logged_sql = None;
        self
    }
}
