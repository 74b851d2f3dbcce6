//! Database capability.
//!
//! A [`Database`] is a connection descriptor: it knows where the server is
//! and how to authenticate, and hands out a fresh [`Connection`] on demand.
//! Connections are released when dropped.

use crate::config::SqlConfig;
use crate::Result;
use async_trait::async_trait;

/// The fixed query run every cycle.
///
/// Returns at most one row with `CategoryName` and `ProductName` columns.
pub const PRODUCT_QUERY: &str = "SELECT TOP 1 pc.Name as CategoryName, p.name as ProductName \
     FROM SalesLT.ProductCategory pc \
     JOIN SalesLT.Product p ON pc.productcategoryid = p.productcategoryid;";

/// First row of [`PRODUCT_QUERY`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    /// `CategoryName` column
    pub category_name: String,
    /// `ProductName` column
    pub product_name: String,
}

impl ProductRow {
    /// Creates a row from its two column values.
    pub fn new(category_name: impl Into<String>, product_name: impl Into<String>) -> Self {
        Self {
            category_name: category_name.into(),
            product_name: product_name.into(),
        }
    }
}

impl std::fmt::Display for ProductRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Category Name: {}, Product Name: {}",
            self.category_name, self.product_name
        )
    }
}

/// Connection descriptor for a relational database.
///
/// # Errors
///
/// `connect` fails with
/// [`ProbeError::Unauthorized`](crate::ProbeError::Unauthorized) when no
/// token could be obtained and
/// [`ProbeError::Connect`](crate::ProbeError::Connect) for transport or login
/// failures.
#[async_trait]
pub trait Database: Send + Sync {
    /// Returns the backend name (e.g., "azuresql", "mock").
    fn name(&self) -> &str;

    /// Opens a new connection.
    async fn connect(&self) -> Result<Box<dyn Connection>>;
}

/// An open database connection. Dropping it closes the connection.
#[async_trait]
pub trait Connection: Send {
    /// Executes `sql` and returns its first row, if any.
    ///
    /// The query must produce `CategoryName` and `ProductName` columns.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Query`](crate::ProbeError::Query) if execution or
    /// decoding fails.
    async fn first_row(&mut self, sql: &str) -> Result<Option<ProductRow>>;
}

/// Builds a [`Database`] for a validated configuration.
///
/// Called once, from the SQL task's `init`.
pub type DatabaseFactory = Box<dyn Fn(&SqlConfig) -> Result<Box<dyn Database>> + Send + Sync>;
