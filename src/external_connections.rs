use sqlx::PgConnection;

/// A handle owning an active database connection which can be borrowed to execute queries
pub trait ConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// Owns the clients used to reach systems outside this process. Driven adapters accept an
/// implementation of this trait rather than concrete clients so domain logic can run against
/// fakes in unit tests. Every mutation in this service is a single SQL statement, so handles
/// are acquired per query and there is no transaction variant.
pub trait ExternalConnectivity: Sync {
    type DbHandle<'cxn_borrow>: ConnectionHandle
    where
        Self: 'cxn_borrow;

    /// Acquires a database connection handle from the pool
    async fn database_cxn(&mut self) -> Result<Self::DbHandle<'_>, anyhow::Error>;
}
