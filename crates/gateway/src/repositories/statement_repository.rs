//! Repository that runs caller-supplied statements atomically.

use driver::{Session, SessionHolder};
use repository::{
    FromConnection, Repository, RepositoryError, RepositoryKind, RepositoryResult, Serialized,
};
use serde_json::Value;

/// Runs batches of statements over a request's session.
pub struct StatementRepository<'a, S> {
    base: Repository<'a, S>,
}

/// Kind of [`StatementRepository`].
pub struct Statements;

impl<S: Session> RepositoryKind<S> for Statements {
    type Repository<'a> = StatementRepository<'a, S> where S: 'a;
}

impl<'a, S: Session> FromConnection<'a, S> for StatementRepository<'a, S> {
    fn from_connection<H: SessionHolder<S> + ?Sized>(conn: &'a H) -> RepositoryResult<Self> {
        Ok(Self {
            base: Repository::new(conn)?,
        })
    }
}

impl<S: Session> StatementRepository<'_, S> {
    /// Run every statement inside one transaction.
    ///
    /// Returns the values of all statements in order. The first failing
    /// statement cancels the transaction; its error carries the position of
    /// the statement within `statements`.
    pub async fn run_atomic(&self, statements: &[String]) -> RepositoryResult<Vec<Value>> {
        let statements = statements.to_vec();

        self.base
            .transaction(|base| {
                Box::pin(async move {
                    let mut results = Vec::with_capacity(statements.len());

                    for (index, statement) in statements.iter().enumerate() {
                        let values = base
                            .query::<Serialized>(statement)
                            .await
                            .map_err(|e| match e {
                                RepositoryError::Statement { message, .. } => {
                                    RepositoryError::Statement { index, message }
                                }
                                other => other,
                            })?;
                        results.extend(values);
                    }

                    Ok(results)
                })
            })
            .await
    }
}
