//! Base repository with explicit transaction control.

use std::future::Future;
use std::pin::Pin;

use driver::{QueryResponse, Session, SessionHolder};
use serde::de::DeserializeOwned;

use crate::error::{RepositoryError, RepositoryResult};
use crate::results::{handle_results, Normalize, Raw, Serialized};

const BEGIN_TRANSACTION: &str = "BEGIN TRANSACTION";
const COMMIT_TRANSACTION: &str = "COMMIT TRANSACTION";
const CANCEL_TRANSACTION: &str = "CANCEL TRANSACTION";

/// Construction of a repository from a connected session holder.
///
/// The repository borrows the holder's session for `'a`, so the borrow
/// checker keeps it from outliving the connection scope. Implemented by
/// [`Repository`]; domain repositories compose over it:
///
/// ```ignore
/// struct PersonRepository<'a, S> {
///     base: Repository<'a, S>,
/// }
///
/// impl<'a, S: Session> FromConnection<'a, S> for PersonRepository<'a, S> {
///     fn from_connection<H: SessionHolder<S> + ?Sized>(conn: &'a H) -> RepositoryResult<Self> {
///         Ok(Self { base: Repository::new(conn)? })
///     }
/// }
/// ```
pub trait FromConnection<'a, S>: Sized {
    fn from_connection<H: SessionHolder<S> + ?Sized>(conn: &'a H) -> RepositoryResult<Self>;
}

/// Names a repository type independently of the borrow it is built over.
///
/// [`RepositoryProvider`](crate::RepositoryProvider) is parameterized by a
/// kind so that it can build `Repository<'a>` for whatever `'a` each request
/// scope has.
pub trait RepositoryKind<S> {
    type Repository<'a>: FromConnection<'a, S>
    where
        S: 'a;
}

/// Kind of the plain [`Repository`].
pub struct Base;

impl<S: Session> RepositoryKind<S> for Base {
    type Repository<'a> = Repository<'a, S> where S: 'a;
}

/// Thin statement-issuing facade over a borrowed session.
///
/// Transaction state is not tracked: committing without a begin simply
/// issues the statement. Sequencing is the caller's responsibility.
pub struct Repository<'a, S> {
    db: &'a S,
}

impl<S> Clone for Repository<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Repository<'_, S> {}

impl<'a, S: Session> Repository<'a, S> {
    /// Borrow the session lent by `conn`.
    ///
    /// Fails with [`RepositoryError::InvalidConnection`] when `conn` has no
    /// established session.
    pub fn new<H: SessionHolder<S> + ?Sized>(conn: &'a H) -> RepositoryResult<Self> {
        let db = conn.session().ok_or(RepositoryError::InvalidConnection)?;

        Ok(Self { db })
    }

    /// The underlying session.
    pub fn db(&self) -> &'a S {
        self.db
    }

    /// Issue `BEGIN TRANSACTION`.
    pub async fn begin_transaction(&self) -> RepositoryResult<QueryResponse> {
        self.query::<Raw>(BEGIN_TRANSACTION).await
    }

    /// Issue `COMMIT TRANSACTION`.
    pub async fn commit_transaction(&self) -> RepositoryResult<QueryResponse> {
        self.query::<Raw>(COMMIT_TRANSACTION).await
    }

    /// Issue `CANCEL TRANSACTION`.
    pub async fn cancel_transaction(&self) -> RepositoryResult<QueryResponse> {
        self.query::<Raw>(CANCEL_TRANSACTION).await
    }

    /// Run `statement` under normalization policy `N`.
    pub async fn query<N: Normalize>(&self, statement: &str) -> RepositoryResult<N::Output> {
        handle_results::<N, S>(self.db, statement).await
    }

    /// Run `statement` and decode each statement's value into `T`.
    pub async fn query_as<T: DeserializeOwned>(&self, statement: &str) -> RepositoryResult<Vec<T>> {
        self.query::<Serialized>(statement)
            .await?
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(RepositoryError::from))
            .collect()
    }

    /// Run `f` between begin and commit.
    ///
    /// The transaction is committed when `f` succeeds and cancelled when it
    /// fails; a failing cancel is logged and the error of `f` is returned.
    pub async fn transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: for<'t> FnOnce(
                &'t Self,
            ) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 't>>
            + Send,
        E: From<RepositoryError>,
    {
        self.begin_transaction().await?;

        match f(self).await {
            Ok(result) => {
                self.commit_transaction().await?;
                Ok(result)
            }
            Err(e) => {
                if let Err(cancel_err) = self.cancel_transaction().await {
                    tracing::error!("Transaction cancel failed: {}", cancel_err);
                }
                Err(e)
            }
        }
    }
}

impl<'a, S: Session> FromConnection<'a, S> for Repository<'a, S> {
    fn from_connection<H: SessionHolder<S> + ?Sized>(conn: &'a H) -> RepositoryResult<Self> {
        Self::new(conn)
    }
}
