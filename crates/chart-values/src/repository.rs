//! The fetch collaborators backing the deployment form.
//!
//! The engine itself performs no I/O. Everything it needs from the package
//! registry and the cluster — schemas, default values, deployed values,
//! version lists — comes through [`PackageRepository`]. Transport, caching,
//! authentication and retries are the implementor's concern.

use snafu::Snafu;

use crate::schema::SchemaNode;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{entity} not found"))]
    NotFound { entity: String },

    #[snafu(display("failed to fetch {entity}"))]
    Fetch {
        entity: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Read access to chart metadata and deployed release state.
///
/// All methods are fallible with [`Error`]; a failed fetch is terminal for
/// the version selection that triggered it, nothing more.
// The session drives fetches from a single-threaded event loop; auto trait
// bounds on the returned futures are left to implementors.
#[allow(async_fn_in_trait)]
pub trait PackageRepository {
    /// Lists the available versions of a package, newest first.
    async fn fetch_versions(&self, package: &str) -> Result<Vec<String>>;

    /// Fetches the values schema of one package version.
    async fn fetch_schema(&self, package: &str, version: &str) -> Result<SchemaNode>;

    /// Fetches the raw default values document of one package version.
    async fn fetch_default_values(&self, package: &str, version: &str) -> Result<String>;

    /// Fetches the values a deployed release is currently running with.
    /// Only invoked in upgrade flows.
    async fn fetch_deployed_values(&self, release: &str) -> Result<String>;
}
