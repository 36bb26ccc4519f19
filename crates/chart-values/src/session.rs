//! The reconciliation session.
//!
//! One [`ReconciliationSession`] lives from the moment the deployment form
//! opens for a chart until it is submitted or closed. It owns the working
//! values document and orchestrates the other components across version
//! changes, user edits and restore actions:
//!
//! - On the first version selection of an upgrade flow it freezes a
//!   [`Modification`] capturing how the deployed release differs from the
//!   chart defaults. The modification is computed at most once per session.
//! - On every later version selection (while the user has not edited) it
//!   replays that modification onto the new version's defaults, so prior
//!   customizations are never silently discarded.
//! - Once the user edits anything, their document is authoritative and
//!   version changes only refresh the schema-derived form.
//!
//! The session is single-threaded; fetches race with user input only in the
//! sense that a response can arrive for a version that is no longer
//! selected. Such responses carry a stale [`VersionToken`] and are dropped
//! wholesale.

use serde_yaml::Value;
use tracing::{debug, warn};

use crate::{
    document::ValuesDocument,
    form::{self, FieldDescriptor},
    modification::{self, Modification},
    path::ValuesPath,
    repository::{Error as FetchError, PackageRepository},
    schema::SchemaNode,
};

/// Opaque tag identifying which version selection a fetch belongs to.
///
/// Tokens are compared at response-application time; there is no in-flight
/// cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VersionToken(u64);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
pub enum SessionState {
    /// No version selected yet.
    #[default]
    Empty,
    /// A version selection is in flight.
    Loading,
    /// Schema and defaults for the selected version are applied.
    Ready,
    /// The last version selection failed. Selecting a version again
    /// recovers; the working document is untouched.
    Failed,
}

/// Schema and raw default values fetched for one version selection.
#[derive(Clone, Debug)]
pub struct VersionPayload {
    pub schema: SchemaNode,
    pub defaults: String,
}

/// The mutable aggregate behind one open deployment form.
#[derive(Debug, Default)]
pub struct ReconciliationSession {
    package: String,
    /// Raw values of the deployed release; present only in upgrade flows.
    deployed_values: Option<String>,

    state: SessionState,
    selected_version: Option<String>,
    next_token: u64,
    current_token: Option<VersionToken>,

    available_versions: Vec<String>,
    schema: Option<SchemaNode>,
    /// Raw defaults of the currently selected version, kept for the
    /// restore-defaults action.
    current_defaults: Option<String>,

    /// Frozen once per session; never recomputed afterwards.
    modification: Option<Modification>,
    /// Sticky within the session; only the restore-defaults action clears it.
    user_has_edited: bool,

    working_text: String,
    fields: Vec<FieldDescriptor>,
    last_error: Option<FetchError>,
}

impl ReconciliationSession {
    /// Creates a session for installing a chart that is not deployed yet.
    pub fn new_install(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            ..Self::default()
        }
    }

    /// Creates a session for upgrading a deployed release, given the raw
    /// values the release currently runs with.
    pub fn new_upgrade(package: impl Into<String>, deployed_values: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            deployed_values: Some(deployed_values.into()),
            ..Self::default()
        }
    }

    /// Opens an install session, loading the available version list.
    pub async fn open_install<R: PackageRepository>(
        repository: &R,
        package: &str,
    ) -> Result<Self, FetchError> {
        let mut session = Self::new_install(package);
        session.available_versions = repository.fetch_versions(package).await?;
        Ok(session)
    }

    /// Opens an upgrade session, loading the available version list and the
    /// deployed release's values.
    pub async fn open_upgrade<R: PackageRepository>(
        repository: &R,
        package: &str,
        release: &str,
    ) -> Result<Self, FetchError> {
        let deployed_values = repository.fetch_deployed_values(release).await?;
        let mut session = Self::new_upgrade(package, deployed_values);
        session.available_versions = repository.fetch_versions(package).await?;
        Ok(session)
    }

    /// Records a new version selection and hands out the token the eventual
    /// response must present.
    ///
    /// Issuing a new token implicitly invalidates every outstanding one, so
    /// late responses for previously selected versions are dropped.
    pub fn on_version_change(&mut self, version: impl Into<String>) -> VersionToken {
        self.selected_version = Some(version.into());
        self.state = SessionState::Loading;
        self.next_token += 1;
        let token = VersionToken(self.next_token);
        self.current_token = Some(token);
        token
    }

    /// Applies the outcome of a version-selection fetch.
    ///
    /// Responses whose token no longer matches the current selection are
    /// dropped entirely; no partial application happens.
    pub fn apply_version_response(
        &mut self,
        token: VersionToken,
        result: Result<VersionPayload, FetchError>,
    ) {
        if self.current_token != Some(token) {
            warn!(?token, "dropping stale version response");
            return;
        }

        match result {
            Err(error) => {
                warn!(%error, version = ?self.selected_version, "version selection failed");
                self.last_error = Some(error);
                self.state = SessionState::Failed;
            }
            Ok(payload) => {
                self.last_error = None;
                self.freeze_modification(&payload.defaults);
                if !self.user_has_edited {
                    self.working_text = self.projected_defaults(&payload.defaults);
                }
                self.schema = Some(payload.schema);
                self.current_defaults = Some(payload.defaults);
                self.state = SessionState::Ready;
                self.resynthesize();
            }
        }
    }

    /// Convenience driver: selects `version` and fetches its schema and
    /// defaults from `repository`.
    pub async fn select_version<R: PackageRepository>(
        &mut self,
        repository: &R,
        version: &str,
    ) {
        let token = self.on_version_change(version);

        let result = match repository.fetch_schema(&self.package, version).await {
            Ok(schema) => match repository.fetch_default_values(&self.package, version).await {
                Ok(defaults) => Ok(VersionPayload { schema, defaults }),
                Err(error) => Err(error),
            },
            Err(error) => Err(error),
        };

        self.apply_version_response(token, result);
    }

    /// Applies a basic-form field edit to the working document.
    ///
    /// Edits are sticky: from here on, version changes leave the working
    /// document alone until the user restores the chart defaults.
    pub fn on_field_edit(&mut self, path: &ValuesPath, value: Value) {
        let edited = ValuesDocument::parse(&self.working_text)
            .and_then(|doc| doc.set(path, value));
        match edited {
            Ok(doc) => {
                self.working_text = doc.text().to_owned();
                self.user_has_edited = true;
                self.resynthesize();
            }
            Err(error) => {
                // Without a parseable document there is no basic form to
                // edit through; keep the raw text exactly as it is.
                warn!(%error, %path, "ignoring field edit, working document is not addressable");
            }
        }
    }

    /// Replaces the working document with raw text from the advanced editor.
    ///
    /// The text is kept verbatim even if it does not parse; only the basic
    /// form degrades (to an empty field list) in that case.
    pub fn on_raw_text_edit(&mut self, text: impl Into<String>) {
        self.working_text = text.into();
        self.user_has_edited = true;
        self.resynthesize();
    }

    /// Resets the working document to the selected version's raw defaults,
    /// bypassing any modification replay.
    ///
    /// This also clears the edited flag: the user explicitly discarded their
    /// edits, so subsequent version changes resume the normal
    /// replay-onto-new-defaults behaviour.
    pub fn on_restore_defaults_confirmed(&mut self) {
        let Some(defaults) = &self.current_defaults else {
            debug!("ignoring restore, no defaults are loaded yet");
            return;
        };
        self.working_text = defaults.clone();
        self.user_has_edited = false;
        self.resynthesize();
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn selected_version(&self) -> Option<&str> {
        self.selected_version.as_deref()
    }

    pub fn available_versions(&self) -> &[String] {
        &self.available_versions
    }

    /// The current basic-form field list. Empty while no schema is loaded or
    /// while the working document does not parse.
    pub fn field_descriptors(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// The exact working document text, for the raw editor and for the final
    /// submission payload.
    pub fn working_document_text(&self) -> &str {
        &self.working_text
    }

    pub fn user_has_edited(&self) -> bool {
        self.user_has_edited
    }

    pub fn modification(&self) -> Option<&Modification> {
        self.modification.as_ref()
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    /// Computes the session's modification from the first-seen defaults and
    /// the deployed baseline, if both are available and it has not been
    /// computed before.
    fn freeze_modification(&mut self, defaults: &str) {
        if self.modification.is_some() {
            return;
        }
        let Some(deployed) = &self.deployed_values else {
            return;
        };

        match (ValuesDocument::parse(defaults), ValuesDocument::parse(deployed)) {
            (Ok(default_doc), Ok(deployed_doc)) => {
                let modification = modification::diff(&default_doc, &deployed_doc);
                debug!(
                    operations = modification.operations().len(),
                    "froze deployed-values modification"
                );
                self.modification = Some(modification);
            }
            _ => {
                warn!("cannot compute deployed-values modification, baseline does not parse");
            }
        }
    }

    /// Projects the frozen modification onto freshly fetched defaults, or
    /// passes the defaults through when there is none.
    fn projected_defaults(&self, defaults: &str) -> String {
        let Some(modification) = &self.modification else {
            return defaults.to_owned();
        };

        let replayed = ValuesDocument::parse(defaults)
            .and_then(|doc| modification::replay(modification, &doc));
        match replayed {
            Ok(doc) => doc.text().to_owned(),
            Err(error) => {
                warn!(%error, "failed to replay modification onto new defaults, using them raw");
                defaults.to_owned()
            }
        }
    }

    /// Regenerates the basic-form field list from the current schema and
    /// working document. A parse failure degrades to an empty list; the raw
    /// text stays untouched.
    fn resynthesize(&mut self) {
        let Some(schema) = &self.schema else {
            self.fields.clear();
            return;
        };

        match ValuesDocument::parse(&self.working_text) {
            Ok(doc) => self.fields = form::synthesize(schema, &doc),
            Err(error) => {
                debug!(%error, "working document does not parse, basic form degrades to raw editor");
                self.fields.clear();
            }
        }
    }
}
