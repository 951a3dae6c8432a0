//! Session entry points

use crate::clone::{classify, Cloneability};
use crate::config::{EditOptions, RootCheck};
use crate::context::EditContext;
use crate::error::{EditError, EditResult};
use cow_value::Value;

/// Open an edit session over `source` with default options
///
/// # Errors
/// Never with default options; see [`mutate_with`].
pub fn mutate(source: impl Into<Value>) -> EditResult<EditContext> {
    mutate_with(source, EditOptions::default())
}

/// Open an edit session over `source`
///
/// # Errors
/// [`EditError::NotCloneable`] for a scalar or opaque root under
/// [`RootCheck::Strict`].
pub fn mutate_with(source: impl Into<Value>, options: EditOptions) -> EditResult<EditContext> {
    let source = source.into();
    if options.root_check == RootCheck::Strict {
        match classify(&source) {
            Cloneability::Container => {}
            Cloneability::Scalar => return Err(EditError::not_cloneable(source.type_name())),
            Cloneability::NotCloneable(type_name) => return Err(EditError::not_cloneable(type_name)),
        }
    }
    tracing::debug!(
        type_name = source.type_name(),
        clone_mode = ?options.clone_mode,
        "opened edit session"
    );
    Ok(EditContext::new_root(source, options))
}

/// Edit `source` in one scoped session and return the finalized value
///
/// If `updater` fails the session is revoked and its error returned; the
/// source is left untouched.
///
/// # Errors
/// Whatever `updater` or finalization returns.
pub fn apply_update<F>(source: impl Into<Value>, updater: F) -> EditResult<Value>
where
    F: FnOnce(&EditContext) -> EditResult<()>,
{
    apply_update_with(source, EditOptions::default(), updater)
}

/// [`apply_update`] with explicit options
///
/// # Errors
/// Whatever [`mutate_with`], `updater`, or finalization returns.
pub fn apply_update_with<F>(
    source: impl Into<Value>,
    options: EditOptions,
    updater: F,
) -> EditResult<Value>
where
    F: FnOnce(&EditContext) -> EditResult<()>,
{
    let context = mutate_with(source, options)?;
    if let Err(err) = updater(&context) {
        context.revoke();
        return Err(err);
    }
    context.finalize()
}
