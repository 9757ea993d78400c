//! Turns `--all` / positional names into a validated, ordered selection.

use crate::check::registry::{CheckDescriptor, Registry};
use crate::utils::{KubecheckError, Result};

/// Resolve the user's request against the registry.
///
/// `--all` wins and expands to the whole registry in declaration order.
/// Explicit names keep the order they were given in. Every name is validated
/// before anything is returned, even alongside `--all`, so an unknown name
/// means nothing runs.
pub fn resolve<'r>(
    registry: &'r Registry,
    all: bool,
    names: &[String],
) -> Result<Vec<&'r CheckDescriptor>> {
    let mut selection: Vec<&CheckDescriptor> = Vec::with_capacity(names.len());
    for name in names {
        let desc = registry.resolve(name)?;
        // 重复指定只跑一次
        if !selection.iter().any(|d| d.name == desc.name) {
            selection.push(desc);
        }
    }

    if all {
        return Ok(registry.list_all().iter().collect());
    }
    if selection.is_empty() {
        return Err(KubecheckError::NoChecksSelected);
    }
    Ok(selection)
}
