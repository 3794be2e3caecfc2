use bimap::BiMap;

use crate::binary::Export;
use crate::error::Error;
use crate::label::{Registry, Scope};
use crate::msg::log;
use crate::output::Output;
use crate::project::Options;

/// What the second pass hands to the binary writer.
#[derive(Debug, Default)]
pub struct Resolved {
    /// Import name to id, ids dense from zero.
    pub imports: BiMap<String, u32>,
    pub exports: Vec<Export>,
}

impl Resolved {
    /// Import names in id order.
    pub fn import_names(&self) -> Vec<String> {
        (0..self.imports.len() as u32)
            .filter_map(|id| self.imports.get_by_right(&id).cloned())
            .collect()
    }
}

pub fn resolve(
    registry: &mut Registry,
    output: &mut Output,
    options: &Options,
) -> Result<Resolved, Error> {
    resolve_branches(registry, output, options)?;
    let imports = resolve_imports(registry, output, options)?;
    let exports = resolve_exports(registry, options)?;
    Ok(Resolved { imports, exports })
}

fn offset32(offset: usize) -> Result<u32, Error> {
    u32::try_from(offset)
        .map_err(|_| Error::Format(format!("code offset {offset:#x} exceeds 32 bits")))
}

// ----------------------------------------------------------------------------
// Branches

fn resolve_branches(
    registry: &mut Registry,
    output: &mut Output,
    options: &Options,
) -> Result<(), Error> {
    for reference in registry.take_branches() {
        let target = registry
            .find(&reference.key)
            .ok_or_else(|| Error::UnresolvedSymbol {
                name: reference.label.clone(),
                file: reference.file.clone(),
                line: reference.line,
            })?;
        let disp = target.offset as i64 - reference.offset as i64 - 4;
        let disp = i32::try_from(disp).map_err(|_| {
            Error::Format(format!("branch to `{}` out of 32-bit range", reference.label))
        })?;
        output.patch(&disp.to_le_bytes(), reference.offset)?;
        if options.log_branch_resolve {
            log(
                "branch",
                &format!(
                    "{}:{} `{}` at {:#06x} -> {:#06x} ({:+})",
                    reference.file,
                    reference.line,
                    reference.label,
                    reference.offset,
                    target.offset,
                    disp
                ),
            );
        }
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Imports

fn resolve_imports(
    registry: &Registry,
    output: &mut Output,
    options: &Options,
) -> Result<BiMap<String, u32>, Error> {
    let mut ids = BiMap::new();
    for (name, refs) in registry.import_refs() {
        if refs.is_empty() {
            continue;
        }
        let id = ids.len() as u32;
        ids.insert(name.clone(), id);
        for reference in refs {
            output.patch(&id.to_le_bytes(), reference.location)?;
        }
        if options.log_imports {
            log(
                "import",
                &format!("#{id} `{name}` ({} reference(s))", refs.len()),
            );
        }
    }
    if options.log_imports {
        for (name, decl) in registry.imports() {
            if !ids.contains_left(name) {
                log(
                    "import",
                    &format!("`{name}` unused, dropped ({}:{})", decl.file, decl.line),
                );
            }
        }
    }
    Ok(ids)
}

// ----------------------------------------------------------------------------
// Exports

fn resolve_exports(registry: &Registry, options: &Options) -> Result<Vec<Export>, Error> {
    for (name, decl) in registry.exports() {
        let declared = registry
            .find(name)
            .is_some_and(|label| label.scope == Scope::Global);
        if !declared {
            return Err(Error::UnresolvedSymbol {
                name: name.clone(),
                file: decl.file.clone(),
                line: decl.line,
            });
        }
    }

    let mut exports = Vec::new();
    for label in registry.labels() {
        if label.scope != Scope::Global {
            continue;
        }
        let Some(decl) = registry.export(&label.name) else {
            continue;
        };
        let export = Export {
            name: label.name.clone(),
            offset: offset32(label.offset)?,
            qualifiers: decl.qualifiers,
        };
        if options.log_exports {
            log(
                "export",
                &format!("`{}` {} at {:#06x}", export.name, export.qualifiers, export.offset),
            );
        }
        exports.push(export);
    }
    Ok(exports)
}
