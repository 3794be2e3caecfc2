use indexmap::IndexMap;
use std::fmt;

use crate::error::Error;

// ----------------------------------------------------------------------------
// Qualifiers

/// Access flags of a cross module symbol, packed the way the export chunk
/// stores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Qualifiers(u8);

impl Qualifiers {
    pub const READ: Qualifiers = Qualifiers(1);
    pub const WRITE: Qualifiers = Qualifiers(2);
    pub const CALL: Qualifiers = Qualifiers(4);

    /// Letters `r`, `w` and `x` in any order, at least one.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let mut bits = 0;
        for c in s.chars() {
            bits |= match c.to_ascii_lowercase() {
                'r' => Self::READ.0,
                'w' => Self::WRITE.0,
                'x' => Self::CALL.0,
                _ => return Err(Error::syntax(format!("Unknown qualifier `{c}` in `{s}`"))),
            };
        }
        if bits == 0 {
            return Err(Error::syntax("Missing qualifiers (expected some of `rwx`)"));
        }
        Ok(Qualifiers(bits))
    }

    pub fn from_bits(bits: u8) -> Option<Self> {
        (bits != 0 && bits & !0x07 == 0).then_some(Qualifiers(bits))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: Qualifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(self, other: Qualifiers) -> Qualifiers {
        Qualifiers(self.0 | other.0)
    }
}

impl fmt::Display for Qualifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, letter) in [(Self::READ, 'r'), (Self::WRITE, 'w'), (Self::CALL, 'x')] {
            if self.contains(flag) {
                write!(f, "{letter}")?;
            }
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Entries

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Global,
    Local(String),
}

#[derive(Debug, Clone)]
pub struct LabelEntry {
    pub name: String,
    pub scope: Scope,
    pub file: String,
    pub line: usize,
    pub offset: usize,
}

/// A displacement field waiting for a label declared further down.
#[derive(Debug, Clone)]
pub struct BranchReference {
    pub offset: usize,
    pub label: String,
    pub key: String,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub qualifiers: Qualifiers,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct ImportReference {
    pub location: usize,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct ExportDecl {
    pub qualifiers: Qualifiers,
    pub file: String,
    pub line: usize,
}

// ----------------------------------------------------------------------------
// Registry

#[derive(Debug, Default)]
pub struct Registry {
    labels: IndexMap<String, LabelEntry>,
    branches: Vec<BranchReference>,
    imports: IndexMap<String, ImportDecl>,
    import_refs: IndexMap<String, Vec<ImportReference>>,
    exports: IndexMap<String, ExportDecl>,
}

pub fn is_local(name: &str) -> bool {
    name.starts_with('.')
}

/// Table key: globals by name, locals qualified by their file.
pub fn key(name: &str, file: &str) -> String {
    if is_local(name) {
        format!("{file}::{name}")
    } else {
        name.to_string()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // Labels -----------------------------------------------------------------

    pub fn declare(
        &mut self,
        name: &str,
        file: &str,
        line: usize,
        offset: usize,
    ) -> Result<&LabelEntry, Error> {
        let key = key(name, file);
        if let Some(prev) = self.labels.get(&key) {
            return Err(Error::DuplicateLabel {
                name: name.to_string(),
                file: prev.file.clone(),
                line: prev.line,
            });
        }
        if let Some(import) = self.imports.get(name) {
            return Err(Error::DuplicateLabel {
                name: name.to_string(),
                file: import.file.clone(),
                line: import.line,
            });
        }
        let scope = if is_local(name) {
            Scope::Local(file.to_string())
        } else {
            Scope::Global
        };
        let entry = LabelEntry {
            name: name.to_string(),
            scope,
            file: file.to_string(),
            line,
            offset,
        };
        Ok(self.labels.entry(key).or_insert(entry))
    }

    pub fn lookup(&self, name: &str, file: &str) -> Option<&LabelEntry> {
        self.labels.get(&key(name, file))
    }

    pub fn labels(&self) -> impl Iterator<Item = &LabelEntry> {
        self.labels.values()
    }

    pub fn refer_branch(&mut self, reference: BranchReference) {
        self.branches.push(reference);
    }

    pub fn branches(&self) -> &[BranchReference] {
        &self.branches
    }

    /// Hand the pending references to the resolver, leaving none behind.
    pub fn take_branches(&mut self) -> Vec<BranchReference> {
        std::mem::take(&mut self.branches)
    }

    pub fn find(&self, key: &str) -> Option<&LabelEntry> {
        self.labels.get(key)
    }

    // Imports ----------------------------------------------------------------

    pub fn declare_import(
        &mut self,
        name: &str,
        qualifiers: Qualifiers,
        file: &str,
        line: usize,
    ) -> Result<(), Error> {
        if is_local(name) {
            return Err(Error::syntax(format!("Cannot import local label `{name}`")));
        }
        let first = self
            .imports
            .get(name)
            .map(|d| (d.file.clone(), d.line))
            .or_else(|| self.labels.get(name).map(|l| (l.file.clone(), l.line)));
        if let Some((file, line)) = first {
            return Err(Error::DuplicateLabel {
                name: name.to_string(),
                file,
                line,
            });
        }
        self.imports.insert(
            name.to_string(),
            ImportDecl {
                qualifiers,
                file: file.to_string(),
                line,
            },
        );
        Ok(())
    }

    pub fn import(&self, name: &str) -> Option<&ImportDecl> {
        self.imports.get(name)
    }

    pub fn imports(&self) -> impl Iterator<Item = (&String, &ImportDecl)> {
        self.imports.iter()
    }

    pub fn refer_import(&mut self, name: &str, reference: ImportReference) {
        self.import_refs
            .entry(name.to_string())
            .or_default()
            .push(reference);
    }

    /// References grouped by label, labels in order of first use.
    pub fn import_refs(&self) -> impl Iterator<Item = (&String, &Vec<ImportReference>)> {
        self.import_refs.iter()
    }

    // Exports ----------------------------------------------------------------

    pub fn declare_export(
        &mut self,
        name: &str,
        qualifiers: Qualifiers,
        file: &str,
        line: usize,
    ) -> Result<(), Error> {
        if is_local(name) {
            return Err(Error::syntax(format!("Cannot export local label `{name}`")));
        }
        if self.imports.contains_key(name) {
            return Err(Error::syntax(format!("Cannot export imported label `{name}`")));
        }
        self.exports
            .entry(name.to_string())
            .and_modify(|decl| decl.qualifiers = decl.qualifiers.union(qualifiers))
            .or_insert(ExportDecl {
                qualifiers,
                file: file.to_string(),
                line,
            });
        Ok(())
    }

    pub fn export(&self, name: &str) -> Option<&ExportDecl> {
        self.exports.get(name)
    }

    pub fn exports(&self) -> impl Iterator<Item = (&String, &ExportDecl)> {
        self.exports.iter()
    }
}
