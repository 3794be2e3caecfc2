use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufRead, BufWriter, Cursor, Write};
use std::path::Path;

use crate::binary::{Container, TargetInfo};
use crate::context::Context;
use crate::data;
use crate::encoder::encode_line;
use crate::error::Error;
use crate::label::{BranchReference, ImportReference, Registry};
use crate::msg::{log, Msg};
use crate::operand::{Code, Emission, Fixup};
use crate::output::Output;
use crate::parser::{is_macro_edit, Line, Stmt};
use crate::preproc::{preprocess, strip_comment, Macros};
use crate::project::Options;
use crate::resolve::{self, Resolved};
use crate::source::{SourceLine, SourceReader};

/// A warning or note tied to the line that raised it.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub msg: Msg,
    pub file: String,
    pub line: usize,
    pub raw: String,
}

impl Report {
    pub fn print(&self) {
        self.msg.print((&self.file, self.line, &self.raw));
    }
}

/// Where each source line landed in the code segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub file: String,
    pub line: usize,
    pub offset: usize,
    pub len: usize,
    pub raw: String,
}

/// One assembly run: first pass over every source, then `resolve`, then
/// `write_binary`.
#[derive(Debug)]
pub struct Session {
    pub options: Options,
    pub output: Output,
    pub registry: Registry,
    pub reports: Vec<Report>,
    pub listing: Vec<Listing>,
    defines: Macros,
    macros: Macros,
}

impl Session {
    pub fn new(options: Options, defines: &IndexMap<String, String>) -> Self {
        let mut table = Macros::new();
        for (name, value) in defines {
            table.define(name, value);
        }
        Session {
            options,
            output: Output::new(),
            registry: Registry::new(),
            reports: Vec::new(),
            listing: Vec::new(),
            macros: table.clone(),
            defines: table,
        }
    }

    // First pass -------------------------------------------------------------

    pub fn assemble_file(&mut self, path: &Path) -> Result<(), Error> {
        let reader = SourceReader::open(path)?;
        self.assemble(reader)
    }

    /// Assemble in-memory text as if it were the file `name`.
    pub fn assemble_source(&mut self, name: &str, text: &str) -> Result<(), Error> {
        self.assemble(SourceReader::new(name, Cursor::new(text)))
    }

    fn assemble<R: BufRead>(&mut self, reader: SourceReader<R>) -> Result<(), Error> {
        // `@def` edits do not leak into the next file
        self.macros = self.defines.clone();
        let file = reader.name().to_string();
        for line in reader {
            self.process_line(&file, &line?)?;
        }
        Ok(())
    }

    pub fn process_line(&mut self, file: &str, line: &SourceLine) -> Result<(), Error> {
        let start = self.output.len();
        self.line(file, line)
            .map_err(|e| e.at(file, line.number, &line.raw, line.previous.as_deref()))?;
        self.listing.push(Listing {
            file: file.to_string(),
            line: line.number,
            offset: start,
            len: self.output.len() - start,
            raw: line.raw.clone(),
        });
        Ok(())
    }

    fn line(&mut self, file: &str, source: &SourceLine) -> Result<(), Error> {
        let stripped = strip_comment(&source.raw);
        let code = if is_macro_edit(&stripped) {
            stripped
        } else {
            preprocess(&source.raw, &self.macros)?
        };
        let line = Line::parse(&code)?;

        if let Some(label) = &line.label {
            let offset = self.output.len();
            self.registry.declare(label, file, source.number, offset)?;
            if self.options.log_label_add {
                log("label", &format!("`{label}` = {offset:#06x} ({file}:{})", source.number));
            }
        }

        let Some(stmt) = line.stmt else {
            return Ok(());
        };
        match stmt {
            Stmt::Define(name, value) => self.macros.define(&name, &value),
            Stmt::Undefine(name) => {
                if self.macros.undefine(&name).is_none() {
                    self.report(Msg::Warn(format!("`{name}` was not defined")), file, source);
                }
            }
            Stmt::Import(name, qualifiers) => {
                self.registry
                    .declare_import(&name, qualifiers, file, source.number)?;
            }
            Stmt::Export(name, qualifiers) => {
                self.registry
                    .declare_export(&name, qualifiers, file, source.number)?;
            }
            Stmt::Align(align) => {
                let pad = self.output.align(align);
                if self.options.log_pad_size {
                    let at = source.number;
                    log("pad", &format!("{pad} byte(s) to align {align} at {file}:{at}"));
                }
            }
            Stmt::Data(size, values) => {
                let bytes = data::encode(size, &values)?;
                self.output.append(&bytes);
            }
            Stmt::Code(token) => {
                let mut ctx = Context::new(&self.registry, file, self.output.len());
                let emission = encode_line(&token, &mut ctx);
                let messages = std::mem::take(&mut ctx.messages);
                for msg in messages {
                    self.report(msg, file, source);
                }
                match emission? {
                    Emission::Emit(code) => self.emit(code, file, source.number),
                    Emission::Fold(code) => {
                        if self.options.log_code_fold {
                            let what = if code.bytes.is_empty() {
                                "removed"
                            } else {
                                "always taken"
                            };
                            let at = source.number;
                            log("fold", &format!("`{}` {what} at {file}:{at}", token.mnemonic));
                        }
                        self.emit(code, file, source.number);
                    }
                }
            }
        }
        Ok(())
    }

    fn emit(&mut self, code: Code, file: &str, line: usize) {
        let offset = self.output.append(&code.bytes);
        for fixup in code.fixups {
            match fixup {
                Fixup::Branch { at, label, key } => self.registry.refer_branch(BranchReference {
                    offset: offset + at,
                    label,
                    key,
                    file: file.to_string(),
                    line,
                }),
                Fixup::Import { at, name } => self.registry.refer_import(
                    &name,
                    ImportReference {
                        location: offset + at,
                        file: file.to_string(),
                        line,
                    },
                ),
            }
        }
    }

    fn report(&mut self, msg: Msg, file: &str, source: &SourceLine) {
        self.reports.push(Report {
            msg,
            file: file.to_string(),
            line: source.number,
            raw: source.raw.clone(),
        });
    }

    // Second pass ------------------------------------------------------------

    pub fn resolve(&mut self) -> Result<Resolved, Error> {
        resolve::resolve(&mut self.registry, &mut self.output, &self.options)
    }

    pub fn container(&self, resolved: &Resolved, target: TargetInfo) -> Container {
        Container {
            target,
            imports: resolved.import_names(),
            exports: resolved.exports.clone(),
            code: self.output.bytes().to_vec(),
        }
    }

    pub fn write_binary(
        &self,
        resolved: &Resolved,
        target: TargetInfo,
        path: &Path,
    ) -> Result<(), Error> {
        let name = path.display().to_string();
        let file = File::create(path).map_err(|e| Error::FileCreate(name.clone(), e))?;
        let mut out = self
            .container(resolved, target)
            .write(BufWriter::new(file))
            .map_err(|e| Error::FileWrite(name.clone(), e))?;
        out.flush().map_err(|e| Error::FileWrite(name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn session() -> Session {
        Session::new(Options::default(), &IndexMap::new())
    }

    #[test]
    fn label_offsets_track_the_code() {
        let mut s = session();
        s.assemble_source("a.s", "start:\n  add.l #1, r0\nnext: rts\n").unwrap();
        assert_eq!(s.registry.lookup("start", "a.s").unwrap().offset, 0);
        assert_eq!(s.registry.lookup("next", "a.s").unwrap().offset, 7);
        assert_eq!(s.output.len(), 8);
        assert_eq!(s.listing[1].offset, 0);
        assert_eq!(s.listing[1].len, 7);
    }

    #[test]
    fn macros_are_per_file() {
        let mut defines = IndexMap::new();
        defines.insert("ONE".to_string(), "1".to_string());
        let mut s = Session::new(Options::default(), &defines);
        s.assemble_source("a.s", "@def ONE 2\n  dc.b ONE\n").unwrap();
        s.assemble_source("b.s", "  dc.b ONE\n").unwrap();
        assert_eq!(s.output.bytes(), &[2, 1][..]);
    }

    #[test]
    fn errors_carry_the_line() {
        let mut s = session();
        let err = s
            .assemble_source("a.s", "  rts\n  frob r0\n")
            .unwrap_err();
        match err {
            Error::Line(located) => {
                assert_eq!(located.file, "a.s");
                assert_eq!(located.line, 2);
                assert_eq!(located.raw, "  frob r0");
                assert_eq!(located.previous.as_deref(), Some("  rts"));
                assert!(matches!(located.error, Error::UnknownMnemonic(_)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn invariant_compare_warns() {
        let mut s = session();
        s.assemble_source("a.s", "top: beq.l r1, r1, top\n").unwrap();
        assert_eq!(s.reports.len(), 1);
        assert!(matches!(s.reports[0].msg, Msg::Warn(_)));
        assert_eq!(s.output.len(), 1 + 1 + 1 + 4);
    }

    #[test]
    fn align_pads_with_zeros() {
        let mut s = session();
        s.assemble_source("a.s", "  rts\n  @align 8\nhere:\n").unwrap();
        assert_eq!(s.output.bytes(), &[0x01, 0, 0, 0, 0, 0, 0, 0][..]);
        assert_eq!(s.registry.lookup("here", "a.s").unwrap().offset, 8);
    }
}
