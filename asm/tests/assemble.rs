use indexmap::IndexMap;
use pretty_assertions::assert_eq;

use mc64kasm::binary::chunk::{ALIGN, FILE_HEADER_SIZE};
use mc64kasm::binary::{Container, Dependency, TargetInfo, Version};
use mc64kasm::error::Error;
use mc64kasm::label::Qualifiers;
use mc64kasm::project::{Options, Project};
use mc64kasm::resolve::Resolved;
use mc64kasm::session::Session;

fn assemble(sources: &[(&str, &str)]) -> Result<(Session, Resolved), Error> {
    let mut session = Session::new(Options::default(), &IndexMap::new());
    for (name, text) in sources {
        session.assemble_source(name, text)?;
    }
    let resolved = session.resolve()?;
    Ok((session, resolved))
}

fn code(text: &str) -> Vec<u8> {
    let (session, _) = assemble(&[("main.s", text)]).unwrap();
    session.output.bytes().to_vec()
}

fn target() -> TargetInfo {
    TargetInfo {
        executable: false,
        dependencies: vec![Dependency {
            name: "demo".into(),
            version: Version::new(1, 0, 0),
        }],
    }
}

macro_rules! case {
    ($($name:ident: $source:expr => [$($byte:expr),*],)*) => {
        $(
            #[test]
            fn $name() {
                let expected: Vec<u8> = vec![$($byte),*];
                assert_eq!(code($source), expected);
            }
        )*
    }
}

case! {
    add_immediate_to_register: "  add.l #1, r0" => [0xC2, 0x00, 0xA2, 0x01, 0x00, 0x00, 0x00],
    source_elided: "  add.q (r2), (r2)" => [0xC3, 0x12, 0xFF],
    register_source_kept: "  add.q r2, r2" => [0xC3, 0x02, 0x02],
    fold_taken: "  biz.l #0, skip\n  rts\nskip: rts" => [0x02, 0x01, 0x00, 0x00, 0x00, 0x01, 0x01],
    fold_dead: "  bnz.l #0, skip\n  rts\nskip:" => [0x01],
    backward_local: ".top: rts\n  bra .top" => [0x01, 0x02, 0xFA, 0xFF, 0xFF, 0xFF],
    macros_and_constants: "@def BASE 4\n  move.l #(BASE * 2 + 1), d1" => [0x62, 0x01, 0xA2, 0x09, 0x00, 0x00, 0x00],
    data_string: "  dc.b \"ok\", 0\n  dc.w $1234" => [0x6F, 0x6B, 0x00, 0x34, 0x12],
}

#[test]
fn forward_branch_patched_in_second_pass() {
    // biz.l at 0, displacement field at 2, `target` 40 bytes in
    let source = "  biz.l r0, target\n  dc.q 0, 0, 0, 0\n  dc.b 0, 0\ntarget: rts\n";
    let (session, _) = assemble(&[("main.s", source)]).unwrap();
    let bytes = session.output.bytes();
    assert_eq!(session.registry.lookup("target", "main.s").unwrap().offset, 40);
    assert_eq!(&bytes[..2], &[0x0A, 0x00]);
    assert_eq!(&bytes[2..6], &(40i32 - 2 - 4).to_le_bytes());
}

#[test]
fn taken_fold_keeps_literal_targets() {
    // biz.l #0 at 20 would be 10 bytes long, so -30 means offset 0
    let source = "  dc.l 0, 0, 0, 0, 0\n  biz.l #0, -30\n";
    let bytes = code(source);
    assert_eq!(&bytes[20..], &[0x02, 0xE7, 0xFF, 0xFF, 0xFF]);
    let disp = i32::from_le_bytes(bytes[21..25].try_into().unwrap());
    assert_eq!(20 + 5 + disp, 0);

    // forward: the code after the fold moves up with it
    let bytes = code("  biz.l #0, 4\n  dc.l 0\n  rts\n");
    assert_eq!(bytes, vec![0x02, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01]);

    // dyadic compare, 1 + 5 + 5 + 4 bytes unfolded
    let bytes = code("  rts\n  dc.b 0, 0, 0\n  beq.l #1, #1, -19\n");
    assert_eq!(&bytes[4..], &[0x02, 0xF7, 0xFF, 0xFF, 0xFF]);
}

#[test]
fn duplicate_global_across_files() {
    let err = assemble(&[("a.s", "\nloop: rts\n"), ("b.s", "loop: rts\n")]).unwrap_err();
    match err.root() {
        Error::DuplicateLabel { name, file, line } => {
            assert_eq!(name, "loop");
            assert_eq!(file, "a.s");
            assert_eq!(*line, 2);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn local_labels_are_per_file() {
    let source = ".loop: rts\n  bra .loop\n";
    let (session, _) = assemble(&[("a.s", source), ("b.s", source)]).unwrap();
    assert_eq!(session.output.len(), 12);
}

#[test]
fn unused_import_is_dropped() {
    let source = "@import foo r\n@import bar x\n  jsr bar\n";
    let (_, resolved) = assemble(&[("main.s", source)]).unwrap();
    assert_eq!(resolved.import_names(), vec!["bar"]);
}

#[test]
fn import_ids_in_first_use_order() {
    let source = "@import a x\n@import b x\n  jsr b\n  jmp a\n  jsr b\n";
    let (session, resolved) = assemble(&[("main.s", source)]).unwrap();
    assert_eq!(resolved.import_names(), vec!["b", "a"]);
    let jsr = [0x05, 0xB0, 0x00, 0x00, 0x00, 0x00];
    let jmp = [0x04, 0xB0, 0x01, 0x00, 0x00, 0x00];
    let expected: Vec<u8> = [&jsr[..], &jmp[..], &jsr[..]].concat();
    assert_eq!(session.output.bytes(), expected.as_slice());
}

#[test]
fn import_access_is_checked() {
    let err = assemble(&[("main.s", "@import data r\n  clr.l data\n")]).unwrap_err();
    assert!(matches!(err.root(), Error::ImportAccess { qualifier: 'w', .. }));

    let err = assemble(&[("main.s", "@import func x\n  bra func\n")]).unwrap_err();
    assert!(matches!(err.root(), Error::Syntax(_)));
}

#[test]
fn backward_literal_inside_instruction() {
    let err = assemble(&[("main.s", "  bra -5\n")]).unwrap_err();
    assert!(matches!(
        err.root(),
        Error::InvalidDisplacement { disp: -5, length: 5 }
    ));
    assert!(assemble(&[("main.s", "  bra -6\n")]).is_ok());
}

#[test]
fn unresolved_branch_aborts() {
    let err = assemble(&[("main.s", "  bra nowhere\n")]).unwrap_err();
    assert!(matches!(err.root(), Error::UnresolvedSymbol { line: 1, .. }));
}

#[test]
fn too_few_operands() {
    let err = assemble(&[("main.s", "  move.l r0\n")]).unwrap_err();
    assert!(matches!(
        err.root(),
        Error::OperandCount {
            expected: 2,
            actual: 1,
            ..
        }
    ));
}

#[test]
fn exports_with_qualifiers() {
    let source = "@export main x\nmain: rts\ntable: dc.l 1, 2\n@export table r\n@export table w\n";
    let (_, resolved) = assemble(&[("main.s", source)]).unwrap();
    assert_eq!(resolved.exports.len(), 2);
    assert_eq!(resolved.exports[0].name, "main");
    assert_eq!(resolved.exports[0].qualifiers, Qualifiers::CALL);
    assert_eq!(resolved.exports[1].name, "table");
    assert_eq!(resolved.exports[1].offset, 1);
    assert_eq!(resolved.exports[1].qualifiers, Qualifiers::parse("rw").unwrap());
}

#[test]
fn binary_image_round_trip() {
    let source = "@import print x\n@export main x\nmain: jsr print\n  rts\n";
    let (session, resolved) = assemble(&[("main.s", source)]).unwrap();
    let container = session.container(&resolved, target());
    let image = container.to_bytes().unwrap();

    assert_eq!(&image[..8], b"MC64KBin");
    assert_eq!(image.len() % ALIGN, 0);
    let load = u64::from_le_bytes(image[8..16].try_into().unwrap()) as usize;
    assert_eq!(load + FILE_HEADER_SIZE, image.len());

    // every directory entry points at an aligned chunk
    let list_len = u64::from_le_bytes(image[24..32].try_into().unwrap()) as usize;
    assert_eq!(list_len, 4 * 16);
    for entry in image[32..32 + list_len].chunks(16) {
        let offset = u64::from_le_bytes(entry[8..16].try_into().unwrap()) as usize;
        assert_eq!(offset % ALIGN, 0);
        assert_eq!(&image[offset..offset + 8], &entry[..8]);
    }

    let parsed = Container::parse(&image).unwrap();
    assert_eq!(parsed, container);
    assert_eq!(parsed.imports, vec!["print"]);
    assert_eq!(parsed.exports[0].name, "main");
}

#[test]
fn project_on_disk() {
    let dir = std::env::temp_dir().join(format!("mc64kasm-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("a.s"), "@export start x\nstart:\n  bsr helper\n  rts\n").unwrap();
    std::fs::write(dir.join("b.s"), "helper: move.q #WIDTH, r0\n  rts\n").unwrap();
    let descriptor = r#"{
        "name": "demo",
        "version": "1.0.2",
        "executable": true,
        "host": { "name": "host", "version": "2.1" },
        "sources": ["a.s", "b.s"],
        "options": { "stack_size": "$2000" },
        "defines": { "WIDTH": "320" }
    }"#;
    let path = dir.join("demo.json");
    std::fs::write(&path, descriptor).unwrap();

    let project = Project::load(path.to_str().unwrap()).unwrap();
    let options = project.options().unwrap();
    assert_eq!(options.stack_size, 0x2000);
    let mut session = Session::new(options, &project.defines);
    for source in project.sources() {
        session.assemble_file(&source).unwrap();
    }
    let resolved = session.resolve().unwrap();
    let out = project.output();
    assert_eq!(out, dir.join("demo.bin"));
    session
        .write_binary(&resolved, project.target().unwrap(), &out)
        .unwrap();

    let parsed = Container::parse(&std::fs::read(&out).unwrap()).unwrap();
    assert!(parsed.target.executable);
    assert_eq!(parsed.target.dependencies[1].name, "host");
    assert_eq!(parsed.target.dependencies[1].version, Version::new(2, 1, 0));
    // bsr at 0 reaches helper at 6
    assert_eq!(&parsed.code[..5], &[0x03, 0x01, 0x00, 0x00, 0x00]);
    assert_eq!(parsed.exports[0].name, "start");

    std::fs::remove_dir_all(&dir).unwrap();
}
