use color_print::cprintln;
use std::path::PathBuf;

use mc64kasm::error::Error;
use mc64kasm::listing::print_listing;
use mc64kasm::project::Project;
use mc64kasm::session::Session;

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Project descriptor (JSON)
    project: String,

    /// Output file, overrides the descriptor
    #[clap(short, long)]
    output: Option<String>,

    /// Enable every log category
    #[clap(short, long)]
    verbose: bool,

    /// Dump assembled code
    #[clap(short, long)]
    dump: bool,
}

fn main() {
    use clap::Parser;

    let args: Args = Args::parse();
    println!("MC64K Assembler");

    if let Err(e) = run(&args) {
        e.print_diag();
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let project = Project::load(&args.project)?;
    let mut options = project.options()?;
    if args.verbose {
        options = options.verbose();
    }
    let target = project.target()?;
    let output = args
        .output
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| project.output());

    println!("1. Read Files and Assemble Lines");
    let mut session = Session::new(options, &project.defines);
    for path in project.sources() {
        println!("  < {}", path.display());
        let result = session.assemble_file(&path);
        for report in &session.reports {
            report.print();
        }
        session.reports.clear();
        result?;
    }

    println!("2. Resolve Labels, Imports & Exports");
    let resolved = session.resolve()?;
    cprintln!(
        "  <dim>{} byte(s) of code, {} import(s), {} export(s), stack {}</>",
        session.output.len(),
        resolved.imports.len(),
        resolved.exports.len(),
        session.options.stack_size
    );

    println!("3. Write Binary");
    println!("  > {}", output.display());
    session.write_binary(&resolved, target, &output)?;

    if args.dump {
        print_listing(&session.listing, session.output.bytes());
    }
    Ok(())
}
