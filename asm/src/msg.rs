use color_print::{cformat, cprintln};

/// Non fatal diagnostics collected while assembling.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    Error(String),
    Warn(String),
    Note(String),
}

impl Msg {
    fn head(&self) -> String {
        match self {
            Msg::Error(msg) => cformat!("<red,bold>error</>: {}", msg),
            Msg::Warn(msg) => cformat!("<yellow,bold>warn</>: {}", msg),
            Msg::Note(msg) => cformat!("<green,bold>note</>: {}", msg),
        }
    }

    /// Message with the source line it refers to.
    pub fn print(&self, info: (&str, usize, &str)) {
        let (file, line, raw) = info;
        println!("{}", self.head());
        cprintln!("     <blue>--></> <underline>{}:{}</>", file, line);
        cprintln!("      <blue>|</>");
        cprintln!(" <blue>{:>4} |</> {}", line, raw);
        cprintln!("      <blue>|</>");
    }
}

/// One progress line of an enabled log category.
pub fn log(category: &str, text: &str) {
    cprintln!("  <cyan>[{}]</> {}", category, text);
}
