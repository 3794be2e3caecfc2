use crate::label::Registry;
use crate::msg::Msg;

/// What an encoder may see of the session while it encodes one statement:
/// the symbol tables, where the statement starts, and a sink for warnings.
pub struct Context<'a> {
    pub registry: &'a Registry,
    pub file: &'a str,
    /// Code offset of the opcode byte.
    pub offset: usize,
    pub messages: Vec<Msg>,
}

impl<'a> Context<'a> {
    pub fn new(registry: &'a Registry, file: &'a str, offset: usize) -> Self {
        Context {
            registry,
            file,
            offset,
            messages: Vec::new(),
        }
    }

    pub fn warn(&mut self, text: String) {
        self.messages.push(Msg::Warn(text));
    }
}
