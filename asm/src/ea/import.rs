use arch::ea::Mode;

use super::{Ea, UNRESOLVED};
use crate::label::Registry;
use crate::number::is_identifier;

/// A bare name declared with `@import`. The id slot is filled in by the
/// second pass.
pub fn parse(text: &str, registry: &Registry) -> Option<Ea> {
    if !is_identifier(text) || registry.import(text).is_none() {
        return None;
    }
    Some(Ea {
        import: Some(text.to_string()),
        ..Ea::new(Mode::IMPORT, UNRESOLVED.to_vec())
    })
}
