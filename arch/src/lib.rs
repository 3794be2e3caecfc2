pub mod ea;
pub mod op;
pub mod reg;
pub mod size;
