pub mod sexp;
pub mod pcb;
pub mod kicad_netlist;

// Re-export for convenience
pub use sexp::{SExp, SExpParser, ParseError};
pub use pcb::{PcbParser, PcbParseError};
pub use kicad_netlist::{NetlistParser, NetlistParseError};
