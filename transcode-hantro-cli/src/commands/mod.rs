//! CLI subcommand implementations.

pub mod quant;
pub mod regs;

pub use quant::CmdQuant;
pub use regs::CmdRegs;
