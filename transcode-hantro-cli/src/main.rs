//! hantro-regs - derive and dump Hantro VP8 encoder registers.

use clap::{Parser, Subcommand};

mod commands;

use commands::{CmdQuant, CmdRegs};

/// Command-line arguments for the register dump tool.
#[derive(Parser, Debug)]
#[command(name = "hantro-regs")]
#[command(version)]
#[command(about = "Derive Hantro H1 VP8 encoder registers for a configuration")]
#[command(long_about = "hantro-regs runs the VP8 frame setup without hardware and prints\n\
    the register values the ASIC would receive, for bring-up and for diffing\n\
    against register traces.\n\n\
    EXAMPLES:\n    \
    hantro-regs regs --width 1280 --height 720 --qp 40\n    \
    hantro-regs regs --config encoder.json --frames 3 --json\n    \
    hantro-regs quant --qp 64")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Code frames and print the resulting registers
    Regs(CmdRegs),
    /// Print quantizer table entries
    Quant(CmdQuant),
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    match args.command {
        Command::Regs(cmd) => cmd.run(),
        Command::Quant(cmd) => cmd.run(),
    }
}
