//! Quantizer table dump command.

use clap::Args;
use console::style;
use serde::Serialize;
use transcode_hantro::quant::{AC, DC};
use transcode_hantro::{QuantEntry, QuantTables, QINDEX_RANGE};

/// Table entries of one quantizer index.
#[derive(Debug, Clone, Serialize)]
pub struct QuantRow {
    /// Quantizer index.
    pub qp: i32,
    /// First order luma.
    pub y1: QuantEntry,
    /// Second order luma.
    pub y2: QuantEntry,
    /// Chroma.
    pub chroma: QuantEntry,
}

/// Print quantizer table entries.
#[derive(Args, Debug)]
pub struct CmdQuant {
    /// Show only this quantizer index.
    #[arg(long)]
    pub qp: Option<i32>,

    /// Output in JSON format.
    #[arg(long)]
    pub json: bool,
}

impl CmdQuant {
    /// Execute the quant command.
    pub fn run(&self) -> anyhow::Result<()> {
        let tables = QuantTables::new();
        let indices: Vec<i32> = match self.qp {
            Some(qp) => vec![qp],
            None => (0..QINDEX_RANGE as i32).collect(),
        };

        let rows = indices
            .into_iter()
            .map(|qp| {
                Ok(QuantRow {
                    qp,
                    y1: *tables.y1(qp)?,
                    y2: *tables.y2(qp)?,
                    chroma: *tables.chroma(qp)?,
                })
            })
            .collect::<transcode_hantro::Result<Vec<_>>>()?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }

        println!();
        println!("{}", style("Quantizer Tables").cyan().bold());
        println!();
        println!(
            "{:<5} {:<24} {:<24} {:<24}",
            style("QP").white().bold(),
            style("Y1 (quant/zbin/rnd/dq)").white().bold(),
            style("Y2").white().bold(),
            style("CHROMA").white().bold()
        );
        println!("{}", style("-".repeat(80)).dim());

        for row in &rows {
            for (j, name) in [(DC, "dc"), (AC, "ac")] {
                println!(
                    "{:<5} {:<24} {:<24} {:<24}",
                    if j == DC {
                        style(row.qp.to_string()).yellow()
                    } else {
                        style(name.to_string()).dim()
                    },
                    format_entry(&row.y1, j),
                    format_entry(&row.y2, j),
                    format_entry(&row.chroma, j)
                );
            }
        }
        println!();

        Ok(())
    }
}

fn format_entry(entry: &QuantEntry, j: usize) -> String {
    format!(
        "{}/{}/{}/{}",
        entry.quant[j], entry.zbin[j], entry.round[j], entry.dequant[j]
    )
}
