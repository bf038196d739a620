//! Handler for `charta decode`: turn a wire string back into readable
//! rows. Debug aid for inspecting what a backend holds.

use anyhow::Result;
use clap::ValueEnum;

use charta_core::codec;

/// Which record layout the wire string uses.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum WireKind {
    Plan,
    Detail,
}

pub fn run_decode(kind: WireKind, wire: &str) -> Result<()> {
    match kind {
        WireKind::Plan => {
            let rows = codec::decode_plan(wire)?;
            println!("{} plan row(s):", rows.len());
            for (idx, row) in rows.iter().enumerate() {
                let step = row
                    .step_number
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "-".to_owned());
                println!(
                    "  {:>2}. step {:<4} {} [{}] {} {}",
                    idx + 1,
                    step,
                    row.advised_details,
                    row.status,
                    row.advised_date,
                    row.comment,
                );
            }
        }
        WireKind::Detail => {
            let rows = codec::decode_detail(wire)?;
            println!("{} detail row(s):", rows.len());
            for (idx, row) in rows.iter().enumerate() {
                println!(
                    "  {:>2}. parent {:?} number {:?} {} {}",
                    idx + 1,
                    row.parent_step,
                    row.detail_number,
                    row.actual_treatment,
                    row.remark,
                );
            }
        }
    }
    Ok(())
}
