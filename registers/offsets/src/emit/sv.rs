// Licensed under the Apache-2.0 license

//! SystemVerilog include: `localparam` blocks, plus per array a packed
//! vector holding every instance offset, last instance in the most
//! significant slot.

use std::fmt::{self, Write};

use super::{ArraySection, Backend, Constant, Dialect, OFFSET_BITS};

pub struct SvBackend;

impl Backend for SvBackend {
    fn dialect(&self) -> Dialect {
        Dialect::Sv
    }

    fn is_flat(&self) -> bool {
        true
    }

    fn constants(&self, out: &mut String, _depth: usize, constants: &[Constant]) -> fmt::Result {
        if constants.is_empty() {
            return Ok(());
        }
        if !out.is_empty() {
            writeln!(out)?;
        }
        writeln!(out, "    localparam")?;
        let lines: Vec<_> = constants
            .iter()
            .map(|Constant { name, value }| format!("        {name} = {value}"))
            .collect();
        writeln!(out, "{};", lines.join(",\n"))
    }

    fn open_array(&self, out: &mut String, _depth: usize, array: &ArraySection) -> fmt::Result {
        let desc = array.descriptor;
        if !out.is_empty() {
            writeln!(out)?;
        }
        writeln!(
            out,
            "    localparam [({}*{OFFSET_BITS})-1:0] {}_OFFSET = {{",
            desc.repeat,
            array.label()
        )?;
        let lines: Vec<_> = desc
            .instance_offsets_msb_first()
            .map(|offset| format!("        {OFFSET_BITS}'d{offset}"))
            .collect();
        writeln!(out, "{}", lines.join(",\n"))?;
        writeln!(out, "    }};")
    }
}
