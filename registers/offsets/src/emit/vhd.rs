// Licensed under the Apache-2.0 license

//! VHDL package: 32-bit `std_logic_vector` constants, plus per array a
//! concatenated vector of every instance offset, last instance first.

use std::fmt::{self, Write};

use super::{ArraySection, Backend, Constant, Dialect, OFFSET_BITS};

pub struct VhdBackend;

fn word(value: u64) -> String {
    format!("std_logic_vector(to_unsigned({value}, {OFFSET_BITS}))")
}

impl Backend for VhdBackend {
    fn dialect(&self) -> Dialect {
        Dialect::Vhd
    }

    fn is_flat(&self) -> bool {
        true
    }

    fn begin(&self, out: &mut String, name: &str) -> fmt::Result {
        writeln!(out, "library ieee;")?;
        writeln!(out, "use ieee.std_logic_1164.all;")?;
        writeln!(out, "use ieee.numeric_std.all;")?;
        writeln!(out)?;
        writeln!(out, "package {name} is")?;
        writeln!(out)
    }

    fn constants(&self, out: &mut String, depth: usize, constants: &[Constant]) -> fmt::Result {
        if constants.is_empty() {
            return Ok(());
        }
        if depth > 0 {
            writeln!(out)?;
        }
        let msb = OFFSET_BITS - 1;
        for Constant { name, value } in constants {
            writeln!(
                out,
                "  constant {name} : std_logic_vector({msb} downto 0) := {};",
                word(*value)
            )?;
        }
        Ok(())
    }

    fn open_array(&self, out: &mut String, _depth: usize, array: &ArraySection) -> fmt::Result {
        let desc = array.descriptor;
        writeln!(out)?;
        writeln!(
            out,
            "  constant {}_OFFSET : std_logic_vector(({} * {OFFSET_BITS}) - 1 downto 0) :=",
            array.label(),
            desc.repeat
        )?;
        let lines: Vec<_> = desc
            .instance_offsets_msb_first()
            .map(|offset| format!("    {}", word(offset)))
            .collect();
        writeln!(out, "{};", lines.join(" &\n"))
    }

    fn end(&self, out: &mut String, name: &str) -> fmt::Result {
        writeln!(out)?;
        writeln!(out, "end package {name};")
    }
}
