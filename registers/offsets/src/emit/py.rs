// Licensed under the Apache-2.0 license

//! Python module: module-level constants and one class per array with
//! static `start`/`repeat`/`stride` methods.

use std::fmt::{self, Write};

use super::{ArraySection, Backend, Constant, Dialect};

const INDENT: &str = "    ";

pub struct PyBackend;

impl Backend for PyBackend {
    fn dialect(&self) -> Dialect {
        Dialect::Py
    }

    fn constants(&self, out: &mut String, depth: usize, constants: &[Constant]) -> fmt::Result {
        let indent = INDENT.repeat(depth);
        for Constant { name, value } in constants {
            writeln!(out, "{indent}{name} = {value}")?;
        }
        Ok(())
    }

    fn open_array(&self, out: &mut String, depth: usize, array: &ArraySection) -> fmt::Result {
        if !out.is_empty() {
            // two blank lines at module level, one inside a class
            writeln!(out)?;
            if depth == 0 {
                writeln!(out)?;
            }
        }
        writeln!(out, "{}class {}:", INDENT.repeat(depth), array.name)
    }

    fn close_array(&self, out: &mut String, depth: usize, array: &ArraySection) -> fmt::Result {
        let i = INDENT.repeat(depth + 1);
        let desc = array.descriptor;
        let (start, repeat, stride) = (desc.start, desc.repeat, desc.stride);
        writeln!(out)?;
        writeln!(out, "{i}@staticmethod")?;
        writeln!(out, "{i}def start(index: int = 0) -> int:")?;
        writeln!(out, "{i}{INDENT}return {start} + index * {stride}")?;
        writeln!(out)?;
        writeln!(out, "{i}@staticmethod")?;
        writeln!(out, "{i}def repeat() -> int:")?;
        writeln!(out, "{i}{INDENT}return {repeat}")?;
        writeln!(out)?;
        writeln!(out, "{i}@staticmethod")?;
        writeln!(out, "{i}def stride() -> int:")?;
        writeln!(out, "{i}{INDENT}return {stride}")
    }
}
