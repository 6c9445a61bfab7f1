// Licensed under the Apache-2.0 license

//! C++ header: one namespace per address map, a nested namespace per array
//! with `constexpr` accessors.

use std::fmt::{self, Write};

use super::{ArraySection, Backend, Constant, Dialect};

pub struct CcBackend;

impl Backend for CcBackend {
    fn dialect(&self) -> Dialect {
        Dialect::Cc
    }

    fn begin(&self, out: &mut String, name: &str) -> fmt::Result {
        writeln!(out, "#pragma once")?;
        writeln!(out)?;
        writeln!(out, "namespace {name} {{")
    }

    fn constants(&self, out: &mut String, _depth: usize, constants: &[Constant]) -> fmt::Result {
        for Constant { name, value } in constants {
            writeln!(out, "constexpr auto {name}{{{value}}};")?;
        }
        Ok(())
    }

    fn open_array(&self, out: &mut String, _depth: usize, array: &ArraySection) -> fmt::Result {
        writeln!(out)?;
        writeln!(out, "namespace {} {{", array.name)
    }

    fn close_array(&self, out: &mut String, _depth: usize, array: &ArraySection) -> fmt::Result {
        let desc = array.descriptor;
        let (start, repeat, stride) = (desc.start, desc.repeat, desc.stride);
        writeln!(out)?;
        writeln!(
            out,
            "constexpr int start(int index) {{ return {start} + (index * {stride}); }}"
        )?;
        writeln!(out)?;
        writeln!(out, "constexpr int repeat() {{ return {repeat}; }}")?;
        writeln!(out)?;
        writeln!(out, "constexpr int stride() {{ return {stride}; }}")?;
        writeln!(out, "}} // namespace {}", array.name)
    }

    fn end(&self, out: &mut String, name: &str) -> fmt::Result {
        writeln!(out, "}} // namespace {name}")
    }
}
