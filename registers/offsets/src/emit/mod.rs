// Licensed under the Apache-2.0 license

//! Rendering of a [`FlatMap`] into one of the output dialects.
//!
//! All dialects share one walk over the flattened scopes ([`render`]); a
//! [`Backend`] only decides the textual shape of each piece:
//!
//! ```text
//! begin(name)
//! constants(root registers)          # ascending offset
//! for each array:
//!     open_array(array)              # offsets vector / namespace / class
//!     constants(array registers)
//!     ... nested arrays ...
//!     close_array(array)             # start/repeat/stride accessors
//! end(name)
//! ```

mod cc;
mod py;
mod sv;
mod vhd;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use log::debug;

use crate::config::NameConfig;
use crate::error::{OffsetError, OffsetResult};
use crate::output::{ArrayDescriptor, FlatMap, Scope};

pub use cc::CcBackend;
pub use py::PyBackend;
pub use sv::SvBackend;
pub use vhd::VhdBackend;

/// Width in bits of every packed instance offset in the HDL dialects.
pub const OFFSET_BITS: u32 = 32;

/// A named constant ready to render.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Constant {
    pub name: String,
    pub value: u64,
}

/// An array section being rendered.
pub struct ArraySection<'a> {
    /// Name of the array container.
    pub name: &'a str,
    /// Names of the enclosing arrays and this one, outermost first.
    pub path: &'a [&'a str],
    pub descriptor: &'a ArrayDescriptor,
}

impl ArraySection<'_> {
    /// The array path joined with `_`, e.g. `OUT_IN`.
    pub fn label(&self) -> String {
        self.path.join("_")
    }
}

/// Textual shape of one output dialect.
///
/// `depth` is 0 for the root scope and grows by one per enclosing array.
pub trait Backend {
    fn dialect(&self) -> Dialect;

    /// True if every constant of the artifact lives in one flat scope.
    fn is_flat(&self) -> bool {
        false
    }

    fn begin(&self, _out: &mut String, _name: &str) -> fmt::Result {
        Ok(())
    }

    /// Render the named constants of one scope, already sorted by offset.
    fn constants(&self, out: &mut String, depth: usize, constants: &[Constant]) -> fmt::Result;

    fn open_array(&self, out: &mut String, depth: usize, array: &ArraySection) -> fmt::Result;

    fn close_array(&self, _out: &mut String, _depth: usize, _array: &ArraySection) -> fmt::Result {
        Ok(())
    }

    fn end(&self, _out: &mut String, _name: &str) -> fmt::Result {
        Ok(())
    }
}

/// The supported output dialects.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Dialect {
    /// C++ header with nested namespaces.
    Cc,
    /// Python module with one class per array.
    Py,
    /// SystemVerilog `localparam` include.
    Sv,
    /// VHDL constant package.
    Vhd,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [Dialect::Cc, Dialect::Py, Dialect::Sv, Dialect::Vhd];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Cc => "cc",
            Dialect::Py => "py",
            Dialect::Sv => "sv",
            Dialect::Vhd => "vhd",
        }
    }

    pub fn backend(&self) -> &'static dyn Backend {
        match self {
            Dialect::Cc => &CcBackend,
            Dialect::Py => &PyBackend,
            Dialect::Sv => &SvBackend,
            Dialect::Vhd => &VhdBackend,
        }
    }

    /// Conventional artifact path for an address map called `name`.
    pub fn file_name(&self, name: &str) -> PathBuf {
        match self {
            Dialect::Cc => PathBuf::from(format!("{name}.hh")),
            Dialect::Py => PathBuf::from(name).join("__init__.py"),
            Dialect::Sv => PathBuf::from(format!("{name}.svh")),
            Dialect::Vhd => PathBuf::from(format!("{name}.vhd")),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = OffsetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cc" | "cpp" | "hh" => Ok(Dialect::Cc),
            "py" | "python" => Ok(Dialect::Py),
            "sv" | "svh" | "systemverilog" => Ok(Dialect::Sv),
            "vhd" | "vhdl" => Ok(Dialect::Vhd),
            _ => Err(OffsetError::UnknownDialect(s.to_string())),
        }
    }
}

/// Render `map` in `dialect`.
pub fn emit(map: &FlatMap, dialect: Dialect, names: &NameConfig) -> OffsetResult<String> {
    render(map, dialect.backend(), names)
}

/// Render `map` with an arbitrary backend.
pub fn render(map: &FlatMap, backend: &dyn Backend, names: &NameConfig) -> OffsetResult<String> {
    let name = names.transform(&map.name);
    debug!("Rendering {} as {}", name, backend.dialect());
    let mut out = String::new();
    backend.begin(&mut out, &name)?;
    render_scope(&mut out, backend, names, &map.root, &[])?;
    backend.end(&mut out, &name)?;
    Ok(out)
}

fn render_scope(
    out: &mut String,
    backend: &dyn Backend,
    names: &NameConfig,
    scope: &Scope,
    path: &[&str],
) -> fmt::Result {
    let depth = path.len();
    let constants: Vec<Constant> = scope
        .registers
        .sorted()
        .into_iter()
        .map(|(name, value)| Constant {
            name: if backend.is_flat() {
                names.member_name(path, name)
            } else {
                name.to_string()
            },
            value,
        })
        .collect();
    backend.constants(out, depth, &constants)?;

    for descriptor in &scope.arrays {
        let mut array_path = path.to_vec();
        array_path.push(&descriptor.name);
        let section = ArraySection {
            name: &descriptor.name,
            path: &array_path,
            descriptor,
        };
        backend.open_array(out, depth, &section)?;
        render_scope(out, backend, names, &descriptor.scope, &array_path)?;
        backend.close_array(out, depth, &section)?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::output::RegisterTable;

    /// Flattened form of the root/CH example: CTRL=0, STATUS=1 and CH with
    /// start 4, stride 2, repeat 2 holding DATA=0.
    pub(crate) fn example_map() -> FlatMap {
        FlatMap {
            name: "top".to_string(),
            alignment: 4,
            root: Scope {
                registers: [("STATUS", 1), ("CTRL", 0)].into_iter().collect(),
                arrays: vec![ArrayDescriptor {
                    name: "CH".to_string(),
                    start: 4,
                    repeat: 2,
                    stride: 2,
                    scope: Scope {
                        registers: [("DATA", 0)].into_iter().collect(),
                        arrays: vec![],
                    },
                }],
            },
        }
    }

    pub(crate) fn nested_map() -> FlatMap {
        FlatMap {
            name: "top".to_string(),
            alignment: 1,
            root: Scope {
                registers: RegisterTable::new(),
                arrays: vec![ArrayDescriptor {
                    name: "OUT".to_string(),
                    start: 0x100,
                    repeat: 2,
                    stride: 0x40,
                    scope: Scope {
                        registers: [("CFG", 0)].into_iter().collect(),
                        arrays: vec![ArrayDescriptor {
                            name: "IN".to_string(),
                            start: 4,
                            repeat: 3,
                            stride: 4,
                            scope: Scope {
                                registers: [("V", 1)].into_iter().collect(),
                                arrays: vec![],
                            },
                        }],
                    },
                }],
            },
        }
    }

    /// Records the hook sequence instead of rendering text.
    struct TraceBackend;

    impl Backend for TraceBackend {
        fn dialect(&self) -> Dialect {
            Dialect::Sv
        }
        fn is_flat(&self) -> bool {
            true
        }
        fn begin(&self, out: &mut String, name: &str) -> fmt::Result {
            out.push_str(&format!("begin {name}\n"));
            Ok(())
        }
        fn constants(&self, out: &mut String, depth: usize, constants: &[Constant]) -> fmt::Result {
            for c in constants {
                out.push_str(&format!("{depth} {}={}\n", c.name, c.value));
            }
            Ok(())
        }
        fn open_array(&self, out: &mut String, depth: usize, array: &ArraySection) -> fmt::Result {
            out.push_str(&format!("{depth} open {}\n", array.label()));
            Ok(())
        }
        fn close_array(&self, out: &mut String, depth: usize, array: &ArraySection) -> fmt::Result {
            out.push_str(&format!("{depth} close {}\n", array.name));
            Ok(())
        }
        fn end(&self, out: &mut String, name: &str) -> fmt::Result {
            out.push_str(&format!("end {name}\n"));
            Ok(())
        }
    }

    #[test]
    fn test_render_order() {
        let names = NameConfig::none().add_suffix("_csr");
        let mut map = nested_map();
        map.name = "top_csr".to_string();
        let out = render(&map, &TraceBackend, &names).unwrap();
        assert_eq!(
            out,
            "begin top\n\
             0 open OUT\n\
             1 CFG=0\n\
             1 open OUT_IN\n\
             2 V=1\n\
             1 close IN\n\
             0 close OUT\n\
             end top\n"
        );
    }

    #[test]
    fn test_render_sorted_and_qualified() {
        let names = NameConfig::none().qualify_array_members(true);
        let out = render(&example_map(), &TraceBackend, &names).unwrap();
        assert_eq!(
            out,
            "begin top\n\
             0 CTRL=0\n\
             0 STATUS=1\n\
             0 open CH\n\
             1 CH_DATA=0\n\
             0 close CH\n\
             end top\n"
        );
    }

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("cc".parse::<Dialect>().unwrap(), Dialect::Cc);
        assert_eq!("Python".parse::<Dialect>().unwrap(), Dialect::Py);
        assert_eq!("svh".parse::<Dialect>().unwrap(), Dialect::Sv);
        assert_eq!("VHDL".parse::<Dialect>().unwrap(), Dialect::Vhd);
        assert!(matches!(
            "rust".parse::<Dialect>(),
            Err(OffsetError::UnknownDialect(d)) if d == "rust"
        ));
        for dialect in Dialect::ALL {
            assert_eq!(dialect.as_str().parse::<Dialect>().unwrap(), dialect);
            assert_eq!(dialect.backend().dialect(), dialect);
        }
    }

    #[test]
    fn test_file_names() {
        assert_eq!(Dialect::Cc.file_name("top"), PathBuf::from("top.hh"));
        assert_eq!(
            Dialect::Py.file_name("top"),
            PathBuf::from("top").join("__init__.py")
        );
        assert_eq!(Dialect::Sv.file_name("top"), PathBuf::from("top.svh"));
        assert_eq!(Dialect::Vhd.file_name("top"), PathBuf::from("top.vhd"));
    }
}
