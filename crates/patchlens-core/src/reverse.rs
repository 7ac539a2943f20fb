//! Lens reversal: every lens op has a structural dual.
//!
//! `reverse(f ; g) = reverse(g) ; reverse(f)`, so the program is reversed as
//! well as each op.

use crate::lens::{ConvertValue, LensOp, LensSource};

impl LensSource {
    /// The lens that undoes this one on patches.
    pub fn reverse(&self) -> LensSource {
        self.iter().rev().map(reverse_lens_op).collect()
    }
}

pub fn reverse_lens(lens: &LensSource) -> LensSource {
    lens.reverse()
}

pub fn reverse_lens_op(op: &LensOp) -> LensOp {
    match op {
        LensOp::Rename {
            source,
            destination,
        } => LensOp::Rename {
            source: destination.clone(),
            destination: source.clone(),
        },
        LensOp::Hoist { host, name } => LensOp::Plunge {
            host: host.clone(),
            name: name.clone(),
        },
        LensOp::Plunge { host, name } => LensOp::Hoist {
            host: host.clone(),
            name: name.clone(),
        },
        LensOp::Wrap { name } => LensOp::Head { name: name.clone() },
        LensOp::Head { name } => LensOp::Wrap { name: name.clone() },
        LensOp::Add(property) => LensOp::Remove(property.clone()),
        LensOp::Remove(property) => LensOp::Add(property.clone()),
        LensOp::In { name, lens } => LensOp::In {
            name: name.clone(),
            lens: lens.reverse(),
        },
        LensOp::Map { lens } => LensOp::Map {
            lens: lens.reverse(),
        },
        LensOp::Convert(convert) => LensOp::Convert(ConvertValue {
            name: convert.name.clone(),
            mapping: convert.mapping.swapped(),
            source_type: convert.destination_type.clone(),
            destination_type: convert.source_type.clone(),
        }),
    }
}
