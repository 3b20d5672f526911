//! Footprint fields that mirror the symbol: reference, value, symbol path,
//! properties and the exclude-from-BOM attribute.

use crate::board::{Attributes, Board};
use crate::connectivity::FootprintHandle;
use crate::netlist::{Component, EXCLUDE_FROM_BOM};

use super::context::PassContext;

/// Diff the footprint against its component in a fixed order, reporting one
/// action per mismatch. Changes are only written in a full pass.
pub fn update_footprint_parameters(
    ctx: &mut PassContext<'_>,
    board: &mut Board,
    handle: FootprintHandle,
    component: &Component,
) {
    let Some(before) = ctx.footprint(board, handle).cloned() else {
        return;
    };
    let mut fp = before.clone();
    let mut changed = false;

    if fp.reference != component.reference {
        ctx.action(format!(
            "Change {} reference designator to {}.",
            fp.reference, component.reference
        ));
        fp.reference = component.reference.clone();
        changed = true;
    }

    // From here on the footprint carries the component's reference
    let reference = &component.reference;

    if fp.value != component.value {
        ctx.action(format!(
            "Change {} value from {} to {}.",
            reference, fp.value, component.value
        ));
        fp.value = component.value.clone();
        changed = true;
    }

    if fp.path != component.path {
        ctx.action(format!(
            "Update {} symbol association from {} to {}.",
            reference, fp.path, component.path
        ));
        fp.path = component.path.clone();
        changed = true;
    }

    if fp.properties != component.properties {
        ctx.action(format!("Update {} properties.", reference));
        fp.properties = component.properties.clone();
        changed = true;
    }

    let exclude = component.has_property(EXCLUDE_FROM_BOM);
    if exclude != fp.is_excluded_from_bom() {
        if exclude {
            ctx.action(format!(
                "Setting {} 'exclude from BOM' fabrication attribute.",
                reference
            ));
        } else {
            ctx.action(format!(
                "Removing {} 'exclude from BOM' fabrication attribute.",
                reference
            ));
        }
        fp.attributes.set(Attributes::EXCLUDE_FROM_BOM, exclude);
        changed = true;
    }

    if !changed || ctx.is_dry_run() {
        return;
    }

    if let Some(target) = ctx.footprint_mut(board, handle) {
        *target = fp;
    }
    ctx.snapshot_footprint(handle, before);
}
