//! Injected strategies: element acceptance and divider validation.

use splitdock_core::{DockableHost, DockableId};

use crate::tree::Orientation;

/// Third-party veto over combining two elements.
///
/// Consulted after both elements agreed through
/// [`DockableHost::accept`].
pub trait AcceptancePolicy {
    fn accept(&self, parent: DockableId, child: DockableId) -> bool;
}

impl<F> AcceptancePolicy for F
where
    F: Fn(DockableId, DockableId) -> bool,
{
    fn accept(&self, parent: DockableId, child: DockableId) -> bool {
        self(parent, child)
    }
}

/// Policy accepting every combination.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl AcceptancePolicy for AcceptAll {
    fn accept(&self, _parent: DockableId, _child: DockableId) -> bool {
        true
    }
}

/// Three-way negotiation before `candidate` is combined into `target`.
pub(crate) fn negotiate<H>(
    host: &H,
    global: Option<&dyn AcceptancePolicy>,
    target: DockableId,
    candidate: DockableId,
) -> bool
where
    H: DockableHost + ?Sized,
{
    host.accept(target, candidate)
        && host.accept(candidate, target)
        && global.is_none_or(|policy| policy.accept(target, candidate))
}

/// What a [`DividerPolicy`] knows about the node whose divider it checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DividerContext {
    pub orientation: Orientation,
    /// Pixel extent of the node along its split axis.
    pub extent: f64,
    /// Minimum pixel extent of the first child along the split axis.
    pub first_minimum: i32,
    /// Minimum pixel extent of the second child along the split axis.
    pub second_minimum: i32,
    pub divider_size: i32,
}

/// Validates a divider before it is used for layout or stored by a drag.
pub trait DividerPolicy {
    /// Return the divider to use instead of `proposed`.
    fn validate(&self, proposed: f64, context: &DividerContext) -> f64;
}

/// Clamp to `[0, 1]` and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconstrainedDividerPolicy;

impl DividerPolicy for UnconstrainedDividerPolicy {
    fn validate(&self, proposed: f64, _context: &DividerContext) -> f64 {
        clamp_unit(proposed)
    }
}

/// Keep both children at or above their minimum size.
///
/// When the node is too small for both minimums the divider is placed
/// halfway between the two limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimumSizeDividerPolicy;

impl DividerPolicy for MinimumSizeDividerPolicy {
    fn validate(&self, proposed: f64, context: &DividerContext) -> f64 {
        let divider = clamp_unit(proposed);
        if context.extent <= 0.0 {
            return divider;
        }

        let half_gap = f64::from(context.divider_size.max(0)) / 2.0;
        let lower = (f64::from(context.first_minimum.max(0)) + half_gap) / context.extent;
        let upper = 1.0 - (f64::from(context.second_minimum.max(0)) + half_gap) / context.extent;

        if lower > upper {
            return clamp_unit((lower + upper) / 2.0);
        }
        divider.clamp(lower.max(0.0), upper.min(1.0))
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.5
    } else {
        value.clamp(0.0, 1.0)
    }
}
