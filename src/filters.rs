//! Filter selection bound to a pagination controller.

use shutter::{Color, FilterSet, OrderBy, Orientation, PhotoSource};
use tracing::debug;

use crate::pagination::PaginationController;

/// Current order/color/orientation selection.
///
/// Every effective change pushes the complete new snapshot to the
/// controller, which resets its session.
pub struct FilterState<S> {
    current: FilterSet,
    controller: PaginationController<S>,
}

// The binary fixes its filters up front; the per-field setters serve
// interactive front ends.
#[allow(dead_code)]
impl<S: PhotoSource> FilterState<S> {
    /// Bind to `controller` and start its first session with `initial`.
    pub fn new(controller: PaginationController<S>, initial: FilterSet) -> Self {
        controller.set_filters(initial);
        Self {
            current: initial,
            controller,
        }
    }

    pub fn current(&self) -> FilterSet {
        self.current
    }

    pub fn set_order_by(&mut self, order_by: OrderBy) -> bool {
        self.update(FilterSet {
            order_by,
            ..self.current
        })
    }

    pub fn set_color(&mut self, color: Color) -> bool {
        self.update(FilterSet {
            color,
            ..self.current
        })
    }

    pub fn set_orientation(&mut self, orientation: Orientation) -> bool {
        self.update(FilterSet {
            orientation,
            ..self.current
        })
    }

    /// Replace the whole selection. Returns whether anything changed.
    pub fn update(&mut self, next: FilterSet) -> bool {
        if next == self.current {
            debug!("filter selection unchanged");
            return false;
        }
        self.current = next;
        self.controller.set_filters(next);
        true
    }

    pub fn controller(&self) -> &PaginationController<S> {
        &self.controller
    }
}
