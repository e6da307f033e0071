#![forbid(unsafe_code)]

//! Split layout engine for docking surfaces.
//!
//! # Role in SplitDock
//! `splitdock-layout` arranges displayable elements in a binary space
//! partition: every split node divides its rectangle between two children at
//! a fractional divider, every leaf shows one element. Geometry is kept
//! relative to the surface and only scaled to pixels through two stretch
//! factors, so resizing never touches the tree.
//!
//! # Primary responsibilities
//! - **Tree**: [`SplitTree`], an arena of nodes with validated parent links.
//! - **Layout**: [`SplitTree::update_bounds`] hands pixel bounds to the
//!   [`DockableHost`](splitdock_core::DockableHost), with dividers filtered
//!   through a [`DividerPolicy`].
//! - **Drag and drop**: [`SplitTree::get_put`] resolves a pointer position to
//!   a [`PutInfo`], [`SplitTree::apply_put`] performs it.
//! - **Interchange**: [`SplitDockTree`] describes a layout declaratively;
//!   `evolve` applies it and `submit` reads the tree back.
//! - **Grids**: [`SplitDockGrid`] turns loose rectangles into a tree.
//! - **Persistence**: [`DockPath`] remembers where a leaf was;
//!   [`SplitLayoutSnapshot`] stores a whole layout.
//!
//! [`DockSurface`] bundles all of this with a host for applications.

pub mod config;
pub mod coords;
pub mod error;
mod evolve;
pub mod grid;
pub mod interchange;
pub mod path;
pub mod persist;
pub mod policy;
pub mod put;
pub mod surface;
pub mod tree;

pub use config::{ConfigError, GridConfig, SplitLayoutConfig};
pub use coords::{CoordinateSpace, StretchFactors};
pub use error::{ErrorCategory, SplitDockError};
pub use grid::{GridLine, SplitDockGrid};
pub use interchange::{BuildContext, Key, KeyKind, KeyShape, SplitDockTree};
pub use path::{DockPath, PathLocation, PathStep};
pub use persist::{
    ElementIdMap, NO_MAXIMIZED, PersistedNode, SPLIT_LAYOUT_SCHEMA_VERSION, SplitLayoutSnapshot,
};
pub use policy::{
    AcceptAll, AcceptancePolicy, DividerContext, DividerPolicy, MinimumSizeDividerPolicy,
    UnconstrainedDividerPolicy,
};
pub use put::{DropContext, Put, PutInfo};
pub use surface::DockSurface;
pub use tree::{NodeId, Orientation, SplitBranch, SplitNodeKind, SplitNodeRecord, SplitTree};
