#![forbid(unsafe_code)]

//! Core: geometry primitives and the capabilities a host toolkit provides.
//!
//! # Role in SplitDock
//! `splitdock-core` is the seam between the split layout engine and whatever
//! actually draws panels. The engine never touches widgets; it only asks the
//! host, through [`DockableHost`], for sizes and acceptance decisions and
//! hands pixel bounds back.
//!
//! # Primary responsibilities
//! - **Geometry**: relative [`Rect`] (surface fractions) and pixel
//!   [`PixelRect`], [`Size`], [`Insets`], [`PixelPoint`].
//! - **Identity**: [`DockableId`], the stable handle of a displayable element.
//! - **Host capabilities**: [`DockableHost`] plus [`MemoryHost`], an in-memory
//!   host for headless layout computation.

pub mod geometry;
pub mod host;

pub use geometry::{Insets, PixelPoint, PixelRect, Rect, Size};
pub use host::{DockableHost, DockableId, MemoryHost, Stack, TitleSide, TitleStrip};
