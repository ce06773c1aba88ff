/*!
 * # Document Engine
 *
 * The rich-text model the link editor runs against. It is intentionally
 * small: the link editor only needs a selection, link marks, a way to issue
 * commands and a way to hear about changes.
 *
 * ## Model
 *
 * - **Text**: a single `xi_rope::Rope` holding plain UTF-8 text
 * - **Links**: a [`LinkSet`] of non-overlapping, non-inclusive marks stored
 *   as byte ranges beside the rope
 * - **Selection**: a normalised [`SelectionRange`]
 * - **Version**: bumped on every command that changed something
 *
 * ## Command-Based Editing
 *
 * All changes are [`Cmd`]s applied through [`Document::apply`]. Text commands
 * compile to a single rope delta and carry marks and selection through the
 * same edit; link and selection commands only touch their own state. Each
 * effective command produces a [`Patch`] and a [`DocUpdate`] notification.
 *
 * ## Observation
 *
 * [`ListenerRegistry`] is a synchronous publish-subscribe registry. Listeners
 * are called before `apply` returns, in registration order, and detach when
 * their [`Subscription`] handle is dropped. [`SelectionTracker`] is built on
 * it and republishes selection movements only.
 *
 * ## Engine Boundary
 *
 * The link editor talks to the document only through the [`DocumentEngine`]
 * trait, so a host with its own document model can provide one.
 */

pub mod commands;
pub mod document;
pub mod engine;
pub mod events;
pub mod marks;
pub mod patch;
pub mod selection;

pub use commands::Cmd;
pub use document::{Document, DocumentError};
pub use engine::DocumentEngine;
pub use events::{DocUpdate, ListenerRegistry, Subscription, UpdateReason};
pub use marks::{LinkAttributes, LinkId, LinkMark, LinkSet};
pub use patch::Patch;
pub use selection::{SelectionRange, SelectionTracker};
