//! Core view-state model for interactive GraphQL schema visualization.
//!
//! This crate is pure data plus one pure function. It holds no I/O and no
//! async code; fetching, parsing and rendering live in `voyager-ops`.
//!
//! ## The State Model
//!
//! ```text
//! ApplicationState = {
//!     schema,           // applied introspection result
//!     display_options,  // how the graph is drawn
//!     selection,        // node / edge / scalar picked by the user
//!     graph_view,       // rendered image + pending focus request
//!     staged,           // chooser choice not applied yet
//!     error_message,
//! }
//!
//! reduce(&Arc<ApplicationState>, Event) -> Arc<ApplicationState>
//! ```
//!
//! ## Rules worth knowing
//!
//! - Selecting an edge also selects the node that owns it; selecting the same
//!   edge again clears both.
//! - A focus acknowledgement only clears the focus it was issued for.
//! - Fetch results carry a [`RequestToken`]; only the latest one applies.

mod error;
mod event;
pub mod ids;
mod introspection;
mod reducer;
mod state;

pub use error::ParseError;
pub use event::Event;
pub use ids::{EdgeId, NodeId, ScalarId};
pub use introspection::{
    Directive, EnumValue, Field, FullType, InputValue, Introspection, NamedTypeRef,
    SchemaDescription, TypeKind, TypeRef, INTROSPECTION_QUERY,
};
pub use reducer::reduce;
pub use state::{
    ApplicationState, DisplayOptions, DisplayOptionsPatch, GraphView, PresetValue, RenderedImage,
    RequestToken, Selection, StagedSchemaChoice, ViewRevision, CUSTOM_PRESET,
};
