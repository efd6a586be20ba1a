//! # Topo Kernel
//!
//! Specification-resolution core for assembling sheet/projection topologies.
//!
//! A model declares *sheets* (grouped by level, described by an ordered set of
//! properties) and *match conditions* (per destination level, which source
//! sheets it should receive projections from). The kernel turns those
//! declarations into concrete specifications that a simulation runtime can
//! register, in a deterministic order.
//!
//! ## Architecture
//!
//! ```text
//! ObjectKind            ← Closed catalogue of sheet / projection types
//!     │
//! RuleRegistry<Ctx>     ← Label → (kind, parameter function)
//!     │
//! MatchConditions<Ctx>  ← Level → named condition generators
//!     │
//! SheetSpec             ← Canonical properties → identity
//!     │
//! ProjectionSpec        ← (src, dest, name) → connection template
//!     │
//! Runtime               ← register / lookup / connect
//! ```

pub mod error;
pub mod kind;
pub mod matching;
pub mod object_class;
pub mod ordering;
pub mod runtime;
pub mod spec;
pub mod tree;
pub mod value;

pub use error::{ErrorClass, RuntimeError, TopoError};
pub use kind::{ObjectKind, ObjectType, ProjectionKind, SheetKind};
pub use matching::{Conditions, MatchCondition, MatchConditions};
pub use object_class::{ObjectClass, ParamSets, RuleRegistry};
pub use ordering::{CONNECTION_ORDER, match_rank, order_projections};
pub use runtime::{Handle, Runtime, SheetObject};
pub use spec::{ProjectionSpec, SheetSpec, Specification};
pub use tree::{PathTree, TreePath};
pub use value::{PROPERTY_ORDER, Parameters, Properties, ValueMap, value_text};
