//! Per-turn context assembly.
//!
//! | Piece | Source |
//! |-------|--------|
//! | History | Conversation store, last `window` turns |
//! | Query | Last 3 history turns + the new message |
//! | People | Term catalog, `person` category, matched against the query |
//! | Rules | Rule catalog, matched against the query + people descriptions |

pub mod assembler;

pub use assembler::{AssembledContext, ContextAssembler, QUERY_HISTORY_TURNS};
