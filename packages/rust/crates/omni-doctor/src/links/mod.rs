//! Wikilink parsing and resolution.
//!
//! Parsing turns a note body into structured [`WikiLink`]s; resolution maps a
//! [`LinkTarget`] plus the source note's vault onto a fully-qualified
//! [`NoteKey`](crate::note::NoteKey). The resolver never looks at raw text.

mod parser;
mod resolver;

pub use parser::{LinkTarget, VAULT_SCHEME, WikiLink, WikiLinks, parse_link_target, parse_wikilinks};
pub use resolver::{LinkResolver, UnresolvableLink};
