pub mod lint;
pub mod render;
pub mod renumber;
pub mod scanner;
pub mod update;

pub use render::{CommonMarkRenderer, MarkupRenderer, render_authorized, render_public};
pub use renumber::{Renumbered, renumber};
pub use scanner::grammar::MarkerGrammar;
pub use scanner::{RegionMatch, scan};
pub use update::{Updated, apply_updates};
