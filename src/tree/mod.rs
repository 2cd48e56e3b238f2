pub mod dom;
pub mod expansion;
pub mod markup;
pub mod model;
pub mod sorter;

pub use dom::{Chevron, Container, FileTree, UnitId, UnitKind};
pub use expansion::{ExpandedSet, ExpansionTracker};
pub use markup::{MarkupNode, TreePayload};
pub use model::{NodeKind, TreeModel, TreeNode};
pub use sorter::TreeSorter;
