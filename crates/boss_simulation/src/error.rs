//! Ошибки операций над деревом частей босса

use thiserror::Error;

use crate::parts::PartId;

/// Нарушения предусловий при работе с `PartArena` / `Boss`.
///
/// AI-конструкторы логируют такие ошибки и продолжают без изменения дерева.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BossError {
    #[error("part {0:?} does not exist in the arena")]
    UnknownPart(PartId),

    #[error("part {0:?} is not under the alive subtree")]
    NotAlive(PartId),

    #[error("part {0:?} is already a weakpoint")]
    AlreadyWeakpoint(PartId),

    #[error("part {0:?} is already destroyed or dead")]
    AlreadyDead(PartId),

    #[error("composite part {0:?} cannot become a weakpoint")]
    CompositeCannotBeWeakpoint(PartId),

    #[error("part {0:?} cannot hold children")]
    NotAComposite(PartId),

    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    WouldCreateCycle { parent: PartId, child: PartId },
}
