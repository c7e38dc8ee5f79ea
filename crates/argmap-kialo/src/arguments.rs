//! Argument tree reconstruction from dotted labels.
//!
//! Only the label map matters here; statement text never influences the tree.
//! Every label `a.b.c` hangs under `a.b`. Each parent that has a statement of
//! its own becomes an argument whose claim is that statement and whose
//! premises are its children.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ids::{ArgumentId, Label, SourceName, StatementId};
use crate::statements::{LabelMap, ParseRun};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub id: ArgumentId,
    pub claim: StatementId,
    pub source: SourceName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Premise {
    pub argument: ArgumentId,
    pub premise: StatementId,
}

#[derive(Debug, Clone, Default)]
pub struct ArgumentTree {
    pub arguments: Vec<Argument>,
    pub premises: Vec<Premise>,
}

impl ArgumentTree {
    pub fn premises_of(&self, argument: ArgumentId) -> impl Iterator<Item = &Premise> + '_ {
        self.premises.iter().filter(move |p| p.argument == argument)
    }
}

/// Children grouped under their parent label; groups ordered by first child.
fn group_by_parent(label_map: &LabelMap) -> Vec<(Label, Vec<&Label>)> {
    let mut groups: Vec<(Label, Vec<&Label>)> = Vec::new();
    let mut slot: HashMap<Label, usize> = HashMap::new();

    for (label, _) in label_map.iter() {
        let Some(parent) = label.parent() else {
            continue;
        };
        match slot.get(&parent) {
            Some(&i) => groups[i].1.push(label),
            None => {
                slot.insert(parent.clone(), groups.len());
                groups.push((parent, vec![label]));
            }
        }
    }

    groups
}

/// Emit `arg-1, arg-2, ...` in group order, with premises right after their
/// argument. Children whose parent has no statement are dropped.
pub fn build_arguments(label_map: &LabelMap, run: &mut ParseRun) -> ArgumentTree {
    let mut tree = ArgumentTree::default();

    for (parent, children) in group_by_parent(label_map) {
        let Some(claim) = label_map.get(&parent) else {
            tracing::debug!(
                parent = %parent,
                orphans = children.len(),
                "parent label has no statement; skipping its children"
            );
            continue;
        };

        let id = run.next_argument_id();
        tree.arguments.push(Argument {
            id,
            claim,
            source: run.source().clone(),
        });

        tree.premises.extend(children.into_iter().filter_map(|child| {
            label_map.get(child).map(|premise| Premise {
                argument: id,
                premise,
            })
        }));
    }

    tree
}
