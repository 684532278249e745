//! Manual deployment ordering.
//!
//! Orders are plain permutations. Derived reference edges are deliberately not consulted, so
//! a dependent service may be ordered before the service it references.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use anyhow::anyhow;

use crate::error::{LibError, Result};

/// Returns `current` rearranged so that output position `i` holds `current[new_order[i]]`.
pub fn reorder<T>(current: Vec<T>, new_order: &[usize]) -> Result<Vec<T>> {
    ensure_permutation(current.len(), new_order)?;

    let mut slots = current.into_iter().map(Some).collect::<Vec<_>>();
    let mut output = Vec::with_capacity(slots.len());
    for &index in new_order {
        if let Some(item) = slots[index].take() {
            output.push(item);
        }
    }
    Ok(output)
}

/// Drag-and-drop move: takes the item at `from` out and reinserts it at `to`.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<()> {
    if from >= items.len() || to >= items.len() {
        return Err(LibError::invalid(
            "Order position is out of range",
            anyhow!("move {} -> {} in list of {}", from, to, items.len()),
        ));
    }
    let item = items.remove(from);
    items.insert(to, item);
    Ok(())
}

/// Index permutation that turns the `current` key sequence into `desired`.
pub fn permutation_for<K>(current: &[K], desired: &[K]) -> Result<Vec<usize>>
where
    K: Eq + Hash + Debug,
{
    if current.len() != desired.len() {
        return Err(LibError::invalid(
            "Order must list every service exactly once",
            anyhow!(
                "order has {} entries for {} services",
                desired.len(),
                current.len()
            ),
        ));
    }

    let positions: HashMap<&K, usize> = current
        .iter()
        .enumerate()
        .map(|(index, key)| (key, index))
        .collect();
    let permutation = desired
        .iter()
        .map(|key| {
            positions.get(key).copied().ok_or_else(|| {
                LibError::invalid(
                    "Order references an unknown service",
                    anyhow!("order entry {:?} is not in the list", key),
                )
            })
        })
        .collect::<Result<Vec<_>>>()?;

    ensure_permutation(current.len(), &permutation)?;
    Ok(permutation)
}

fn ensure_permutation(len: usize, order: &[usize]) -> Result<()> {
    if order.len() != len {
        return Err(LibError::invalid(
            "Order must list every service exactly once",
            anyhow!("order has {} entries for {} services", order.len(), len),
        ));
    }

    let mut seen = vec![false; len];
    for &index in order {
        if index >= len {
            return Err(LibError::invalid(
                "Order position is out of range",
                anyhow!("order index {} out of range for {} services", index, len),
            ));
        }
        if std::mem::replace(&mut seen[index], true) {
            return Err(LibError::invalid(
                "Order must list every service exactly once",
                anyhow!("order index {} repeated", index),
            ));
        }
    }
    Ok(())
}
