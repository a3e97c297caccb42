//! Order-key arithmetic for the note list.
//!
//! Orders are sparse integers. After a drag the whole list is renumbered to
//! `index * ORDER_STEP`, and new notes go `ORDER_STEP` past the current
//! maximum.

use std::collections::HashMap;

use notecab_shared::{Note, OrderUpdate};
use uuid::Uuid;

pub const ORDER_STEP: i64 = 1000;

/// Plain array move: remove at `from`, reinsert at `to`.
pub fn move_index<T>(items: &mut Vec<T>, from: usize, to: usize) {
    let item = items.remove(from);
    items.insert(to, item);
}

pub fn renumber(notes: &mut [Note]) {
    for (idx, note) in notes.iter_mut().enumerate() {
        note.order = idx as i64 * ORDER_STEP;
    }
}

pub fn order_updates(notes: &[Note]) -> Vec<OrderUpdate> {
    notes
        .iter()
        .map(|note| OrderUpdate {
            id: note.id,
            order: note.order,
        })
        .collect()
}

/// Order for a note appended after `notes`. An empty list yields
/// `ORDER_STEP - 1`.
pub fn next_order(notes: &[Note]) -> i64 {
    notes.iter().map(|n| n.order).max().unwrap_or(-1) + ORDER_STEP
}

/// Copies server order values onto the local list and re-sorts when any of
/// them differs. Only `order` is touched. Returns whether anything changed.
pub fn reconcile(local: &mut [Note], server: &[Note]) -> bool {
    let confirmed: HashMap<Uuid, i64> = server.iter().map(|n| (n.id, n.order)).collect();

    let mut changed = false;
    for note in local.iter_mut() {
        if let Some(&order) = confirmed.get(&note.id)
            && order != note.order
        {
            note.order = order;
            changed = true;
        }
    }
    if changed {
        local.sort_by_key(|n| n.order);
    }
    changed
}
