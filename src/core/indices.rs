use hashbrown::HashMap;

use crate::types::QsoId;

/// Key to ids, in insertion order.
pub type VecIndex<K> = HashMap<K, Vec<QsoId>>;

pub(crate) fn remove_from_vec_index(v: &mut Vec<QsoId>, id: QsoId) {
    if let Some(pos) = v.iter().position(|x| *x == id) {
        v.remove(pos);
    }
}
