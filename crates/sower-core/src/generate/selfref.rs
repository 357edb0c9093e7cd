use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::generate::value::Value;

/// One planned update: set the self-referential column to `target` on the
/// row whose primary key equals `row_key`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelfRefUpdate {
    pub row_key: Value,
    pub target: Value,
}

/// Plan updates for one self-referential column after the table's first
/// commit. Samples floor(n/2) of the committed keys without replacement and
/// pairs each with a randomly chosen different key. Fewer than two rows
/// yields no updates; there is no valid non-self target.
pub fn plan_self_reference_updates(keys: &[Value], rng: &mut StdRng) -> Vec<SelfRefUpdate> {
    if keys.len() < 2 {
        return Vec::new();
    }

    let sample_size = keys.len() / 2;
    keys.choose_multiple(rng, sample_size)
        .map(|row_key| {
            // Uniform pick among the other keys, skipping the row's own.
            let mut idx = rng.random_range(0..keys.len() - 1);
            if keys[idx] == *row_key {
                idx = keys.len() - 1;
            }
            SelfRefUpdate {
                row_key: row_key.clone(),
                target: keys[idx].clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_single_row_plans_nothing() {
        let mut rng = StdRng::seed_from_u64(5);
        assert!(plan_self_reference_updates(&[Value::Int(1)], &mut rng).is_empty());
        assert!(plan_self_reference_updates(&[], &mut rng).is_empty());
    }

    #[test]
    fn test_samples_half_without_replacement() {
        let keys: Vec<Value> = (1..=10).map(Value::Int).collect();
        let mut rng = StdRng::seed_from_u64(5);
        let updates = plan_self_reference_updates(&keys, &mut rng);

        assert_eq!(updates.len(), 5);
        let mut rows: Vec<String> = updates.iter().map(|u| u.row_key.unique_key()).collect();
        rows.sort();
        rows.dedup();
        assert_eq!(rows.len(), 5, "same row updated twice");
    }

    #[test]
    fn test_target_never_equals_own_key() {
        let keys: Vec<Value> = (1..=7).map(Value::Int).collect();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            for update in plan_self_reference_updates(&keys, &mut rng) {
                assert_ne!(update.row_key, update.target);
            }
        }
    }

    #[test]
    fn test_two_rows_yields_one_update() {
        let keys = vec![Value::Int(1), Value::Int(2)];
        let mut rng = StdRng::seed_from_u64(5);
        let updates = plan_self_reference_updates(&keys, &mut rng);
        assert_eq!(updates.len(), 1);
        assert_ne!(updates[0].row_key, updates[0].target);
    }
}
