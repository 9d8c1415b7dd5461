use rand::{seq::index, seq::SliceRandom, Rng};
use tracing::debug;

use crate::{
    catalog::StationCatalog,
    error::QuizError,
    models::{QuizState, Station},
};

/// Produce the next question for the given policy.
///
/// With `fixed_origin` the origin is kept and only the destination is drawn,
/// uniformly among the other stations. Otherwise two distinct stations are
/// drawn without replacement. Hint cards start collapsed.
pub fn generate<R: Rng + ?Sized>(
    catalog: &StationCatalog,
    current_origin: &Station,
    fixed_origin: bool,
    rng: &mut R,
) -> Result<QuizState, QuizError> {
    ensure_playable(catalog)?;

    let state = if fixed_origin {
        let candidates: Vec<&Station> = catalog
            .iter()
            .filter(|station| *station != current_origin)
            .collect();
        let destination = candidates
            .choose(rng)
            .copied()
            .ok_or(QuizError::InsufficientData {
                available: catalog.len(),
            })?;
        QuizState::new(current_origin.clone(), destination.clone())?
    } else {
        let picked = index::sample(rng, catalog.len(), 2);
        let (Some(origin), Some(destination)) =
            (catalog.get(picked.index(0)), catalog.get(picked.index(1)))
        else {
            return Err(QuizError::InsufficientData {
                available: catalog.len(),
            });
        };
        QuizState::new(origin.clone(), destination.clone())?
    };

    debug!(
        origin = %state.origin().name,
        destination = %state.destination().name,
        fixed_origin,
        "Question generated"
    );
    Ok(state)
}

/// Fail unless the catalog can yield two distinct stations.
pub fn ensure_playable(catalog: &StationCatalog) -> Result<(), QuizError> {
    if catalog.len() < 2 {
        return Err(QuizError::InsufficientData {
            available: catalog.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::{rngs::mock::StepRng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn catalog(names: &[&str]) -> StationCatalog {
        StationCatalog::new(
            names
                .iter()
                .map(|name| Station::new(*name, "ward", ["line"])),
        )
    }

    #[test]
    fn empty_and_singleton_catalogs_are_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let origin = Station::new("A", "ward", ["line"]);

        let err = generate(&StationCatalog::empty(), &origin, false, &mut rng).unwrap_err();
        assert_eq!(err, QuizError::InsufficientData { available: 0 });

        let single = catalog(&["A"]);
        for fixed in [true, false] {
            let err = generate(&single, &origin, fixed, &mut rng).unwrap_err();
            assert_eq!(err, QuizError::InsufficientData { available: 1 });
        }
    }

    #[test]
    fn free_mode_always_draws_distinct_stations() {
        let catalog = catalog(&["A", "B"]);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let origin = Station::new("A", "ward", ["line"]);
        for _ in 0..200 {
            let state = generate(&catalog, &origin, false, &mut rng).unwrap();
            assert_ne!(state.origin(), state.destination());
            assert!(catalog.contains(state.origin()));
            assert!(catalog.contains(state.destination()));
        }
    }

    #[test]
    fn fixed_mode_keeps_origin_and_never_repeats_it() {
        let catalog = catalog(&["A", "B", "C", "D"]);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let origin = catalog.find("C").cloned().unwrap();
        let mut seen = HashMap::new();
        for _ in 0..600 {
            let state = generate(&catalog, &origin, true, &mut rng).unwrap();
            assert_eq!(state.origin(), &origin);
            assert_ne!(state.destination(), &origin);
            *seen.entry(state.destination().name.clone()).or_insert(0usize) += 1;
        }
        assert_eq!(seen.len(), 3);
        for count in seen.values() {
            assert!((150..=250).contains(count), "skewed destination count {count}");
        }
    }

    #[test]
    fn fixed_origin_outside_catalog_can_reach_every_station() {
        let catalog = catalog(&["A", "B"]);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let origin = Station::new("Z", "ward", ["line"]);
        let state = generate(&catalog, &origin, true, &mut rng).unwrap();
        assert_eq!(state.origin().name, "Z");
        assert!(catalog.contains(state.destination()));
    }

    #[test]
    fn free_mode_is_uniform() {
        let names = ["A", "B", "C", "D", "E"];
        let catalog = catalog(&names);
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let origin = Station::new("A", "ward", ["line"]);
        let trials = 50_000usize;

        let mut origins: HashMap<String, usize> = HashMap::new();
        let mut pairs: HashMap<(String, String), usize> = HashMap::new();
        for _ in 0..trials {
            let state = generate(&catalog, &origin, false, &mut rng).unwrap();
            *origins.entry(state.origin().name.clone()).or_default() += 1;
            *pairs
                .entry((state.origin().name.clone(), state.destination().name.clone()))
                .or_default() += 1;
        }

        for name in names {
            let freq = origins[name] as f64 / trials as f64;
            assert!((freq - 0.2).abs() < 0.02, "origin {name} frequency {freq}");
        }
        for ((from, _), count) in &pairs {
            let conditional = *count as f64 / origins[from] as f64;
            assert!(
                (conditional - 0.25).abs() < 0.03,
                "destination frequency {conditional} given origin {from}"
            );
        }
        assert_eq!(pairs.len(), 20);
    }

    #[test]
    fn accepts_stub_random_source() {
        let catalog = catalog(&["A", "B", "C"]);
        let origin = catalog.find("A").cloned().unwrap();
        let mut rng = StepRng::new(0, 0);

        let fixed = generate(&catalog, &origin, true, &mut rng).unwrap();
        assert_eq!(fixed.destination().name, "B");

        let free = generate(&catalog, &origin, false, &mut rng).unwrap();
        assert_ne!(free.origin(), free.destination());
    }

    #[test]
    fn same_seed_gives_same_questions() {
        let catalog = catalog(&["A", "B", "C", "D", "E", "F"]);
        let origin = Station::new("A", "ward", ["line"]);
        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..10)
                .map(|_| generate(&catalog, &origin, false, &mut rng).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(99), run(99));
    }
}
