//! Table - builds the closed ring of diners.

use std::collections::HashSet;

use dining_protocol::Diner;
use dining_topology::{DinerId, RingSize};

use crate::error::{Error, Result};

/// N diners seated in a closed ring, each owning one fork.
///
/// Diner `i` reaches for the fork of diner `(i + 1) mod N`. The neighbor
/// relation lives in [`RingSize`] arithmetic; diners hold no references to
/// each other.
#[derive(Debug)]
pub struct Table {
    ring: RingSize,
    diners: Vec<Diner>,
}

impl Table {
    /// Seat diners in the given order.
    ///
    /// Fails without building anything if there are fewer than two names,
    /// a name is empty, or two names collide.
    pub fn seat<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let ring = RingSize::new(names.len())?;

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if name.trim().is_empty() {
                return Err(Error::EmptyName);
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::DuplicateName(name.clone()));
            }
        }

        let diners = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Diner::new(DinerId(i), name))
            .collect();

        Ok(Self { ring, diners })
    }

    /// Ring size.
    pub const fn ring(&self) -> RingSize {
        self.ring
    }

    pub fn len(&self) -> usize {
        self.diners.len()
    }

    /// Always false; a table seats at least two.
    pub fn is_empty(&self) -> bool {
        self.diners.is_empty()
    }

    pub fn diners(&self) -> &[Diner] {
        &self.diners
    }

    /// Look up a diner by seat.
    pub fn diner(&self, id: DinerId) -> Option<&Diner> {
        self.diners.get(id.0)
    }

    /// The diner whose fork `id` reaches for.
    pub fn neighbor_of(&self, id: DinerId) -> Option<&Diner> {
        if !self.ring.contains(id) {
            return None;
        }
        self.diner(self.ring.neighbor(id))
    }

    /// Both diners of a seat: `(me, neighbor)`.
    pub fn seat_pair(&self, id: DinerId) -> Option<(&Diner, &Diner)> {
        Some((self.diner(id)?, self.neighbor_of(id)?))
    }

    /// Seat name, or the raw id if out of range.
    pub fn name_of(&self, id: DinerId) -> String {
        self.diner(id)
            .map(|d| d.name().to_owned())
            .unwrap_or_else(|| id.to_string())
    }

    /// Whether every fork is back on the table.
    pub fn all_forks_available(&self) -> bool {
        self.diners.iter().all(|d| d.fork().is_available())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dining_topology::TopologyError;

    #[test]
    fn abc_ring_closes() {
        let table = Table::seat(["A", "B", "C"]).unwrap();

        let next = |name: &str| {
            let diner = table.diners().iter().find(|d| d.name() == name).unwrap();
            table.neighbor_of(diner.id()).unwrap().name().to_owned()
        };
        assert_eq!(next("A"), "B");
        assert_eq!(next("B"), "C");
        assert_eq!(next("C"), "A");
    }

    #[test]
    fn following_neighbors_n_times_returns_home() {
        let table = Table::seat(["Plato", "Kant", "Hume", "Locke", "Marx"]).unwrap();
        let n = table.len();

        for start in table.diners() {
            let mut at = start;
            for step in 1..=n {
                at = table.neighbor_of(at.id()).unwrap();
                if step < n {
                    assert_ne!(at.id(), start.id(), "ring closed early after {} steps", step);
                }
            }
            assert_eq!(at.id(), start.id());
        }
    }

    #[test]
    fn every_diner_owns_a_fresh_available_fork() {
        let table = Table::seat(["A", "B", "C", "D"]).unwrap();

        for diner in table.diners() {
            assert_eq!(diner.fork().id(), diner.id().own_fork());
            assert!(diner.fork().is_available());
            assert_eq!(diner.fork().holder(), None);
        }
        assert!(table.all_forks_available());
    }

    #[test]
    fn rejects_rings_below_two() {
        assert!(matches!(
            Table::seat(Vec::<String>::new()),
            Err(Error::Topology(TopologyError::RingTooSmall { size: 0 }))
        ));
        assert!(matches!(
            Table::seat(["Solo"]),
            Err(Error::Topology(TopologyError::RingTooSmall { size: 1 }))
        ));
    }

    #[test]
    fn rejects_duplicate_and_empty_names() {
        assert!(matches!(
            Table::seat(["A", "B", "A"]),
            Err(Error::DuplicateName(name)) if name == "A"
        ));
        assert!(matches!(Table::seat(["A", " "]), Err(Error::EmptyName)));
    }

    #[test]
    fn out_of_range_lookups() {
        let table = Table::seat(["A", "B"]).unwrap();

        assert!(table.diner(DinerId(2)).is_none());
        assert!(table.neighbor_of(DinerId(7)).is_none());
        assert_eq!(table.name_of(DinerId(9)), "diner#9");
        assert_eq!(table.name_of(DinerId(1)), "B");
    }

    #[test]
    fn two_seat_ring_points_both_ways() {
        let table = Table::seat(["A", "B"]).unwrap();
        let (me, neighbor) = table.seat_pair(DinerId(1)).unwrap();

        assert_eq!(me.name(), "B");
        assert_eq!(neighbor.name(), "A");
    }
}
