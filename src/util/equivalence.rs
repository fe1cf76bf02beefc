//! An equivalence relation over an unknown set.
//!
//! Initially every element is only equivalent to itself; classes can be
//! joined pairwise. Iteration only reports classes with at least two
//! members, in the order their first member was seen.

use std::hash::Hash;

use indexmap::IndexMap;

#[derive(Debug, Clone)]
pub struct EquivalenceRelation<E> {
    class_of: IndexMap<E, usize>,
    // Merged-away classes stay behind as empty slots so indices keep working.
    classes: Vec<Vec<E>>,
}

impl<E> Default for EquivalenceRelation<E> {
    fn default() -> Self {
        Self {
            class_of: IndexMap::new(),
            classes: Vec::new(),
        }
    }
}

impl<E> EquivalenceRelation<E>
where
    E: Hash + Eq + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn class_index(&mut self, element: &E) -> usize {
        if let Some(&idx) = self.class_of.get(element) {
            return idx;
        }
        let idx = self.classes.len();
        self.classes.push(vec![element.clone()]);
        self.class_of.insert(element.clone(), idx);
        idx
    }

    /// Join the classes of two elements.
    pub fn join(&mut self, a: &E, b: &E) {
        let class_a = self.class_index(a);
        let class_b = self.class_index(b);
        if class_a == class_b {
            return;
        }
        // Move the smaller class into the larger one.
        let (winner, loser) = if self.classes[class_a].len() >= self.classes[class_b].len() {
            (class_a, class_b)
        } else {
            (class_b, class_a)
        };
        let moved = std::mem::take(&mut self.classes[loser]);
        for element in &moved {
            self.class_of.insert(element.clone(), winner);
        }
        self.classes[winner].extend(moved);
    }

    pub fn is_equivalent(&self, a: &E, b: &E) -> bool {
        if a == b {
            return true;
        }
        match (self.class_of.get(a), self.class_of.get(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Classes with at least two members.
    pub fn classes(&self) -> impl Iterator<Item = &[E]> {
        self.classes
            .iter()
            .filter(|class| class.len() > 1)
            .map(|class| class.as_slice())
    }

    pub fn len(&self) -> usize {
        self.classes().count()
    }

    pub fn is_empty(&self) -> bool {
        self.classes().next().is_none()
    }

    /// Split classes whose members the given predicate does not consider
    /// equivalent. The result relates two elements iff this relation does
    /// and the predicate agrees.
    pub fn refine<F>(&self, related: F) -> Self
    where
        F: Fn(&E, &E) -> bool,
    {
        let mut refined = Self::new();
        for class in self.classes() {
            let mut unhandled: Vec<&E> = class.iter().collect();
            while let Some(first) = unhandled.first().copied() {
                unhandled.remove(0);
                let mut rest = Vec::new();
                for other in unhandled {
                    if related(first, other) {
                        refined.join(first, other);
                    } else {
                        rest.push(other);
                    }
                }
                unhandled = rest;
            }
        }
        refined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_is_transitive() {
        let mut relation = EquivalenceRelation::new();
        relation.join(&"a", &"b");
        relation.join(&"a", &"c");
        assert!(relation.is_equivalent(&"b", &"c"));
        assert_eq!(relation.len(), 1);
        let class: Vec<_> = relation.classes().next().unwrap().to_vec();
        assert_eq!(class.len(), 3);
    }

    #[test]
    fn separate_joins_stay_apart() {
        let mut relation = EquivalenceRelation::new();
        relation.join(&1, &2);
        relation.join(&3, &4);
        assert!(!relation.is_equivalent(&1, &3));
        assert_eq!(relation.len(), 2);
    }

    #[test]
    fn refine_splits_classes() {
        let mut relation = EquivalenceRelation::new();
        relation.join(&1, &2);
        relation.join(&1, &3);
        let refined = relation.refine(|a, b| (a % 2) == (b % 2));
        assert!(refined.is_equivalent(&1, &3));
        assert!(!refined.is_equivalent(&1, &2));
    }

    #[test]
    fn singletons_are_not_reported() {
        let mut relation: EquivalenceRelation<u32> = EquivalenceRelation::new();
        relation.join(&1, &1);
        assert!(relation.is_empty());
    }
}
