//! Caché auxiliar por página.
//!
//! Un slot por página, reservados todos al crear la caché y nunca
//! redimensionados. Una página sin registros es un `Vec` vacío, nunca un
//! hueco: no hay forma de representar un slot nulo.

use log::{debug, trace};

/// Resultado de `teardown`: cuántos slots y registros se liberaron.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub slots: usize,
    pub records: usize,
}

#[derive(Debug)]
pub struct SignatureCache<R> {
    slots: Vec<Vec<R>>,
}

impl<R> SignatureCache<R> {
    /// Reserva `page_count` colecciones vacías, indexadas desde 0.
    pub fn allocate(page_count: usize) -> Self {
        let mut slots = Vec::with_capacity(page_count);
        slots.resize_with(page_count, Vec::new);
        debug!("Caché de firmas: {} slots reservados", page_count);
        Self { slots }
    }

    /// Añade un registro al final de la página `page`. Si la página no
    /// existe devuelve el registro para que el llamador lo libere.
    pub fn push(&mut self, page: usize, record: R) -> Result<(), R> {
        match self.slots.get_mut(page) {
            Some(slot) => {
                slot.push(record);
                Ok(())
            }
            None => Err(record),
        }
    }

    /// Vuelca los resultados de un descubrimiento. Los registros con página
    /// fuera de rango se entregan a `reject`.
    pub fn populate<I>(&mut self, discovered: I, mut reject: impl FnMut(usize, R))
    where
        I: IntoIterator<Item = (usize, R)>,
    {
        for (page, record) in discovered {
            if let Err(record) = self.push(page, record) {
                reject(page, record);
            }
        }
    }

    pub fn page(&self, page: usize) -> Option<&[R]> {
        self.slots.get(page).map(Vec::as_slice)
    }

    /// Número de slots (igual al número de páginas al abrir).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[R])> + '_ {
        self.slots.iter().enumerate().map(|(page, slot)| (page, slot.as_slice()))
    }

    /// Libera todo: slots en orden de página, y dentro de cada slot los
    /// registros en orden de inserción, antes de soltar el propio slot.
    /// Consume la caché, así que no puede ejecutarse dos veces.
    pub fn teardown(self, mut free: impl FnMut(R)) -> TeardownReport {
        let mut report = TeardownReport::default();

        // Anidado: cada registro antes que su slot y cada slot antes que la
        // página siguiente. El handle lo suelta el llamador después.
        for (page, slot) in self.slots.into_iter().enumerate() {
            let count = slot.len();
            trace!("Caché de firmas: página {} con {} registros", page, count);
            for record in slot {
                free(record);
            }
            report.slots += 1;
            report.records += count;
        }

        debug!(
            "Caché de firmas liberada: {} slots, {} registros",
            report.slots, report.records
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn discovery_lands_in_the_right_pages() {
        let mut cache = SignatureCache::allocate(5);
        cache.populate(vec![(0, "a"), (3, "b"), (0, "c")], |_, _| unreachable!());

        assert_eq!(cache.page(0), Some(&["a", "c"][..]));
        assert_eq!(cache.page(3), Some(&["b"][..]));
        for empty in [1, 2, 4] {
            assert_eq!(cache.page(empty), Some(&[][..]));
        }
        assert_eq!(cache.page(5), None);
        assert_eq!(cache.record_count(), 3);
    }

    #[test]
    fn out_of_range_records_are_handed_back() {
        let mut cache = SignatureCache::allocate(2);
        let mut rejected = Vec::new();
        cache.populate(vec![(1, 10), (7, 70)], |page, record| rejected.push((page, record)));

        assert_eq!(rejected, vec![(7, 70)]);
        assert_eq!(cache.record_count(), 1);
    }

    #[test]
    fn teardown_walks_pages_then_insertion_order() {
        let mut cache = SignatureCache::allocate(3);
        cache.populate(vec![(2, "c1"), (0, "a1"), (2, "c2"), (0, "a2")], |_, _| {});

        let mut freed = Vec::new();
        let report = cache.teardown(|record| freed.push(record));

        assert_eq!(freed, vec!["a1", "a2", "c1", "c2"]);
        assert_eq!(report, TeardownReport { slots: 3, records: 4 });
    }

    #[test]
    fn each_page_is_finished_before_the_next_starts() {
        let mut cache = SignatureCache::allocate(4);
        cache.populate(vec![(3, 30), (1, 10), (3, 31), (1, 11), (0, 0)], |_, _| {});

        let mut pages_seen = Vec::new();
        cache.teardown(|record| {
            let page = record / 10;
            if pages_seen.last() != Some(&page) {
                assert!(!pages_seen.contains(&page), "la página {page} se retomó");
                pages_seen.push(page);
            }
        });
        assert_eq!(pages_seen, vec![0, 1, 3]);
    }

    #[test]
    fn zero_pages() {
        let cache: SignatureCache<u8> = SignatureCache::allocate(0);
        assert!(cache.is_empty());
        assert_eq!(cache.teardown(|_| {}), TeardownReport::default());
    }

    proptest! {
        #[test]
        fn allocate_gives_one_empty_slot_per_page(page_count in 0usize..512) {
            let cache: SignatureCache<u32> = SignatureCache::allocate(page_count);
            prop_assert_eq!(cache.len(), page_count);
            prop_assert!(cache.iter().all(|(_, slot)| slot.is_empty()));
        }

        #[test]
        fn every_pushed_record_is_freed_once(
            page_count in 1usize..64,
            pages in proptest::collection::vec(0usize..64, 0..200),
        ) {
            let mut cache = SignatureCache::allocate(page_count);
            let mut accepted = 0usize;
            for (id, page) in pages.iter().enumerate() {
                if cache.push(*page, id).is_ok() {
                    accepted += 1;
                }
            }

            let mut freed = Vec::new();
            let report = cache.teardown(|id| freed.push(id));
            prop_assert_eq!(report.records, accepted);
            prop_assert_eq!(freed.len(), accepted);
            freed.sort_unstable();
            freed.dedup();
            prop_assert_eq!(freed.len(), accepted);
        }
    }
}
