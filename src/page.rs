use std::sync::Arc;

use bit_vec::BitVec;
use log::debug;

use crate::error::SmallError;
use crate::page_id::{PageId, RecordId};
use crate::schema::Schema;
use crate::transaction::TransactionId;
use crate::tuple::Tuple;

/// Number of slots a page of `page_bytes` holds for tuples of `tuple_bytes`
/// each: floor((page_bytes * 8) / (tuple_bytes * 8 + 1)), the "+1" paying
/// for that tuple's header bit.
pub fn slots_per_page(page_bytes: usize, tuple_bytes: usize) -> usize {
    (page_bytes * 8) / (tuple_bytes * 8 + 1)
}

fn header_bytes(num_slots: usize) -> usize {
    (num_slots + 7) / 8
}

/// A slotted page: a header bitmap of occupied slots followed by a packed
/// array of tuple slots, kept in memory as the header bitmap plus the raw
/// (non-header) slot bytes.
pub struct HeapPage {
    pid: PageId,
    schema: Arc<Schema>,
    header: BitVec,
    slot_bytes: Vec<u8>,
    tuple_bytes: usize,
    num_slots: usize,
    dirty_by: Option<TransactionId>,
    before_image: Vec<u8>,
}

impl HeapPage {
    /// Parses `bytes` (exactly `page_bytes` long) into a page. Fails if
    /// the length is wrong; individual slot decode failures never happen
    /// for the fixed-width int/char field types this core supports, since
    /// every byte pattern decodes to *some* value.
    pub fn new(
        pid: PageId,
        schema: Arc<Schema>,
        bytes: &[u8],
        page_bytes: usize,
    ) -> Result<HeapPage, SmallError> {
        if bytes.len() != page_bytes {
            return Err(SmallError::db_error(&format!(
                "page byte length mismatch: expected {}, got {}",
                page_bytes,
                bytes.len()
            )));
        }

        let tuple_bytes = schema.byte_size();
        let num_slots = slots_per_page(page_bytes, tuple_bytes);
        let hdr_bytes = header_bytes(num_slots);

        let header = BitVec::from_bytes(&bytes[0..hdr_bytes]);
        let slot_bytes = bytes[hdr_bytes..].to_vec();

        debug!(
            "parsed heap page {:?}: {} slots, {} header bytes",
            pid, num_slots, hdr_bytes
        );

        Ok(HeapPage {
            pid,
            schema,
            header,
            slot_bytes,
            tuple_bytes,
            num_slots,
            dirty_by: None,
            before_image: bytes.to_vec(),
        })
    }

    /// A freshly allocated, all-empty page of `page_bytes` bytes.
    pub fn empty(pid: PageId, schema: Arc<Schema>, page_bytes: usize) -> HeapPage {
        let bytes = vec![0u8; page_bytes];
        HeapPage::new(pid, schema, &bytes, page_bytes).expect("zeroed buffer is always valid")
    }

    pub fn pid(&self) -> PageId {
        self.pid
    }

    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    fn is_slot_used(&self, slot: usize) -> bool {
        self.header.get(slot).unwrap_or(false)
    }

    fn set_slot_used(&mut self, slot: usize, used: bool) {
        while self.header.len() <= slot {
            self.header.push(false);
        }
        self.header.set(slot, used);
    }

    pub fn get_num_empty_slots(&self) -> usize {
        (0..self.num_slots)
            .filter(|&s| !self.is_slot_used(s))
            .count()
    }

    fn slot_range(&self, slot: usize) -> std::ops::Range<usize> {
        let start = slot * self.tuple_bytes;
        start..start + self.tuple_bytes
    }

    fn read_slot(&self, slot: usize) -> Result<Tuple, SmallError> {
        let range = self.slot_range(slot);
        let mut t = Tuple::decode(Arc::clone(&self.schema), &self.slot_bytes[range])?;
        t.set_record_id(Some(RecordId::new(self.pid, slot)));
        Ok(t)
    }

    /// Finds the lowest-index empty slot, writes `t`'s bytes, sets the
    /// header bit, and assigns `t`'s [`RecordId`] to (pid, slot).
    pub fn insert_tuple(&mut self, t: &mut Tuple) -> Result<(), SmallError> {
        if t.schema().as_ref() != self.schema.as_ref() {
            return Err(SmallError::illegal_argument(
                "tuple schema does not match page schema",
            ));
        }
        if let Some(rid) = t.record_id() {
            if rid.page_id != self.pid || self.is_slot_used(rid.slot_index) {
                return Err(SmallError::illegal_argument(
                    "tuple already has a record id on another occupied slot",
                ));
            }
        }

        let slot = (0..self.num_slots)
            .find(|&s| !self.is_slot_used(s))
            .ok_or_else(|| SmallError::db_error("no empty slot on page"))?;

        let range = self.slot_range(slot);
        let encoded = t.encode();
        self.slot_bytes[range].copy_from_slice(&encoded);
        self.set_slot_used(slot, true);
        t.set_record_id(Some(RecordId::new(self.pid, slot)));
        Ok(())
    }

    /// Clears the header bit for `t`'s slot. The slot bytes remain but are
    /// logically absent.
    pub fn delete_tuple(&mut self, t: &Tuple) -> Result<(), SmallError> {
        let rid = t
            .record_id()
            .ok_or_else(|| SmallError::db_error("tuple has no record id"))?;
        if rid.page_id != self.pid {
            return Err(SmallError::db_error("tuple does not belong to this page"));
        }
        if !self.is_slot_used(rid.slot_index) {
            return Err(SmallError::db_error("slot is already empty"));
        }
        self.set_slot_used(rid.slot_index, false);
        Ok(())
    }

    /// A fresh, non-restartable iterator over occupied slots in ascending
    /// slot-index order.
    pub fn iter(&self) -> HeapPageIter<'_> {
        HeapPageIter {
            page: self,
            next_slot: 0,
        }
    }

    pub fn mark_dirty(&mut self, dirty: bool, tid: TransactionId) {
        self.dirty_by = if dirty { Some(tid) } else { None };
    }

    pub fn is_dirty(&self) -> Option<TransactionId> {
        self.dirty_by
    }

    pub fn get_before_image(&self) -> Vec<u8> {
        self.before_image.clone()
    }

    /// Snapshot the page's current bytes as its new before-image; called
    /// once a page becomes clean again (after a commit writes it through).
    pub fn set_before_image(&mut self) {
        self.before_image = self.get_page_data();
    }

    /// Serializes header bitmap followed by slot bytes back into a single
    /// `page_bytes`-long buffer.
    pub fn get_page_data(&self) -> Vec<u8> {
        let hdr_bytes = header_bytes(self.num_slots);
        let mut header_buf = self.header.to_bytes();
        header_buf.resize(hdr_bytes, 0);

        let mut out = Vec::with_capacity(hdr_bytes + self.slot_bytes.len());
        out.extend_from_slice(&header_buf);
        out.extend_from_slice(&self.slot_bytes);
        out
    }
}

pub struct HeapPageIter<'a> {
    page: &'a HeapPage,
    next_slot: usize,
}

impl<'a> Iterator for HeapPageIter<'a> {
    type Item = Tuple;

    fn next(&mut self) -> Option<Tuple> {
        while self.next_slot < self.page.num_slots {
            let slot = self.next_slot;
            self.next_slot += 1;
            if self.page.is_slot_used(slot) {
                return self.page.read_slot(slot).ok();
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::schema::simple_int_schema;

    fn test_page() -> HeapPage {
        let schema = Arc::new(simple_int_schema(2, "c"));
        HeapPage::empty(PageId::new(0, 0), schema, 4096)
    }

    #[test]
    fn insert_then_delete_restores_empty_slot_count() {
        let mut page = test_page();
        let before = page.get_num_empty_slots();

        let mut t = Tuple::new(
            Arc::new(simple_int_schema(2, "c")),
            vec![Field::Int(1), Field::Int(2)],
        )
        .unwrap();
        page.insert_tuple(&mut t).unwrap();
        assert_eq!(page.get_num_empty_slots(), before - 1);

        page.delete_tuple(&t).unwrap();
        assert_eq!(page.get_num_empty_slots(), before);
    }

    #[test]
    fn page_bytes_round_trip() {
        let mut page = test_page();
        let mut t = Tuple::new(
            Arc::new(simple_int_schema(2, "c")),
            vec![Field::Int(7), Field::Int(9)],
        )
        .unwrap();
        page.insert_tuple(&mut t).unwrap();

        let bytes = page.get_page_data();
        let reparsed = HeapPage::new(page.pid(), Arc::new(simple_int_schema(2, "c")), &bytes, 4096)
            .unwrap();
        assert_eq!(reparsed.get_page_data(), bytes);

        let tuples: Vec<Tuple> = reparsed.iter().collect();
        assert_eq!(tuples.len(), 1);
        assert_eq!(tuples[0], t);
    }

    #[test]
    fn iterator_skips_empty_slots_in_order() {
        let mut page = test_page();
        let mut first = Tuple::new(
            Arc::new(simple_int_schema(2, "c")),
            vec![Field::Int(1), Field::Int(1)],
        )
        .unwrap();
        let mut second = Tuple::new(
            Arc::new(simple_int_schema(2, "c")),
            vec![Field::Int(2), Field::Int(2)],
        )
        .unwrap();
        page.insert_tuple(&mut first).unwrap();
        page.insert_tuple(&mut second).unwrap();
        page.delete_tuple(&first).unwrap();

        let remaining: Vec<Tuple> = page.iter().collect();
        assert_eq!(remaining, vec![second]);
    }
}
