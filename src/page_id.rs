/// (table-id, page-number) naming a page. Hashable, structurally equal.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub struct PageId {
    pub table_id: i32,
    pub page_index: usize,
}

impl PageId {
    pub fn new(table_id: i32, page_index: usize) -> PageId {
        PageId {
            table_id,
            page_index,
        }
    }
}

/// (PageId, slot-index) naming a tuple's physical location.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot_index: usize,
}

impl RecordId {
    pub fn new(page_id: PageId, slot_index: usize) -> RecordId {
        RecordId {
            page_id,
            slot_index,
        }
    }
}
