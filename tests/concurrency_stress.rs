use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::Rng;

use minirel::database::Database;
use minirel::field::Field;
use minirel::heap_file::HeapFile;
use minirel::operator::OpIterator;
use minirel::operators::SequentialScan;
use minirel::schema::simple_int_schema;
use minirel::transaction::TransactionId;
use minirel::tuple::Tuple;

/// Many short transactions inserting concurrently into the same table from
/// different threads, each pausing a random handful of milliseconds to
/// widen the window for lock contention. Every row any of them inserts
/// should show up exactly once once they've all committed.
#[test]
fn concurrent_inserts_all_land_exactly_once() {
    let schema = Arc::new(simple_int_schema(1, "v"));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stress.heap");
    let file = HeapFile::new(&path, Arc::clone(&schema)).unwrap();
    let table_id = Database::global().mut_catalog().add_table("stress", file);

    const WRITERS: i32 = 8;
    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let schema = Arc::clone(&schema);
            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                thread::sleep(Duration::from_millis(rng.gen_range(0, 10)));
                let tid = TransactionId::new();
                let mut t = Tuple::new(schema, vec![Field::Int(i)]).unwrap();
                Database::global()
                    .buffer_pool()
                    .insert_tuple(tid, table_id, &mut t)
                    .unwrap();
                Database::global()
                    .buffer_pool()
                    .transaction_complete(tid, true)
                    .unwrap();
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let reader = TransactionId::new();
    let mut scan = SequentialScan::new(reader, table_id, "s").unwrap();
    scan.open().unwrap();
    let mut seen = Vec::new();
    while let Some(t) = scan.next().unwrap() {
        seen.push(match t.get_field(0).unwrap() {
            Field::Int(v) => *v,
            _ => unreachable!(),
        });
    }
    scan.close();
    Database::global().buffer_pool().transaction_complete(reader, true).unwrap();

    seen.sort();
    assert_eq!(seen, (0..WRITERS).collect::<Vec<_>>());
}
