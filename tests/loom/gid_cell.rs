#![cfg(loom)]

use alkaid::types::Gid;
use alkaid::types::GidCell;
use loom::sync::Arc;
use loom::thread;

#[test]
fn lock_excludes_concurrent_holders() {
  loom::model(|| {
    let cell: Arc<GidCell> = Arc::new(GidCell::new(Gid::from_lsb(0)));

    let threads: Vec<_> = (0..2)
      .map(|_| {
        let cell: Arc<GidCell> = Arc::clone(&cell);

        thread::spawn(move || {
          let mut guard = cell.lock();
          let gid: Gid = guard.get();

          assert!(!gid.is_locked(), "observed the lock token through a guard");

          guard.set(gid + 1);
        })
      })
      .collect();

    for handle in threads {
      handle.join().unwrap();
    }

    assert_eq!(cell.get().lsb(), 2, "an update was lost under the lock");
    assert!(!cell.is_locked(), "lock token leaked past the guards");
  });
}

#[test]
fn concurrent_splits_conserve_credit() {
  loom::model(|| {
    let mut gid: Gid = Gid::from_lsb(1);

    gid.set_credit(4);

    let cell: Arc<GidCell> = Arc::new(GidCell::new(gid));

    let threads: Vec<_> = (0..2)
      .map(|_| {
        let cell: Arc<GidCell> = Arc::clone(&cell);

        thread::spawn(move || {
          let copy: Gid = cell.split_credits().unwrap();

          assert!(copy.was_split());

          copy.credit()
        })
      })
      .collect();

    let mut total: u64 = 0;

    for handle in threads {
      total += handle.join().unwrap();
    }

    total += cell.get().credit();

    assert_eq!(total, 4, "credit was created or destroyed by a split");
    assert!(!cell.is_locked());
  });
}

#[test]
fn try_lock_contention_is_clean() {
  loom::model(|| {
    let cell: Arc<GidCell> = Arc::new(GidCell::new(Gid::from_lsb(9)));

    let holder = {
      let cell: Arc<GidCell> = Arc::clone(&cell);

      thread::spawn(move || {
        let _guard = cell.lock();
      })
    };

    // Whatever the interleaving, try_lock either fails cleanly or takes
    // the token; a snapshot read stays coherent throughout.
    if let Some(guard) = cell.try_lock() {
      assert_eq!(guard.get(), Gid::from_lsb(9));
    }

    assert_eq!(cell.get(), Gid::from_lsb(9));

    holder.join().unwrap();

    assert!(!cell.is_locked());
  });
}
