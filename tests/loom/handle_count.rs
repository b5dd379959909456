#![cfg(loom)]

use alkaid::types::Gid;
use alkaid::types::Handle;
use alkaid::types::Management;
use loom::thread;

#[test]
fn concurrent_clone_and_drop() {
  loom::model(|| {
    let handle: Handle = Handle::new(Gid::from_lsb(5), Management::Unmanaged);
    let copy: Handle = handle.clone();

    let worker = thread::spawn(move || {
      assert_eq!(copy.gid(), Gid::from_lsb(5));
      drop(copy);
    });

    assert_eq!(handle.gid(), Gid::from_lsb(5));

    drop(handle);

    worker.join().unwrap();
  });
}

#[test]
fn last_drop_wins_exactly_once() {
  loom::model(|| {
    let handle: Handle = Handle::new(Gid::from_lsb(6), Management::Unmanaged);

    let threads: Vec<_> = (0..2)
      .map(|_| {
        let copy: Handle = handle.clone();

        thread::spawn(move || {
          drop(copy);
        })
      })
      .collect();

    drop(handle);

    for worker in threads {
      worker.join().unwrap();
    }
  });
}
