mod pool;

pub(crate) use self::pool::SlotPool;
